//! Built-in defaults
//!
//! Values used when neither a scope nor `global:` sets a field that has a
//! default. Account types have none and must be configured.

use std::path::PathBuf;

/// Built-in default configuration values
#[derive(Debug, Clone)]
pub struct BuiltinDefaults {
    /// CDS server/account descriptor (default: "cds-config.yaml")
    pub cds_config: PathBuf,

    /// Username prefix for roster-derived accounts (default: "team")
    pub username_prefix: String,

    /// Emit `<scope>.accounts.tsv` (default: false)
    pub generate_accounts_tsv: bool,

    /// Password sheet page size (default: "A4")
    pub page_size: String,

    /// Words per generated password (default: 4)
    pub number_of_words_per_password: usize,
}

impl Default for BuiltinDefaults {
    fn default() -> Self {
        Self {
            cds_config: PathBuf::from("cds-config.yaml"),
            username_prefix: "team".to_string(),
            generate_accounts_tsv: false,
            page_size: "A4".to_string(),
            number_of_words_per_password: 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let defaults = BuiltinDefaults::default();
        assert_eq!(defaults.cds_config, PathBuf::from("cds-config.yaml"));
        assert_eq!(defaults.username_prefix, "team");
        assert!(!defaults.generate_accounts_tsv);
        assert_eq!(defaults.page_size, "A4");
        assert_eq!(defaults.number_of_words_per_password, 4);
    }
}
