//! Per-field fallback resolution
//!
//! Every shared setting is resolved on its own through the chain
//! scope → global → default. Two fields of the same scope may come from
//! different levels.

use std::fmt;
use std::path::PathBuf;

use super::defaults::BuiltinDefaults;
use super::schema::{
    AccountTypesConfig, CdsConfig, ChallengeConfig, ContestOverrides, GlobalSettings,
};

/// Where a resolved value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSource {
    /// Explicit value on the scope
    Scope,
    /// Inherited from `global:`
    Global,
    /// Caller-supplied default
    Default,
    /// Nothing set anywhere
    Missing,
}

impl fmt::Display for ValueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueSource::Scope => write!(f, "scope"),
            ValueSource::Global => write!(f, "global"),
            ValueSource::Default => write!(f, "default"),
            ValueSource::Missing => write!(f, "missing"),
        }
    }
}

/// A resolved value with its source
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<T> {
    pub value: Option<T>,
    pub source: ValueSource,
}

impl<T> Resolved<T> {
    pub fn is_missing(&self) -> bool {
        self.value.is_none()
    }
}

/// Resolve one field: scope wins if set, then global, then `default`.
///
/// Only `None` falls through; `Some(false)` or `Some("")` on the scope wins.
pub fn resolve<T>(field: &str, scope: Option<T>, global: Option<T>, default: Option<T>) -> Resolved<T> {
    let resolved = match (scope, global, default) {
        (Some(v), _, _) => Resolved { value: Some(v), source: ValueSource::Scope },
        (None, Some(v), _) => Resolved { value: Some(v), source: ValueSource::Global },
        (None, None, Some(v)) => Resolved { value: Some(v), source: ValueSource::Default },
        (None, None, None) => Resolved { value: None, source: ValueSource::Missing },
    };
    tracing::trace!(field, source = %resolved.source, "resolved setting");
    resolved
}

const NO_FILES: &[PathBuf] = &[];

/// Settings shared between global and scope-level blocks.
///
/// Blocks return `None` for fields they do not carry.
pub trait SettingsLayer {
    fn footer(&self) -> Option<&str> {
        None
    }
    fn page_size(&self) -> Option<&str> {
        None
    }
    fn number_of_words_per_password(&self) -> Option<usize> {
        None
    }
    fn ip_prefix(&self) -> Option<&str> {
        None
    }
    fn account_types(&self) -> Option<&AccountTypesConfig> {
        None
    }
    fn generate_accounts_tsv(&self) -> Option<bool> {
        None
    }
    fn additional_account_files(&self) -> Option<&[PathBuf]> {
        None
    }
}

impl SettingsLayer for GlobalSettings {
    fn footer(&self) -> Option<&str> {
        self.footer.as_deref()
    }
    fn page_size(&self) -> Option<&str> {
        self.page_size.as_deref()
    }
    fn number_of_words_per_password(&self) -> Option<usize> {
        self.number_of_words_per_password
    }
    fn ip_prefix(&self) -> Option<&str> {
        self.ip_prefix.as_deref()
    }
    fn account_types(&self) -> Option<&AccountTypesConfig> {
        self.account_types.as_ref()
    }
    fn generate_accounts_tsv(&self) -> Option<bool> {
        self.generate_accounts_tsv
    }
    fn additional_account_files(&self) -> Option<&[PathBuf]> {
        self.additional_account_files.as_deref()
    }
}

impl SettingsLayer for ContestOverrides {
    fn footer(&self) -> Option<&str> {
        self.footer.as_deref()
    }
    fn page_size(&self) -> Option<&str> {
        self.page_size.as_deref()
    }
    fn number_of_words_per_password(&self) -> Option<usize> {
        self.number_of_words_per_password
    }
    fn ip_prefix(&self) -> Option<&str> {
        self.ip_prefix.as_deref()
    }
    fn account_types(&self) -> Option<&AccountTypesConfig> {
        self.account_types.as_ref()
    }
    fn generate_accounts_tsv(&self) -> Option<bool> {
        self.generate_accounts_tsv
    }
    fn additional_account_files(&self) -> Option<&[PathBuf]> {
        self.additional_account_files.as_deref()
    }
}

impl SettingsLayer for CdsConfig {
    fn footer(&self) -> Option<&str> {
        self.footer.as_deref()
    }
    fn page_size(&self) -> Option<&str> {
        self.page_size.as_deref()
    }
    fn number_of_words_per_password(&self) -> Option<usize> {
        self.number_of_words_per_password
    }
}

impl SettingsLayer for ChallengeConfig {
    fn footer(&self) -> Option<&str> {
        self.footer.as_deref()
    }
    fn page_size(&self) -> Option<&str> {
        self.page_size.as_deref()
    }
    fn number_of_words_per_password(&self) -> Option<usize> {
        self.number_of_words_per_password
    }
    fn ip_prefix(&self) -> Option<&str> {
        self.ip_prefix.as_deref()
    }
    fn account_types(&self) -> Option<&AccountTypesConfig> {
        self.account_types.as_ref()
    }
}

/// Resolves shared settings of one scope against the global block and
/// the built-in defaults
pub struct ScopeResolver<'a> {
    scope: &'a dyn SettingsLayer,
    global: &'a GlobalSettings,
    defaults: &'a BuiltinDefaults,
}

impl<'a> ScopeResolver<'a> {
    pub fn new(
        scope: &'a dyn SettingsLayer,
        global: &'a GlobalSettings,
        defaults: &'a BuiltinDefaults,
    ) -> Self {
        Self {
            scope,
            global,
            defaults,
        }
    }

    pub fn footer(&self) -> Resolved<&'a str> {
        resolve("footer", self.scope.footer(), self.global.footer(), None)
    }

    pub fn page_size(&self) -> Resolved<&'a str> {
        resolve(
            "page_size",
            self.scope.page_size(),
            self.global.page_size(),
            Some(self.defaults.page_size.as_str()),
        )
    }

    pub fn number_of_words_per_password(&self) -> Resolved<usize> {
        resolve(
            "number_of_words_per_password",
            self.scope.number_of_words_per_password(),
            self.global.number_of_words_per_password(),
            Some(self.defaults.number_of_words_per_password),
        )
    }

    pub fn ip_prefix(&self) -> Resolved<&'a str> {
        resolve("ip_prefix", self.scope.ip_prefix(), self.global.ip_prefix(), None)
    }

    pub fn account_types(&self) -> Resolved<&'a AccountTypesConfig> {
        resolve(
            "account_types",
            self.scope.account_types(),
            self.global.account_types(),
            None,
        )
    }

    pub fn generate_accounts_tsv(&self) -> Resolved<bool> {
        resolve(
            "generate_accounts_tsv",
            self.scope.generate_accounts_tsv(),
            self.global.generate_accounts_tsv(),
            Some(self.defaults.generate_accounts_tsv),
        )
    }

    pub fn additional_account_files(&self) -> Resolved<&'a [PathBuf]> {
        resolve(
            "additional_account_files",
            self.scope.additional_account_files(),
            self.global.additional_account_files(),
            Some(NO_FILES),
        )
    }
}
