//! Configuration model
//!
//! Loads `config.yaml`, checks the global section, discovers the contests
//! on disk and attaches per-contest overrides to them:
//! 1. Built-in defaults
//! 2. `global:` section
//! 3. Scope section (`contests.<name>`, `cds`, `challenge`)
//!
//! Relative paths in the file are resolved against the directory holding
//! the config file.

mod defaults;
mod resolve;
mod schema;

pub use defaults::BuiltinDefaults;
pub use resolve::{resolve, Resolved, ScopeResolver, SettingsLayer, ValueSource};
pub use schema::{
    AccountTypesConfig, CcsConfig, CdsConfig, ChallengeAccountFile, ChallengeConfig,
    ContestOverrides, GlobalSettings, RawConfig,
};

use contest_passphrase::{Generator, PassphraseError};
use indexmap::IndexMap;
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::discovery::{self, DiscoveredContest};
use crate::document::{self, DocumentError};

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error("Global config settings missing")]
    GlobalMissing,

    #[error("Contest folder config missing")]
    ContestsFolderMissing,

    #[error("Contest folder {0} does not exist")]
    ContestsFolderNotFound(PathBuf),

    #[error("Contest {0} not found on disk, but has config")]
    UnknownContest(String),

    #[error("Contest {0} is configured more than once")]
    DuplicateContest(String),

    #[error("Invalid configuration for contest {name}: {message}")]
    InvalidContest { name: String, message: String },

    #[error("Invalid contests section: {0}")]
    InvalidContests(String),

    #[error("{path} is missing key `{key}`")]
    MissingKey { path: PathBuf, key: String },

    #[error("Failed to scan {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// A discovered contest with its overrides attached
#[derive(Debug, Clone)]
pub struct ContestScope {
    pub contest: DiscoveredContest,
    pub overrides: ContestOverrides,
}

/// Fully loaded configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory relative paths are resolved against
    pub base_dir: PathBuf,

    pub global: GlobalSettings,

    /// Resolved contests folder (exists on disk)
    pub contests_folder: PathBuf,

    pub cds: Option<CdsConfig>,
    pub challenge: Option<ChallengeConfig>,

    /// Discovered contests keyed by directory name, in discovery order
    pub contests: IndexMap<String, ContestScope>,

    pub defaults: BuiltinDefaults,
}

impl Config {
    /// Load and build the configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw: RawConfig = document::read_yaml(path)?;
        let base_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self::from_raw(raw, &base_dir)
    }

    /// Build the configuration from already-parsed structures
    pub fn from_raw(raw: RawConfig, base_dir: &Path) -> Result<Self, ConfigError> {
        let global = raw.global.ok_or(ConfigError::GlobalMissing)?;

        let contests_folder = global
            .contests_folder
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
            .map(|p| base_dir.join(p))
            .ok_or(ConfigError::ContestsFolderMissing)?;
        if !contests_folder.is_dir() {
            return Err(ConfigError::ContestsFolderNotFound(contests_folder));
        }

        let mut overrides = match raw.contests {
            Some(section) => normalize_contests(section)?,
            None => BTreeMap::new(),
        };

        let mut contests = IndexMap::new();
        for contest in discovery::discover_contests(&contests_folder)? {
            let block = overrides.remove(&contest.dir_name).unwrap_or_default();
            contests.insert(
                contest.dir_name.clone(),
                ContestScope {
                    contest,
                    overrides: block,
                },
            );
        }

        // Whatever is left was configured but never discovered
        if let Some(name) = overrides.into_keys().next() {
            return Err(ConfigError::UnknownContest(name));
        }

        Ok(Self {
            base_dir: base_dir.to_path_buf(),
            global,
            contests_folder,
            cds: raw.cds,
            challenge: raw.challenge,
            contests,
            defaults: BuiltinDefaults::default(),
        })
    }

    /// Resolve a path from the config file against the base directory
    pub fn path(&self, path: &Path) -> PathBuf {
        self.base_dir.join(path)
    }

    /// Passphrase generator over `global.word_file`, or the built-in list
    pub fn password_generator(&self) -> Result<Generator, PassphraseError> {
        let generator = match &self.global.word_file {
            Some(path) => Generator::from_word_file(&self.path(path))?,
            None => Generator::builtin()?,
        };
        tracing::debug!(words = generator.len(), "password word list loaded");
        Ok(generator)
    }

    pub fn contest(&self, name: &str) -> Option<&ContestScope> {
        self.contests.get(name)
    }

    /// Resolver for a contest's shared settings
    pub fn contest_resolver<'a>(&'a self, scope: &'a ContestScope) -> ScopeResolver<'a> {
        ScopeResolver::new(&scope.overrides, &self.global, &self.defaults)
    }
}

/// Translate either shape of `contests:` into one map keyed by directory name
fn normalize_contests(section: Value) -> Result<BTreeMap<String, ContestOverrides>, ConfigError> {
    let mut map = BTreeMap::new();
    match section {
        Value::Null => {}
        Value::Mapping(blocks) => {
            for (key, block) in blocks {
                let name = contest_name(&key).ok_or_else(|| {
                    ConfigError::InvalidContests(format!("key {:?} is not a contest name", key))
                })?;
                let overrides = parse_overrides(&name, block)?;
                map.insert(name, overrides);
            }
        }
        Value::Sequence(blocks) => {
            for (index, block) in blocks.into_iter().enumerate() {
                let name = block.get("name").and_then(contest_name).ok_or_else(|| {
                    ConfigError::InvalidContests(format!("entry {} has no name", index + 1))
                })?;
                let overrides = parse_overrides(&name, block)?;
                if map.insert(name.clone(), overrides).is_some() {
                    return Err(ConfigError::DuplicateContest(name));
                }
            }
        }
        _ => {
            return Err(ConfigError::InvalidContests(
                "expected a mapping or a list".to_string(),
            ))
        }
    }
    Ok(map)
}

fn contest_name(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Parse one override block; an empty block means no overrides.
///
/// The block goes back through text so the error names the offending field.
fn parse_overrides(name: &str, block: Value) -> Result<ContestOverrides, ConfigError> {
    if block.is_null() {
        return Ok(ContestOverrides::default());
    }
    let invalid = |e: serde_yaml::Error| ConfigError::InvalidContest {
        name: name.to_string(),
        message: e.to_string(),
    };
    let text = serde_yaml::to_string(&block).map_err(invalid)?;
    serde_yaml::from_str(&text).map_err(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn setup() -> TempDir {
        let dir = TempDir::new().unwrap();
        let contests = dir.path().join("contests");
        fs::create_dir_all(contests.join("finals")).unwrap();
        fs::write(
            contests.join("finals/contest.yaml"),
            "name: Finals\nstart_time: '2024-01-01T10:00:00'\n",
        )
        .unwrap();
        fs::create_dir_all(contests.join("empty")).unwrap();
        dir
    }

    fn raw(yaml: &str) -> RawConfig {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_from_raw_discovers_contests() {
        let dir = setup();
        let config = Config::from_raw(
            raw("global:\n  contests_folder: contests\ncontests:\n  finals:\n    page_size: Letter\n"),
            dir.path(),
        )
        .unwrap();

        assert_eq!(config.contests.len(), 1);
        let finals = config.contest("finals").unwrap();
        assert_eq!(finals.contest.name, "Finals");
        assert_eq!(finals.overrides.page_size.as_deref(), Some("Letter"));
        assert!(config.contest("empty").is_none());
    }

    #[test]
    fn test_global_missing() {
        let err = Config::from_raw(raw("cds: {}\n"), Path::new(".")).unwrap_err();
        assert_eq!(err.to_string(), "Global config settings missing");
    }

    #[test]
    fn test_contests_folder_missing() {
        let err = Config::from_raw(raw("global:\n  footer: x\n"), Path::new(".")).unwrap_err();
        assert!(matches!(err, ConfigError::ContestsFolderMissing));
    }

    #[test]
    fn test_contests_folder_not_on_disk() {
        let dir = TempDir::new().unwrap();
        let err = Config::from_raw(raw("global:\n  contests_folder: nowhere\n"), dir.path())
            .unwrap_err();
        assert!(matches!(err, ConfigError::ContestsFolderNotFound(_)));
        assert!(err.to_string().contains("nowhere"));
    }

    #[test]
    fn test_override_for_unknown_contest() {
        let dir = setup();
        let err = Config::from_raw(
            raw("global:\n  contests_folder: contests\ncontests:\n  ghost:\n    footer: x\n"),
            dir.path(),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Contest ghost not found on disk, but has config");
    }

    #[test]
    fn test_override_for_directory_without_descriptor() {
        let dir = setup();
        let err = Config::from_raw(
            raw("global:\n  contests_folder: contests\ncontests:\n  empty: {}\n"),
            dir.path(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownContest(name) if name == "empty"));
    }

    #[test]
    fn test_list_form_contests() {
        let dir = setup();
        let config = Config::from_raw(
            raw("global:\n  contests_folder: contests\ncontests:\n  - name: finals\n    ip_prefix: '10.3'\n"),
            dir.path(),
        )
        .unwrap();
        let finals = config.contest("finals").unwrap();
        assert_eq!(finals.overrides.ip_prefix.as_deref(), Some("10.3"));
    }

    #[test]
    fn test_list_form_duplicate() {
        let dir = setup();
        let err = Config::from_raw(
            raw("global:\n  contests_folder: contests\ncontests:\n  - name: finals\n  - name: finals\n"),
            dir.path(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateContest(_)));
    }

    #[test]
    fn test_empty_override_block() {
        let dir = setup();
        let config = Config::from_raw(
            raw("global:\n  contests_folder: contests\ncontests:\n  finals:\n"),
            dir.path(),
        )
        .unwrap();
        assert_eq!(
            config.contest("finals").unwrap().overrides,
            ContestOverrides::default()
        );
    }

    #[test]
    fn test_invalid_override_names_contest_and_field() {
        let dir = setup();
        let err = Config::from_raw(
            raw("global:\n  contests_folder: contests\ncontests:\n  finals:\n    number_of_words_per_password: four\n"),
            dir.path(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidContest { ref name, .. } if name == "finals"));
        let message = err.to_string();
        assert!(message.starts_with("Invalid configuration for contest finals: "));
        assert!(message.contains("number_of_words_per_password"));
    }

    #[test]
    fn test_invalid_list_entry_names_contest() {
        let dir = setup();
        let err = Config::from_raw(
            raw("global:\n  contests_folder: contests\ncontests:\n  - name: finals\n    generate_accounts_tsv: sometimes\n"),
            dir.path(),
        )
        .unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("Invalid configuration for contest finals: "));
        assert!(message.contains("generate_accounts_tsv"));
    }

    #[test]
    fn test_list_entry_without_name() {
        let dir = setup();
        let err = Config::from_raw(
            raw("global:\n  contests_folder: contests\ncontests:\n  - page_size: Letter\n"),
            dir.path(),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Invalid contests section: entry 1 has no name");
    }

    #[test]
    fn test_scalar_contests_section() {
        let dir = setup();
        let err = Config::from_raw(
            raw("global:\n  contests_folder: contests\ncontests: finals\n"),
            dir.path(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidContests(_)));
    }

    #[test]
    fn test_load_from_file_resolves_relative_paths() {
        let dir = setup();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "global:\n  contests_folder: contests\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.base_dir, dir.path());
        assert_eq!(config.contests_folder, dir.path().join("contests"));
        assert_eq!(config.path(Path::new("cds.yaml")), dir.path().join("cds.yaml"));
    }

    #[test]
    fn test_word_file_relative_to_config() {
        let dir = setup();
        fs::write(dir.path().join("words.txt"), "river\nstone\nx\n").unwrap();
        let config = Config::from_raw(
            raw("global:\n  contests_folder: contests\n  word_file: words.txt\n"),
            dir.path(),
        )
        .unwrap();

        let generator = config.password_generator().unwrap();
        assert_eq!(generator.len(), 2);
    }

    #[test]
    fn test_missing_word_file() {
        let dir = setup();
        let config = Config::from_raw(
            raw("global:\n  contests_folder: contests\n  word_file: lists/words.txt\n"),
            dir.path(),
        )
        .unwrap();

        let err = config.password_generator().unwrap_err();
        match err {
            PassphraseError::Io { path, .. } => assert_eq!(path, dir.path().join("lists/words.txt")),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_builtin_word_list_by_default() {
        let dir = setup();
        let config =
            Config::from_raw(raw("global:\n  contests_folder: contests\n"), dir.path()).unwrap();
        assert!(config.password_generator().unwrap().len() >= 2000);
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load(Path::new("/nonexistent/config.yaml")).unwrap_err();
        assert_eq!(err.to_string(), "File /nonexistent/config.yaml not found");
    }
}
