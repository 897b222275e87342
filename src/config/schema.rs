//! Configuration file schema (`config.yaml`)
//!
//! These structs mirror the file as written by users. Every optional field
//! is an `Option` so resolution can tell "not set" apart from "set to a
//! falsy value".

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::document::scalar;

/// CCS branding for password sheets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CcsConfig {
    /// CCS display name, e.g. "DOMjudge"
    pub name: Option<String>,

    /// URL printed on the sheets
    pub link: Option<String>,
}

/// Account-type capability set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountTypesConfig {
    /// Provision OS accounts (`linux-accounts.yaml`)
    #[serde(default)]
    pub linux: bool,

    /// CCS descriptor used when rendering sheets
    #[serde(default)]
    pub ccs: CcsConfig,
}

/// `global:` section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalSettings {
    pub contests_folder: Option<PathBuf>,
    pub footer: Option<String>,
    pub account_types: Option<AccountTypesConfig>,
    pub generate_accounts_tsv: Option<bool>,
    #[serde(default, deserialize_with = "scalar::option")]
    pub ip_prefix: Option<String>,
    pub page_size: Option<String>,
    pub number_of_words_per_password: Option<usize>,
    pub additional_account_files: Option<Vec<PathBuf>>,

    /// Word file for passphrases (one word per line); built-in list if unset
    pub word_file: Option<PathBuf>,
}

/// Per-contest override block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContestOverrides {
    pub footer: Option<String>,
    pub generate_accounts_tsv: Option<bool>,
    #[serde(default, deserialize_with = "scalar::option")]
    pub ip_prefix: Option<String>,
    pub page_size: Option<String>,
    pub number_of_words_per_password: Option<usize>,
    pub additional_account_files: Option<Vec<PathBuf>>,
    pub account_types: Option<AccountTypesConfig>,
}

/// `cds:` section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CdsConfig {
    /// Server/account descriptor file (default: cds-config.yaml)
    pub config: Option<PathBuf>,

    /// Directory receiving per-server `accounts.yaml`
    pub servers_folder: Option<PathBuf>,

    pub banner: Option<PathBuf>,
    pub footer: Option<String>,
    pub page_size: Option<String>,
    pub number_of_words_per_password: Option<usize>,
}

/// Roster descriptor for the challenge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeAccountFile {
    pub teams_file: PathBuf,
    pub organizations_file: Option<PathBuf>,

    /// Prefix for generated usernames (default: "team")
    pub username_prefix: Option<String>,
}

/// `challenge:` section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChallengeConfig {
    pub title: Option<String>,
    pub banner: Option<PathBuf>,
    pub account_types: Option<AccountTypesConfig>,
    pub footer: Option<String>,
    #[serde(default, deserialize_with = "scalar::option")]
    pub ip_prefix: Option<String>,
    pub page_size: Option<String>,
    pub number_of_words_per_password: Option<usize>,
    #[serde(default)]
    pub account_files: Vec<ChallengeAccountFile>,
}

/// The whole file, before validation and discovery
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawConfig {
    /// Older files call this section `global_settings`
    #[serde(alias = "global_settings")]
    pub global: Option<GlobalSettings>,

    pub cds: Option<CdsConfig>,
    pub challenge: Option<ChallengeConfig>,

    /// Override blocks keyed by directory name, or a list of blocks with
    /// a `name` each. Kept raw so each block is parsed on its own.
    pub contests: Option<serde_yaml::Value>,
}
