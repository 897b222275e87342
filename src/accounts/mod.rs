//! Account records and the merge engine
//!
//! Accounts are collected from several sources into an
//! [`AccountRepository`], keyed by username. The first source to mention a
//! username creates the account (generating a password if none was given);
//! later sources may only add an IP address or a team id.

mod cds;
mod repository;
mod sources;

pub use cds::{CdsAccount, CdsDescriptor, CdsServer, ServerAccounts};
pub use repository::{AccountRepository, Merge, MergeStats};
pub use sources::{
    load_organizations, load_roster, merge_sources, AccountListEntry, AccountSource,
    Organization, RosterEntry, RosterSource,
};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::document::DocumentError;

/// Errors raised while loading or merging accounts
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error("Team {team_id} does not have an organization set")]
    MissingOrganization { team_id: String },

    #[error("Team {team_id} has unknown organization {organization_id}")]
    UnknownOrganization {
        team_id: String,
        organization_id: String,
    },

    #[error("Team {team_id} in {path} has neither `name` nor `display_name`")]
    MissingTeamName { team_id: String, path: PathBuf },

    #[error("CDS account {username} references unknown server {server}")]
    UnknownServer { username: String, server: String },

    #[error("CDS server {0} is declared more than once")]
    DuplicateServer(String),
}

impl AccountError {
    /// Whether this is a data-integrity failure rather than an unreadable file
    pub fn is_integrity(&self) -> bool {
        !matches!(self, AccountError::Document(_))
    }
}

/// Account type, an open set of tags
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AccountKind {
    Team,
    Staff,
    Other(String),
}

impl AccountKind {
    pub fn as_str(&self) -> &str {
        match self {
            AccountKind::Team => "team",
            AccountKind::Staff => "staff",
            AccountKind::Other(s) => s,
        }
    }
}

impl From<String> for AccountKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "team" => AccountKind::Team,
            "staff" => AccountKind::Staff,
            _ => AccountKind::Other(s),
        }
    }
}

impl From<&str> for AccountKind {
    fn from(s: &str) -> Self {
        AccountKind::from(s.to_string())
    }
}

impl From<AccountKind> for String {
    fn from(kind: AccountKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A generated account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub name: String,
    pub password: String,
    #[serde(rename = "type")]
    pub kind: AccountKind,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
}

/// Everything needed to create an account the first time it is seen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountDraft {
    pub username: String,
    pub id: String,
    pub name: String,
    pub kind: AccountKind,
    /// Pinned password; generated when `None`
    pub password: Option<String>,
    pub team_id: Option<String>,
    pub ip: Option<String>,
}

/// Facts a later source may add to an account that already exists
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountPatch {
    pub ip: Option<String>,
    pub team_id: Option<String>,
}

impl AccountPatch {
    pub fn is_empty(&self) -> bool {
        self.ip.is_none() && self.team_id.is_none()
    }
}

/// Per-scope settings that drive account creation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationSettings<'a> {
    pub number_of_words_per_password: usize,
    pub ip_prefix: Option<&'a str>,
}

impl GenerationSettings<'_> {
    /// `<prefix>.<id>` when an IP prefix is configured
    pub fn ip_for(&self, id: &str) -> Option<String> {
        self.ip_prefix.map(|prefix| format!("{}.{}", prefix, id))
    }
}

/// Source of generated passwords
pub trait PasswordSource {
    /// Produce a passphrase of `num_words` words
    fn passphrase(&mut self, num_words: usize) -> String;
}

impl PasswordSource for contest_passphrase::Generator {
    fn passphrase(&mut self, num_words: usize) -> String {
        self.generate(num_words)
    }
}
