//! Account source files
//!
//! - account list: `[{id?, name?, username, type, password?}]` (YAML)
//! - team roster: `[{id, name, display_name?, organization_id?}]` (JSON or YAML)
//! - organizations: `[{id, formal_name}]` (JSON or YAML)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::{AccountError, AccountRepository, GenerationSettings, PasswordSource};
use crate::document::{self, scalar};

/// Entry of an explicit account list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountListEntry {
    #[serde(default, deserialize_with = "scalar::option")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "scalar::option")]
    pub name: Option<String>,
    #[serde(deserialize_with = "scalar::string")]
    pub username: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, deserialize_with = "scalar::option")]
    pub password: Option<String>,
}

/// Entry of a team roster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    #[serde(deserialize_with = "scalar::string")]
    pub id: String,
    #[serde(default, deserialize_with = "scalar::option")]
    pub name: Option<String>,
    pub display_name: Option<String>,
    #[serde(default, deserialize_with = "scalar::option")]
    pub organization_id: Option<String>,
}

/// Organization referenced by roster entries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    #[serde(deserialize_with = "scalar::string")]
    pub id: String,
    pub formal_name: String,
}

/// A roster together with its organization lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterSource {
    pub teams_file: PathBuf,
    pub organizations_file: Option<PathBuf>,
    pub username_prefix: String,
}

/// One source in the ordered fold that builds a repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountSource {
    /// Explicit account list, skipped when absent
    List(PathBuf),
    /// Team roster, required when listed
    Roster(RosterSource),
}

pub(crate) fn load_account_list(path: &Path) -> Result<Vec<AccountListEntry>, AccountError> {
    Ok(document::read_yaml::<Option<Vec<AccountListEntry>>>(path)?.unwrap_or_default())
}

/// Load a team roster
pub fn load_roster(path: &Path) -> Result<Vec<RosterEntry>, AccountError> {
    Ok(document::read_document::<Option<Vec<RosterEntry>>>(path)?.unwrap_or_default())
}

/// Load organizations keyed by id
pub fn load_organizations(path: &Path) -> Result<HashMap<String, Organization>, AccountError> {
    let orgs: Option<Vec<Organization>> = document::read_document(path)?;
    Ok(orgs
        .unwrap_or_default()
        .into_iter()
        .map(|org| (org.id.clone(), org))
        .collect())
}

/// Fold `sources`, in order, into a fresh repository
pub fn merge_sources<P: PasswordSource + ?Sized>(
    sources: &[AccountSource],
    settings: &GenerationSettings<'_>,
    passwords: &mut P,
) -> Result<AccountRepository, AccountError> {
    sources
        .iter()
        .try_fold(AccountRepository::new(), |mut repo, source| {
            let stats = match source {
                AccountSource::List(path) => {
                    repo.load_accounts_from_list(path, settings, passwords)?
                }
                AccountSource::Roster(roster) => {
                    repo.add_team_accounts(roster, settings, passwords)?
                }
            };
            tracing::debug!(
                ?source,
                created = stats.created,
                enriched = stats.enriched,
                total = repo.len(),
                "merged account source"
            );
            Ok(repo)
        })
}
