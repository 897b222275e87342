//! Username-keyed account repository
//!
//! The single merge primitive is [`AccountRepository::upsert`]: a draft
//! creates a new account, a patch enriches an existing one. Passwords,
//! types, names and ids are fixed at creation.

use indexmap::IndexMap;
use std::path::Path;

use super::sources::{self, AccountListEntry, Organization, RosterEntry, RosterSource};
use super::{
    Account, AccountDraft, AccountError, AccountKind, AccountPatch, GenerationSettings,
    PasswordSource,
};

/// Outcome of a single merge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Merge {
    /// New account, created from the draft
    Created,
    /// Existing account received new facts
    Enriched,
    /// Existing account, nothing to add
    Unchanged,
}

/// Merge outcomes of one account source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub created: usize,
    pub enriched: usize,
    pub unchanged: usize,
}

impl MergeStats {
    fn record(&mut self, merge: Merge) {
        match merge {
            Merge::Created => self.created += 1,
            Merge::Enriched => self.enriched += 1,
            Merge::Unchanged => self.unchanged += 1,
        }
    }
}

/// Accounts keyed by username, in first-seen order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountRepository {
    accounts: IndexMap<String, Account>,
}

impl AccountRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one account into the repository.
    ///
    /// A new username is created from `draft`, generating a password with
    /// `passwords` only when the draft carries none. An existing username
    /// only receives the fields set in `patch`.
    pub fn upsert<P: PasswordSource + ?Sized>(
        &mut self,
        draft: AccountDraft,
        patch: AccountPatch,
        num_words: usize,
        passwords: &mut P,
    ) -> Merge {
        if let Some(existing) = self.accounts.get_mut(&draft.username) {
            if patch.is_empty() {
                return Merge::Unchanged;
            }
            if let Some(ip) = patch.ip {
                existing.ip = Some(ip);
            }
            if let Some(team_id) = patch.team_id {
                existing.team_id = Some(team_id);
            }
            tracing::debug!(username = %existing.username, "enriched existing account");
            return Merge::Enriched;
        }

        let password = match draft.password {
            Some(p) if !p.is_empty() => p,
            _ => passwords.passphrase(num_words),
        };
        let account = Account {
            id: draft.id,
            name: draft.name,
            password,
            kind: draft.kind,
            username: draft.username,
            team_id: draft.team_id,
            ip: draft.ip,
            organization: None,
        };
        tracing::debug!(username = %account.username, kind = %account.kind, "created account");
        self.accounts.insert(account.username.clone(), account);
        Merge::Created
    }

    /// Merge an explicit account list into the repository.
    ///
    /// A missing file contributes nothing.
    pub fn load_accounts_from_list<P: PasswordSource + ?Sized>(
        &mut self,
        path: &Path,
        settings: &GenerationSettings<'_>,
        passwords: &mut P,
    ) -> Result<MergeStats, AccountError> {
        let mut stats = MergeStats::default();
        if !path.is_file() {
            tracing::debug!(path = %path.display(), "account list not present, skipping");
            return Ok(stats);
        }

        for entry in sources::load_account_list(path)? {
            let (draft, patch) = list_entry_merge(entry, settings);
            let merge = self.upsert(draft, patch, settings.number_of_words_per_password, passwords);
            stats.record(merge);
        }
        Ok(stats)
    }

    /// Merge a team roster into the repository.
    ///
    /// When the roster carries an organizations file, every team must
    /// reference a known organization. The whole roster is checked before
    /// any account is touched, so a failing roster leaves the repository
    /// unchanged.
    pub fn add_team_accounts<P: PasswordSource + ?Sized>(
        &mut self,
        roster: &RosterSource,
        settings: &GenerationSettings<'_>,
        passwords: &mut P,
    ) -> Result<MergeStats, AccountError> {
        let teams = sources::load_roster(&roster.teams_file)?;
        let organizations = roster
            .organizations_file
            .as_deref()
            .map(sources::load_organizations)
            .transpose()?;

        let mut resolved = Vec::with_capacity(teams.len());
        for team in teams {
            let organization = match &organizations {
                Some(orgs) => Some(organization_for(&team, orgs)?),
                None => None,
            };
            let name = team
                .display_name
                .clone()
                .or_else(|| team.name.clone())
                .ok_or_else(|| AccountError::MissingTeamName {
                    team_id: team.id.clone(),
                    path: roster.teams_file.clone(),
                })?;
            resolved.push((team, name, organization));
        }

        let mut stats = MergeStats::default();
        for (team, name, organization) in resolved {
            let username = format!("{}{}", roster.username_prefix, team.id);
            let draft = AccountDraft {
                username: username.clone(),
                id: username.clone(),
                name,
                kind: AccountKind::Team,
                password: None,
                team_id: Some(team.id.clone()),
                ip: settings.ip_for(&team.id),
            };
            let patch = AccountPatch {
                ip: None,
                team_id: Some(team.id),
            };
            let merge = self.upsert(draft, patch, settings.number_of_words_per_password, passwords);
            stats.record(merge);

            if let (Some(org), Some(account)) = (organization, self.accounts.get_mut(&username)) {
                account.organization = Some(org);
            }
        }
        Ok(stats)
    }

    pub fn get(&self, username: &str) -> Option<&Account> {
        self.accounts.get(username)
    }

    pub fn contains(&self, username: &str) -> bool {
        self.accounts.contains_key(username)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Accounts in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }
}

impl<'a> IntoIterator for &'a AccountRepository {
    type Item = &'a Account;
    type IntoIter = indexmap::map::Values<'a, String, Account>;

    fn into_iter(self) -> Self::IntoIter {
        self.accounts.values()
    }
}

/// Draft and patch for one account-list entry
fn list_entry_merge(
    entry: AccountListEntry,
    settings: &GenerationSettings<'_>,
) -> (AccountDraft, AccountPatch) {
    let id = entry.id.unwrap_or_else(|| entry.username.clone());
    let kind = AccountKind::from(entry.kind);

    let numeric = !id.is_empty() && id.chars().all(|c| c.is_ascii_digit());
    let ip = if kind == AccountKind::Team && numeric {
        settings.ip_for(&id)
    } else {
        None
    };

    let draft = AccountDraft {
        name: entry.name.unwrap_or_else(|| entry.username.clone()),
        username: entry.username,
        id,
        kind,
        password: entry.password,
        team_id: None,
        ip: ip.clone(),
    };
    let patch = AccountPatch { ip, team_id: None };
    (draft, patch)
}

fn organization_for(
    team: &RosterEntry,
    organizations: &std::collections::HashMap<String, Organization>,
) -> Result<String, AccountError> {
    let organization_id =
        team.organization_id
            .as_ref()
            .ok_or_else(|| AccountError::MissingOrganization {
                team_id: team.id.clone(),
            })?;
    organizations
        .get(organization_id)
        .map(|org| org.formal_name.clone())
        .ok_or_else(|| AccountError::UnknownOrganization {
            team_id: team.id.clone(),
            organization_id: organization_id.clone(),
        })
}
