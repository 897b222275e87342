//! CDS server/account descriptor
//!
//! ```yaml
//! servers:
//!   - {name: cds1, url: https://cds1.example}
//! accounts:
//!   - {name: Admin, username: admin, type: admin, servers: [cds1]}
//! ```
//!
//! Every server gets its own account set, and so its own passwords.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use super::{
    AccountDraft, AccountError, AccountKind, AccountPatch, AccountRepository, Merge, PasswordSource,
};
use crate::document;

/// A CDS server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CdsServer {
    pub name: String,
    pub url: String,
}

/// An account to create on one or more servers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CdsAccount {
    pub name: String,
    pub username: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub servers: Vec<String>,
}

/// The CDS descriptor file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CdsDescriptor {
    #[serde(default)]
    pub servers: Vec<CdsServer>,
    #[serde(default)]
    pub accounts: Vec<CdsAccount>,
}

/// Accounts generated for one server
#[derive(Debug, Clone)]
pub struct ServerAccounts {
    pub server: CdsServer,
    pub accounts: AccountRepository,
}

impl CdsDescriptor {
    /// Load and validate a descriptor file
    pub fn load(path: &Path) -> Result<Self, AccountError> {
        let descriptor: CdsDescriptor = document::read_yaml(path)?;
        descriptor.validate()?;
        Ok(descriptor)
    }

    /// Server names are unique and every account references declared servers
    pub fn validate(&self) -> Result<(), AccountError> {
        let mut names = HashSet::new();
        for server in &self.servers {
            if !names.insert(server.name.as_str()) {
                return Err(AccountError::DuplicateServer(server.name.clone()));
            }
        }

        for account in &self.accounts {
            if let Some(unknown) = account.servers.iter().find(|s| !names.contains(s.as_str())) {
                return Err(AccountError::UnknownServer {
                    username: account.username.clone(),
                    server: unknown.clone(),
                });
            }
        }
        Ok(())
    }

    /// Generate the accounts of every server, in server order
    pub fn accounts_per_server<P: PasswordSource + ?Sized>(
        &self,
        num_words: usize,
        passwords: &mut P,
    ) -> Vec<ServerAccounts> {
        self.servers
            .iter()
            .map(|server| {
                let mut accounts = AccountRepository::new();
                for account in self
                    .accounts
                    .iter()
                    .filter(|a| a.servers.iter().any(|s| *s == server.name))
                {
                    let draft = AccountDraft {
                        username: account.username.clone(),
                        id: account.username.clone(),
                        name: account.name.clone(),
                        kind: AccountKind::from(account.kind.as_str()),
                        password: None,
                        team_id: None,
                        ip: None,
                    };
                    if accounts.upsert(draft, AccountPatch::default(), num_words, passwords)
                        == Merge::Unchanged
                    {
                        tracing::warn!(
                            server = %server.name,
                            username = %account.username,
                            "duplicate CDS account, keeping the first"
                        );
                    }
                }
                tracing::debug!(server = %server.name, accounts = accounts.len(), "CDS server accounts");
                ServerAccounts {
                    server: server.clone(),
                    accounts,
                }
            })
            .collect()
    }
}
