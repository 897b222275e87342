//! YAML and TSV exports
//!
//! TSV rows end in `\r\n` and quote fields the way csv writers do.

use indexmap::IndexMap;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use super::OutputError;
use crate::accounts::{Account, AccountRepository, ServerAccounts};

fn write_yaml<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), OutputError> {
    let yaml = serde_yaml::to_string(value).map_err(|e| OutputError::Serialize {
        path: path.to_path_buf(),
        source: e,
    })?;
    fs::write(path, yaml).map_err(|e| OutputError::io(path, e))
}

/// Dump every account, in repository order
pub fn write_accounts_yaml(path: &Path, accounts: &AccountRepository) -> Result<(), OutputError> {
    let list: Vec<&Account> = accounts.iter().collect();
    write_yaml(path, &list)?;
    tracing::info!("Written accounts YAML to {}", path.display());
    Ok(())
}

fn tsv_field(value: &str) -> String {
    if value.contains(['\t', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

const TSV_LINE_END: &str = "\r\n";

/// `accounts\t1` header, then `type, name, username, password` per account
pub fn write_accounts_tsv(path: &Path, accounts: &AccountRepository) -> Result<(), OutputError> {
    let mut out = format!("accounts\t1{}", TSV_LINE_END);
    for account in accounts {
        let row = [
            account.kind.as_str(),
            account.name.as_str(),
            account.username.as_str(),
            account.password.as_str(),
        ]
        .map(tsv_field)
        .join("\t");
        out.push_str(&row);
        out.push_str(TSV_LINE_END);
    }
    fs::write(path, out).map_err(|e| OutputError::io(path, e))?;
    tracing::info!("Written accounts TSV to {}", path.display());
    Ok(())
}

/// Copy `from` to `to`, removing whatever was at `to` first
pub fn copy_replacing(from: &Path, to: &Path) -> Result<(), OutputError> {
    if to.exists() {
        fs::remove_file(to).map_err(|e| OutputError::io(to, e))?;
    }
    fs::copy(from, to).map_err(|e| OutputError::io(to, e))?;
    tracing::info!("TSV copied to {}", to.display());
    Ok(())
}

#[derive(Serialize)]
struct LinuxAccounts<'a> {
    users: IndexMap<&'a str, &'a str>,
}

/// `users: {username: password}`
pub fn write_linux_accounts(path: &Path, accounts: &AccountRepository) -> Result<(), OutputError> {
    let users = accounts
        .iter()
        .map(|a| (a.username.as_str(), a.password.as_str()))
        .collect();
    write_yaml(path, &LinuxAccounts { users })?;
    tracing::info!("Written Linux accounts to {}", path.display());
    Ok(())
}

/// `<servers_folder>/<server>/accounts.yaml` for every server
pub fn write_server_accounts(
    servers_folder: &Path,
    servers: &[ServerAccounts],
) -> Result<Vec<PathBuf>, OutputError> {
    servers
        .iter()
        .map(|entry| {
            let dir = servers_folder.join(&entry.server.name);
            fs::create_dir_all(&dir).map_err(|e| OutputError::io(&dir, e))?;
            let path = dir.join("accounts.yaml");
            write_accounts_yaml(&path, &entry.accounts)?;
            Ok(path)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::{AccountDraft, AccountKind, AccountPatch, CdsServer};
    use crate::accounts::testing::SequentialPasswords;
    use tempfile::TempDir;

    fn repository() -> AccountRepository {
        let mut repo = AccountRepository::new();
        let mut pw = SequentialPasswords::default();
        for (username, kind, name) in [
            ("admin", AccountKind::Other("admin".into()), "Administrator"),
            ("team1", AccountKind::Team, "Tabs\tand \"quotes\""),
        ] {
            let draft = AccountDraft {
                username: username.to_string(),
                id: username.to_string(),
                name: name.to_string(),
                kind,
                password: None,
                team_id: None,
                ip: None,
            };
            repo.upsert(draft, AccountPatch::default(), 2, &mut pw);
        }
        repo
    }

    #[test]
    fn test_accounts_yaml_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("finals.accounts.yaml");
        write_accounts_yaml(&path, &repository()).unwrap();

        let parsed: Vec<Account> = serde_yaml::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].username, "admin");
        assert_eq!(parsed[1].kind, AccountKind::Team);
    }

    #[test]
    fn test_accounts_tsv_layout() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("finals.accounts.tsv");
        write_accounts_tsv(&path, &repository()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "accounts\t1\r\n\
             admin\tAdministrator\tadmin\tpw-1-2\r\n\
             team\t\"Tabs\tand \"\"quotes\"\"\"\tteam1\tpw-2-2\r\n"
        );
    }

    #[test]
    fn test_copy_replacing() {
        let dir = TempDir::new().unwrap();
        let from = dir.path().join("a.tsv");
        let to = dir.path().join("accounts.tsv");
        fs::write(&from, "new").unwrap();
        fs::write(&to, "old").unwrap();

        copy_replacing(&from, &to).unwrap();
        assert_eq!(fs::read_to_string(&to).unwrap(), "new");
    }

    #[test]
    fn test_linux_accounts() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("linux-accounts.yaml");
        write_linux_accounts(&path, &repository()).unwrap();

        let parsed: serde_yaml::Value = serde_yaml::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed["users"]["admin"].as_str(), Some("pw-1-2"));
        assert_eq!(parsed["users"]["team1"].as_str(), Some("pw-2-2"));
    }

    #[test]
    fn test_server_accounts_written_per_server() {
        let dir = TempDir::new().unwrap();
        let servers = vec![
            ServerAccounts {
                server: CdsServer {
                    name: "cds1".into(),
                    url: "https://cds1".into(),
                },
                accounts: repository(),
            },
            ServerAccounts {
                server: CdsServer {
                    name: "cds2".into(),
                    url: "https://cds2".into(),
                },
                accounts: AccountRepository::new(),
            },
        ];

        let written = write_server_accounts(&dir.path().join("servers"), &servers).unwrap();
        assert_eq!(
            written,
            vec![
                dir.path().join("servers/cds1/accounts.yaml"),
                dir.path().join("servers/cds2/accounts.yaml"),
            ]
        );
        assert!(written.iter().all(|p| p.is_file()));
    }
}
