//! Per-scope generation runs
//!
//! Each run follows the same steps:
//! 1. Validate the scope and resolve its settings
//! 2. Fold the scope's account sources into a fresh repository
//! 3. Write YAML/TSV exports and, when a renderer is set, the PDF sheets
//!
//! Nothing is written for a scope until steps 1 and 2 have succeeded.

use std::path::{Path, PathBuf};

use crate::accounts::{
    merge_sources, AccountRepository, AccountSource, CdsDescriptor, GenerationSettings,
    PasswordSource, RosterSource,
};
use crate::config::{BuiltinDefaults, Config};
use crate::error::Result;
use crate::output::{
    self, cds_entries, render_cds_master, render_cds_sheets, render_master,
    render_password_sheets, today_formatted, OutputDir, PageSetup, PdfRenderer, SheetContext,
};
use crate::validate::{ResolvedContest, SheetSettings, Validator};

/// Scope directory for the CDS deployment
pub const CDS_SCOPE: &str = "cds";
/// Scope directory for the challenge deployment
pub const CHALLENGE_SCOPE: &str = "challenge";

/// What a scope run produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeReport {
    pub scope: String,
    pub accounts: usize,
    pub written: Vec<PathBuf>,
}

/// First of `names` present in `dir`
fn first_present(dir: &Path, names: &[&str]) -> Option<PathBuf> {
    names.iter().map(|n| dir.join(n)).find(|p| p.is_file())
}

/// Account sources of a contest, in merge order
pub fn contest_sources(contest: &ResolvedContest, defaults: &BuiltinDefaults) -> Vec<AccountSource> {
    let config_dir = contest.contest.config_dir();
    let mut sources = vec![AccountSource::List(config_dir.join("accounts.yaml"))];

    for file in &contest.additional_account_files {
        if !file.is_file() {
            tracing::warn!(
                contest = %contest.contest.dir_name,
                "Additional account file {} not found, skipping",
                file.display()
            );
        }
        sources.push(AccountSource::List(file.clone()));
    }

    if let Some(teams_file) = first_present(&config_dir, &["teams.json", "teams.yaml"]) {
        sources.push(AccountSource::Roster(RosterSource {
            teams_file,
            organizations_file: first_present(
                &config_dir,
                &["organizations.json", "organizations.yaml"],
            ),
            username_prefix: defaults.username_prefix.clone(),
        }));
    }
    sources
}

/// Runs scopes of one configuration
pub struct Pipeline<'a> {
    config: &'a Config,
    passwords: &'a mut dyn PasswordSource,
    renderer: Option<&'a dyn PdfRenderer>,
    date: String,
}

impl<'a> Pipeline<'a> {
    /// A pipeline that writes no PDFs until a renderer is set
    pub fn new(config: &'a Config, passwords: &'a mut dyn PasswordSource) -> Self {
        Self {
            config,
            passwords,
            renderer: None,
            date: today_formatted(),
        }
    }

    pub fn with_renderer(mut self, renderer: &'a dyn PdfRenderer) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Date printed on master sheets
    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = date.into();
        self
    }

    /// Generate one contest
    pub fn run_contest(&mut self, name: &str) -> Result<ScopeReport> {
        let resolved = Validator::new(self.config).contest(name)?;
        let sources = contest_sources(&resolved, &self.config.defaults);
        let settings = GenerationSettings {
            number_of_words_per_password: resolved.number_of_words_per_password,
            ip_prefix: resolved.ip_prefix.as_deref(),
        };
        let accounts = merge_sources(&sources, &settings, &mut *self.passwords)?;
        tracing::debug!(contest = name, accounts = accounts.len(), "contest accounts merged");

        let out = OutputDir::create(&self.config.base_dir, &resolved.contest.dir_name)?;
        let mut written = self.write_exports(
            &out,
            &accounts,
            resolved.generate_accounts_tsv,
            resolved.sheet.account_types.linux,
        )?;
        if resolved.generate_accounts_tsv {
            let copy = resolved.contest.config_dir().join("accounts.tsv");
            output::copy_replacing(&out.scoped_file("accounts.tsv"), &copy)?;
            written.push(copy);
        }
        written.extend(self.write_sheets(&out, &resolved.sheet, &accounts)?);

        Ok(ScopeReport {
            scope: resolved.contest.dir_name,
            accounts: accounts.len(),
            written,
        })
    }

    /// Generate every discovered contest, in discovery order
    pub fn run_all_contests(&mut self) -> Result<Vec<ScopeReport>> {
        let names: Vec<String> = self.config.contests.keys().cloned().collect();
        names.iter().map(|name| self.run_contest(name)).collect()
    }

    /// Generate the CDS accounts of every server
    pub fn run_cds(&mut self) -> Result<ScopeReport> {
        let resolved = Validator::new(self.config).cds()?;
        let descriptor = CdsDescriptor::load(&resolved.descriptor)?;
        let servers = descriptor
            .accounts_per_server(resolved.number_of_words_per_password, &mut *self.passwords);

        let out = OutputDir::create(&self.config.base_dir, CDS_SCOPE)?;
        let servers_folder = resolved
            .servers_folder
            .clone()
            .unwrap_or_else(|| out.path().to_path_buf());
        let mut written = output::write_server_accounts(&servers_folder, &servers)?;

        let entries = cds_entries(&servers);
        if let Some(renderer) = self.renderer {
            let ctx = SheetContext::new(&resolved.sheet, self.date.clone());
            let page_size = &resolved.sheet.page_size;

            let sheets = out.scoped_file("passwords.pdf");
            renderer.render(
                &render_cds_sheets(&ctx, &entries),
                &sheets,
                &PageSetup::portrait(page_size),
            )?;
            tracing::info!("Written CDS password sheets to {}", sheets.display());

            let master = out.scoped_file("master.pdf");
            renderer.render(
                &render_cds_master(&ctx, &entries),
                &master,
                &PageSetup::landscape(page_size),
            )?;
            tracing::info!("Written CDS master file to {}", master.display());
            written.extend([sheets, master]);
        }

        Ok(ScopeReport {
            scope: CDS_SCOPE.to_string(),
            accounts: entries.len(),
            written,
        })
    }

    /// Generate the challenge accounts
    pub fn run_challenge(&mut self) -> Result<ScopeReport> {
        let resolved = Validator::new(self.config).challenge()?;
        let sources: Vec<AccountSource> = resolved
            .account_files
            .iter()
            .cloned()
            .map(AccountSource::Roster)
            .collect();
        let settings = GenerationSettings {
            number_of_words_per_password: resolved.number_of_words_per_password,
            ip_prefix: resolved.ip_prefix.as_deref(),
        };
        let accounts = merge_sources(&sources, &settings, &mut *self.passwords)?;

        let out = OutputDir::create(&self.config.base_dir, CHALLENGE_SCOPE)?;
        let mut written = self.write_exports(
            &out,
            &accounts,
            resolved.generate_accounts_tsv,
            resolved.sheet.account_types.linux,
        )?;
        written.extend(self.write_sheets(&out, &resolved.sheet, &accounts)?);

        Ok(ScopeReport {
            scope: CHALLENGE_SCOPE.to_string(),
            accounts: accounts.len(),
            written,
        })
    }

    fn write_exports(
        &self,
        out: &OutputDir,
        accounts: &AccountRepository,
        tsv: bool,
        linux: bool,
    ) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();

        let yaml = out.scoped_file("accounts.yaml");
        output::write_accounts_yaml(&yaml, accounts)?;
        written.push(yaml);

        if tsv {
            let path = out.scoped_file("accounts.tsv");
            output::write_accounts_tsv(&path, accounts)?;
            written.push(path);
        }

        if linux {
            let path = out.file("linux-accounts.yaml");
            output::write_linux_accounts(&path, accounts)?;
            written.push(path);
        }
        Ok(written)
    }

    fn write_sheets(
        &self,
        out: &OutputDir,
        sheet: &SheetSettings,
        accounts: &AccountRepository,
    ) -> Result<Vec<PathBuf>> {
        let Some(renderer) = self.renderer else {
            tracing::debug!(scope = out.scope(), "PDF rendering disabled");
            return Ok(Vec::new());
        };

        let ctx = SheetContext::new(sheet, self.date.clone());
        let list: Vec<_> = accounts.iter().collect();

        let sheets = out.scoped_file("passwords.pdf");
        renderer.render(
            &render_password_sheets(&ctx, &list),
            &sheets,
            &PageSetup::portrait(&sheet.page_size),
        )?;
        tracing::info!("Written password sheets to {}", sheets.display());

        let master = out.scoped_file("master.pdf");
        renderer.render(
            &render_master(&ctx, &list),
            &master,
            &PageSetup::landscape(&sheet.page_size),
        )?;
        tracing::info!("Written master file to {}", master.display());

        Ok(vec![sheets, master])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AccountTypesConfig;
    use crate::discovery::{ContestLayout, DiscoveredContest};
    use std::fs;
    use tempfile::TempDir;

    fn resolved(dir: &Path, layout: ContestLayout, extra: Vec<PathBuf>) -> ResolvedContest {
        ResolvedContest {
            contest: DiscoveredContest {
                dir_name: "finals".into(),
                path: dir.to_path_buf(),
                layout,
                name: "Finals".into(),
                start_time: "t".into(),
            },
            sheet: SheetSettings {
                title: None,
                footer: None,
                banner: None,
                account_types: AccountTypesConfig::default(),
                page_size: "A4".into(),
            },
            number_of_words_per_password: 3,
            ip_prefix: None,
            generate_accounts_tsv: false,
            additional_account_files: extra,
        }
    }

    #[test]
    fn test_contest_sources_without_roster() {
        let dir = TempDir::new().unwrap();
        let extra = dir.path().join("staff.yaml");
        let contest = resolved(dir.path(), ContestLayout::Current, vec![extra.clone()]);

        let sources = contest_sources(&contest, &BuiltinDefaults::default());
        assert_eq!(
            sources,
            vec![
                AccountSource::List(dir.path().join("accounts.yaml")),
                AccountSource::List(extra),
            ]
        );
    }

    #[test]
    fn test_contest_sources_prefer_json_roster() {
        let dir = TempDir::new().unwrap();
        let config_dir = dir.path().join("config");
        fs::create_dir_all(&config_dir).unwrap();
        fs::write(config_dir.join("teams.json"), "[]").unwrap();
        fs::write(config_dir.join("teams.yaml"), "[]").unwrap();
        fs::write(config_dir.join("organizations.yaml"), "[]").unwrap();
        let contest = resolved(dir.path(), ContestLayout::Legacy, Vec::new());

        let sources = contest_sources(&contest, &BuiltinDefaults::default());
        assert_eq!(sources.len(), 2);
        assert_eq!(
            sources[1],
            AccountSource::Roster(RosterSource {
                teams_file: config_dir.join("teams.json"),
                organizations_file: Some(config_dir.join("organizations.yaml")),
                username_prefix: "team".into(),
            })
        );
    }
}
