//! Scope validation
//!
//! Read-only checks run before any account is loaded or any file written.
//! A successful check yields the resolved settings of the scope; a failed
//! one names the missing field and the scope.

use std::fmt;
use std::path::PathBuf;

use crate::accounts::RosterSource;
use crate::config::{resolve, AccountTypesConfig, Config, Resolved, ScopeResolver};
use crate::discovery::DiscoveredContest;

/// Scope named in validation messages
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeLabel {
    Contest(String),
    Cds,
    Challenge,
}

impl fmt::Display for ScopeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeLabel::Contest(name) => write!(f, "contest {}", name),
            ScopeLabel::Cds => write!(f, "CDS"),
            ScopeLabel::Challenge => write!(f, "Challenge"),
        }
    }
}

/// Validation failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} missing for {scope}")]
    MissingField {
        field: &'static str,
        scope: ScopeLabel,
    },

    #[error("Number of words per password must be at least 1 for {0}")]
    NoPasswordWords(ScopeLabel),

    #[error("Contest {0} not found")]
    UnknownContest(String),

    #[error("CDS configuration missing")]
    CdsMissing,

    #[error("CDS config file {0} does not exist")]
    CdsConfigNotFound(PathBuf),

    #[error("Challenge configuration missing")]
    ChallengeMissing,

    #[error("{scope} banner file {path} missing on disk")]
    BannerNotFound { scope: ScopeLabel, path: PathBuf },
}

/// Settings consumed by the password-sheet renderer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetSettings {
    pub title: Option<String>,
    pub footer: Option<String>,
    pub banner: Option<PathBuf>,
    pub account_types: AccountTypesConfig,
    pub page_size: String,
}

/// A validated contest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedContest {
    pub contest: DiscoveredContest,
    pub sheet: SheetSettings,
    pub number_of_words_per_password: usize,
    pub ip_prefix: Option<String>,
    pub generate_accounts_tsv: bool,
    pub additional_account_files: Vec<PathBuf>,
}

/// A validated CDS deployment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCds {
    pub descriptor: PathBuf,
    pub servers_folder: Option<PathBuf>,
    pub sheet: SheetSettings,
    pub number_of_words_per_password: usize,
}

/// A validated challenge deployment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedChallenge {
    pub sheet: SheetSettings,
    pub number_of_words_per_password: usize,
    pub ip_prefix: Option<String>,
    pub generate_accounts_tsv: bool,
    pub account_files: Vec<RosterSource>,
}

/// Everything that validated in [`Validator::all`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub contests: Vec<ResolvedContest>,
    pub cds: Option<ResolvedCds>,
    pub challenge: Option<ResolvedChallenge>,
}

fn require<T>(resolved: Resolved<T>, field: &'static str, scope: &ScopeLabel) -> Result<T, ValidationError> {
    resolved.value.ok_or_else(|| ValidationError::MissingField {
        field,
        scope: scope.clone(),
    })
}

fn require_words(resolver: &ScopeResolver<'_>, scope: &ScopeLabel) -> Result<usize, ValidationError> {
    let words = require(
        resolver.number_of_words_per_password(),
        "Number of words per password",
        scope,
    )?;
    if words == 0 {
        return Err(ValidationError::NoPasswordWords(scope.clone()));
    }
    Ok(words)
}

/// Validates scopes of a loaded configuration
pub struct Validator<'a> {
    config: &'a Config,
}

impl<'a> Validator<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Validate one discovered contest
    pub fn contest(&self, name: &str) -> Result<ResolvedContest, ValidationError> {
        let scope = self
            .config
            .contest(name)
            .ok_or_else(|| ValidationError::UnknownContest(name.to_string()))?;
        let label = ScopeLabel::Contest(name.to_string());
        let resolver = self.config.contest_resolver(scope);

        let account_types = require(resolver.account_types(), "Account types", &label)?;
        let page_size = require(resolver.page_size(), "Page size", &label)?;
        let words = require_words(&resolver, &label)?;

        let additional_account_files = resolver
            .additional_account_files()
            .value
            .unwrap_or_default()
            .iter()
            .map(|p| self.config.path(p))
            .collect();

        Ok(ResolvedContest {
            contest: scope.contest.clone(),
            sheet: SheetSettings {
                title: Some(scope.contest.name.clone()),
                footer: resolver.footer().value.map(str::to_string),
                banner: None,
                account_types: account_types.clone(),
                page_size: page_size.to_string(),
            },
            number_of_words_per_password: words,
            ip_prefix: resolver.ip_prefix().value.map(str::to_string),
            generate_accounts_tsv: resolver.generate_accounts_tsv().value.unwrap_or(false),
            additional_account_files,
        })
    }

    /// Validate the CDS section
    pub fn cds(&self) -> Result<ResolvedCds, ValidationError> {
        let cds = self.config.cds.as_ref().ok_or(ValidationError::CdsMissing)?;
        let label = ScopeLabel::Cds;
        let resolver = ScopeResolver::new(cds, &self.config.global, &self.config.defaults);

        let descriptor = resolve(
            "config",
            cds.config.clone(),
            None,
            Some(self.config.defaults.cds_config.clone()),
        )
        .value
        .map(|p| self.config.path(&p))
        .ok_or(ValidationError::CdsMissing)?;
        if !descriptor.is_file() {
            return Err(ValidationError::CdsConfigNotFound(descriptor));
        }

        let banner = self.existing_banner(cds.banner.as_deref(), &label)?;
        let page_size = require(resolver.page_size(), "Page size", &label)?;
        let words = require_words(&resolver, &label)?;

        Ok(ResolvedCds {
            descriptor,
            servers_folder: cds.servers_folder.as_deref().map(|p| self.config.path(p)),
            sheet: SheetSettings {
                title: None,
                footer: resolver.footer().value.map(str::to_string),
                banner,
                account_types: AccountTypesConfig::default(),
                page_size: page_size.to_string(),
            },
            number_of_words_per_password: words,
        })
    }

    /// Validate the challenge section
    pub fn challenge(&self) -> Result<ResolvedChallenge, ValidationError> {
        let challenge = self
            .config
            .challenge
            .as_ref()
            .ok_or(ValidationError::ChallengeMissing)?;
        let label = ScopeLabel::Challenge;
        let resolver = ScopeResolver::new(challenge, &self.config.global, &self.config.defaults);

        let title = require(
            resolve("title", challenge.title.as_deref(), None, None),
            "Title",
            &label,
        )?;
        let banner = self.existing_banner(challenge.banner.as_deref(), &label)?;
        // Account types must be set on the challenge itself
        let account_types = require(
            resolve("account_types", challenge.account_types.as_ref(), None, None),
            "Account types",
            &label,
        )?;
        if challenge.account_files.is_empty() {
            return Err(ValidationError::MissingField {
                field: "Account files",
                scope: label,
            });
        }
        let page_size = require(resolver.page_size(), "Page size", &label)?;
        let words = require_words(&resolver, &label)?;

        let account_files = challenge
            .account_files
            .iter()
            .map(|f| RosterSource {
                teams_file: self.config.path(&f.teams_file),
                organizations_file: f.organizations_file.as_deref().map(|p| self.config.path(p)),
                username_prefix: f
                    .username_prefix
                    .clone()
                    .unwrap_or_else(|| self.config.defaults.username_prefix.clone()),
            })
            .collect();

        Ok(ResolvedChallenge {
            sheet: SheetSettings {
                title: Some(title.to_string()),
                footer: resolver.footer().value.map(str::to_string),
                banner,
                account_types: account_types.clone(),
                page_size: page_size.to_string(),
            },
            number_of_words_per_password: words,
            ip_prefix: resolver.ip_prefix().value.map(str::to_string),
            generate_accounts_tsv: resolver.generate_accounts_tsv().value.unwrap_or(false),
            account_files,
        })
    }

    /// Validate every contest plus the CDS and challenge sections when present
    pub fn all(&self) -> Result<ValidationReport, ValidationError> {
        let contests = self
            .config
            .contests
            .keys()
            .map(|name| self.contest(name))
            .collect::<Result<Vec<_>, _>>()?;
        let cds = self.config.cds.as_ref().map(|_| self.cds()).transpose()?;
        let challenge = self
            .config
            .challenge
            .as_ref()
            .map(|_| self.challenge())
            .transpose()?;
        Ok(ValidationReport {
            contests,
            cds,
            challenge,
        })
    }

    fn existing_banner(
        &self,
        banner: Option<&std::path::Path>,
        label: &ScopeLabel,
    ) -> Result<Option<PathBuf>, ValidationError> {
        let Some(banner) = banner else {
            return Ok(None);
        };
        let path = self.config.path(banner);
        if !path.is_file() {
            return Err(ValidationError::BannerNotFound {
                scope: label.clone(),
                path,
            });
        }
        Ok(Some(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RawConfig;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn config(dir: &Path, yaml: &str) -> Config {
        let contests = dir.join("contests/finals");
        fs::create_dir_all(&contests).unwrap();
        fs::write(contests.join("contest.yaml"), "name: Finals\nstart_time: t\n").unwrap();
        let raw: RawConfig = serde_yaml::from_str(yaml).unwrap();
        Config::from_raw(raw, dir).unwrap()
    }

    const COMPLETE_GLOBAL: &str = "global:\n  contests_folder: contests\n  page_size: A4\n  number_of_words_per_password: 3\n  account_types: {linux: true}\n";

    #[test]
    fn test_contest_resolved_from_global() {
        let dir = TempDir::new().unwrap();
        let config = config(dir.path(), COMPLETE_GLOBAL);

        let resolved = Validator::new(&config).contest("finals").unwrap();
        assert_eq!(resolved.sheet.page_size, "A4");
        assert_eq!(resolved.sheet.title.as_deref(), Some("Finals"));
        assert_eq!(resolved.number_of_words_per_password, 3);
        assert!(resolved.sheet.account_types.linux);
        assert!(!resolved.generate_accounts_tsv);
        assert!(resolved.additional_account_files.is_empty());
    }

    #[test]
    fn test_contest_missing_fields() {
        let dir = TempDir::new().unwrap();
        let config = config(dir.path(), "global:\n  contests_folder: contests\n  page_size: A4\n");

        let err = Validator::new(&config).contest("finals").unwrap_err();
        assert_eq!(err.to_string(), "Account types missing for contest finals");


        let config = self::config(
            dir.path(),
            "global:\n  contests_folder: contests\n  account_types: {}\n  page_size: A4\ncontests:\n  finals:\n    number_of_words_per_password: 0\n",
        );
        let err = Validator::new(&config).contest("finals").unwrap_err();
        assert!(matches!(err, ValidationError::NoPasswordWords(_)));
    }

    #[test]
    fn test_contest_page_size_and_words_default() {
        let dir = TempDir::new().unwrap();
        let config = config(dir.path(), "global:\n  contests_folder: contests\n  account_types: {}\n");

        let resolved = Validator::new(&config).contest("finals").unwrap();
        assert_eq!(resolved.sheet.page_size, "A4");
        assert_eq!(resolved.number_of_words_per_password, 4);
    }

    #[test]
    fn test_contest_override_fills_missing_global() {
        let dir = TempDir::new().unwrap();
        let config = config(
            dir.path(),
            "global:\n  contests_folder: contests\n  account_types: {}\ncontests:\n  finals:\n    page_size: Letter\n    number_of_words_per_password: 5\n    additional_account_files: [staff.yaml]\n",
        );

        let resolved = Validator::new(&config).contest("finals").unwrap();
        assert_eq!(resolved.sheet.page_size, "Letter");
        assert_eq!(resolved.number_of_words_per_password, 5);
        assert_eq!(
            resolved.additional_account_files,
            vec![dir.path().join("staff.yaml")]
        );
    }

    #[test]
    fn test_unknown_contest() {
        let dir = TempDir::new().unwrap();
        let config = config(dir.path(), COMPLETE_GLOBAL);
        let err = Validator::new(&config).contest("ghost").unwrap_err();
        assert_eq!(err, ValidationError::UnknownContest("ghost".to_string()));
    }

    #[test]
    fn test_cds_requirements() {
        let dir = TempDir::new().unwrap();
        let config = config(dir.path(), COMPLETE_GLOBAL);
        assert_eq!(Validator::new(&config).cds().unwrap_err(), ValidationError::CdsMissing);

        let yaml = format!("{}cds:\n  footer: CDS\n", COMPLETE_GLOBAL);
        let config = self::config(dir.path(), &yaml);
        let err = Validator::new(&config).cds().unwrap_err();
        assert_eq!(
            err,
            ValidationError::CdsConfigNotFound(dir.path().join("cds-config.yaml"))
        );

        fs::write(dir.path().join("cds-config.yaml"), "servers: []\n").unwrap();
        let resolved = Validator::new(&config).cds().unwrap();
        assert_eq!(resolved.sheet.footer.as_deref(), Some("CDS"));
        assert_eq!(resolved.sheet.page_size, "A4");
        assert_eq!(resolved.number_of_words_per_password, 3);
        assert_eq!(resolved.sheet.banner, None);
    }

    #[test]
    fn test_cds_banner_must_exist() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("cds-config.yaml"), "servers: []\n").unwrap();
        let yaml = format!("{}cds:\n  banner: cds-banner.png\n", COMPLETE_GLOBAL);
        let config = self::config(dir.path(), &yaml);

        let err = Validator::new(&config).cds().unwrap_err();
        assert_eq!(
            err,
            ValidationError::BannerNotFound {
                scope: ScopeLabel::Cds,
                path: dir.path().join("cds-banner.png"),
            }
        );
        assert!(err.to_string().starts_with("CDS banner file"));

        fs::write(dir.path().join("cds-banner.png"), b"png").unwrap();
        let resolved = Validator::new(&config).cds().unwrap();
        assert_eq!(resolved.sheet.banner, Some(dir.path().join("cds-banner.png")));
    }

    #[test]
    fn test_challenge_requirements() {
        let dir = TempDir::new().unwrap();

        let yaml = format!("{}challenge:\n  account_types: {{}}\n", COMPLETE_GLOBAL);
        let config = self::config(dir.path(), &yaml);
        let err = Validator::new(&config).challenge().unwrap_err();
        assert_eq!(err.to_string(), "Title missing for Challenge");

        let yaml = format!("{}challenge:\n  title: Practice\n", COMPLETE_GLOBAL);
        let config = self::config(dir.path(), &yaml);
        let err = Validator::new(&config).challenge().unwrap_err();
        assert_eq!(err.to_string(), "Account types missing for Challenge");

        let yaml = format!(
            "{}challenge:\n  title: Practice\n  account_types: {{}}\n",
            COMPLETE_GLOBAL
        );
        let config = self::config(dir.path(), &yaml);
        let err = Validator::new(&config).challenge().unwrap_err();
        assert_eq!(err.to_string(), "Account files missing for Challenge");

        let yaml = format!(
            "{}challenge:\n  title: Practice\n  banner: logo.png\n  account_types: {{}}\n  account_files: [{{teams_file: teams.json}}]\n",
            COMPLETE_GLOBAL
        );
        let config = self::config(dir.path(), &yaml);
        let err = Validator::new(&config).challenge().unwrap_err();
        assert!(matches!(err, ValidationError::BannerNotFound { .. }));
        assert!(err.to_string().starts_with("Challenge banner file"));

        fs::write(dir.path().join("logo.png"), b"png").unwrap();
        let resolved = Validator::new(&config).challenge().unwrap();
        assert_eq!(resolved.sheet.title.as_deref(), Some("Practice"));
        assert_eq!(resolved.sheet.banner, Some(dir.path().join("logo.png")));
        assert_eq!(resolved.account_files[0].username_prefix, "team");
        assert_eq!(
            resolved.account_files[0].teams_file,
            dir.path().join("teams.json")
        );
    }

    #[test]
    fn test_validation_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let yaml = format!(
            "{}challenge:\n  title: P\n  account_types: {{}}\n  account_files: [{{teams_file: t.json}}]\n",
            COMPLETE_GLOBAL
        );
        let config = config(dir.path(), &yaml);
        let validator = Validator::new(&config);

        let first = validator.all().unwrap();
        let second = validator.all().unwrap();
        assert_eq!(first, second);
        assert_eq!(first.contests.len(), 1);
        assert!(first.cds.is_none());
        assert!(first.challenge.is_some());
    }
}
