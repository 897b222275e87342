//! Test fixtures for end-to-end runs
//!
//! Builds a throwaway config directory with contests, account files and
//! rosters, plus deterministic stand-ins for the password generator and
//! the PDF converter.

#![allow(dead_code)]

use contest_accounts::output::{OutputError, PageSetup, PdfRenderer};
use contest_accounts::{Config, PasswordSource};
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Config directory on disk
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("create temp dir");
        fs::create_dir_all(dir.path().join("contests")).expect("create contests folder");
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Write `content` to `rel`, creating parent directories
    pub fn write(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.root().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent");
        }
        fs::write(&path, content).expect("write fixture");
        path
    }

    pub fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.root().join(rel)).expect("read output")
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.root().join(rel).exists()
    }

    /// A contest using `contest.yaml` at the top of its directory
    pub fn contest(&self, dir_name: &str, name: &str) -> PathBuf {
        self.write(
            &format!("contests/{}/contest.yaml", dir_name),
            &format!("name: {}\nstart_time: '2024-04-05T10:00:00+02:00'\n", name),
        );
        self.root().join("contests").join(dir_name)
    }

    /// A contest using `config/contest.yaml`
    pub fn legacy_contest(&self, dir_name: &str, name: &str) -> PathBuf {
        self.write(
            &format!("contests/{}/config/contest.yaml", dir_name),
            &format!("name: {}\nstart-time: 2024-04-05 10:00:00\n", name),
        );
        self.root().join("contests").join(dir_name).join("config")
    }

    /// Write `config.yaml` and load it
    pub fn config(&self, yaml: &str) -> Config {
        let path = self.write("config.yaml", yaml);
        Config::load(&path).expect("load config")
    }

    pub fn try_config(&self, yaml: &str) -> contest_accounts::Result<Config> {
        let path = self.write("config.yaml", yaml);
        Ok(Config::load(&path)?)
    }
}

/// Passwords `pw-<n>` in call order
#[derive(Debug, Default)]
pub struct FakePasswords {
    pub calls: usize,
}

impl PasswordSource for FakePasswords {
    fn passphrase(&mut self, num_words: usize) -> String {
        self.calls += 1;
        let words: Vec<String> = (0..num_words).map(|i| format!("w{}x{}", self.calls, i)).collect();
        words.join("-")
    }
}

/// Writes the HTML itself to the output path and remembers each call
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub calls: RefCell<Vec<(PathBuf, PageSetup)>>,
}

impl PdfRenderer for RecordingRenderer {
    fn render(&self, html: &str, output: &Path, page: &PageSetup) -> Result<(), OutputError> {
        fs::write(output, html).map_err(|e| OutputError::Io {
            path: output.to_path_buf(),
            source: e,
        })?;
        self.calls
            .borrow_mut()
            .push((output.to_path_buf(), page.clone()));
        Ok(())
    }
}
