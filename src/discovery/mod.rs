//! Contest discovery
//!
//! Walks the contests folder and recognizes contest directories by their
//! descriptor file. Two layouts are supported:
//!
//! - current: `<dir>/contest.yaml` with `start_time`
//! - legacy:  `<dir>/config/contest.yaml` with `start-time`
//!
//! Directories with neither descriptor are not contests and are skipped.

use serde_yaml::{Mapping, Value};
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::ConfigError;
use crate::document;

/// Directory layout of a contest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContestLayout {
    /// `contest.yaml` at the top of the contest directory
    Current,
    /// `config/contest.yaml`
    Legacy,
}

impl ContestLayout {
    /// Directory holding the descriptor and the contest's account files
    pub fn config_dir(self, contest_dir: &Path) -> PathBuf {
        match self {
            ContestLayout::Current => contest_dir.to_path_buf(),
            ContestLayout::Legacy => contest_dir.join("config"),
        }
    }

    /// Path of the descriptor file in this layout
    pub fn descriptor_path(self, contest_dir: &Path) -> PathBuf {
        self.config_dir(contest_dir).join("contest.yaml")
    }

    /// Key holding the start time in this layout
    pub fn start_time_key(self) -> &'static str {
        match self {
            ContestLayout::Current => "start_time",
            ContestLayout::Legacy => "start-time",
        }
    }
}

/// A contest directory with its descriptor metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredContest {
    /// Directory name, the contest's key in `contests:`
    pub dir_name: String,

    /// Full path to the contest directory
    pub path: PathBuf,

    pub layout: ContestLayout,

    /// Contest name from the descriptor
    pub name: String,

    /// Start time from the descriptor, as written
    pub start_time: String,
}

impl DiscoveredContest {
    pub fn uses_config_folder(&self) -> bool {
        self.layout == ContestLayout::Legacy
    }

    /// Directory holding this contest's account files
    pub fn config_dir(&self) -> PathBuf {
        self.layout.config_dir(&self.path)
    }
}

/// Discover all contests directly below `root`, in file-name order
pub fn discover_contests(root: &Path) -> Result<Vec<DiscoveredContest>, ConfigError> {
    let mut contests = Vec::new();

    for entry in WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if is_broken_link(&e) => {
                tracing::debug!(
                    path = %e.path().unwrap_or(root).display(),
                    "broken symlink, skipping"
                );
                continue;
            }
            Err(source) => {
                return Err(ConfigError::Walk {
                    path: root.to_path_buf(),
                    source,
                })
            }
        };
        if !entry.file_type().is_dir() {
            continue;
        }

        match inspect_contest(entry.path())? {
            Some(contest) => {
                tracing::debug!(
                    contest = %contest.dir_name,
                    legacy = contest.uses_config_folder(),
                    "discovered contest"
                );
                contests.push(contest);
            }
            None => {
                tracing::debug!(path = %entry.path().display(), "no contest.yaml, skipping");
            }
        }
    }

    Ok(contests)
}

/// A link below the root whose target is gone
fn is_broken_link(e: &walkdir::Error) -> bool {
    e.depth() > 0 && e.io_error().map(io::Error::kind) == Some(io::ErrorKind::NotFound)
}

/// Inspect a single directory, returning `None` when it holds no descriptor
pub fn inspect_contest(dir: &Path) -> Result<Option<DiscoveredContest>, ConfigError> {
    let layout = [ContestLayout::Current, ContestLayout::Legacy]
        .into_iter()
        .find(|layout| layout.descriptor_path(dir).is_file());
    let Some(layout) = layout else {
        return Ok(None);
    };

    let descriptor = layout.descriptor_path(dir);
    let data: Mapping = document::read_yaml(&descriptor)?;

    let name = scalar_key(&data, "name", &descriptor)?;
    let start_time = scalar_key(&data, layout.start_time_key(), &descriptor)?;

    let dir_name = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(Some(DiscoveredContest {
        dir_name,
        path: dir.to_path_buf(),
        layout,
        name,
        start_time,
    }))
}

fn scalar_key(data: &Mapping, key: &str, path: &Path) -> Result<String, ConfigError> {
    let missing = || ConfigError::MissingKey {
        path: path.to_path_buf(),
        key: key.to_string(),
    };
    match data.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(Value::Bool(b)) => Ok(b.to_string()),
        _ => Err(missing()),
    }
}
