//! Output adapters
//!
//! Everything here consumes a finished account set; nothing feeds back
//! into merging. Files land in `<base_dir>/<scope>/`.

mod files;
mod pdf;
mod sheets;

pub use files::{
    copy_replacing, write_accounts_tsv, write_accounts_yaml, write_linux_accounts,
    write_server_accounts,
};
pub use pdf::{wkhtmltopdf_args, Orientation, PageSetup, PdfRenderer, Wkhtmltopdf};
pub use sheets::{
    cds_entries, cds_master_rows, escape_html, master_layout, render_cds_master,
    render_cds_sheets, render_master, render_password_sheets, today_formatted, CdsSheetEntry,
    MasterLayout, SheetContext,
};

use std::fs;
use std::path::{Path, PathBuf};

/// Errors raised while writing artifacts
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to run {program}: {source}")]
    RendererSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status} while writing {path}: {stderr}")]
    RendererFailed {
        program: String,
        status: String,
        path: PathBuf,
        stderr: String,
    },
}

impl OutputError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        OutputError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Output directory of one scope, `<base_dir>/<scope>/`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDir {
    root: PathBuf,
    scope: String,
}

impl OutputDir {
    /// Create the directory if needed
    pub fn create(base_dir: &Path, scope: &str) -> Result<Self, OutputError> {
        let root = base_dir.join(scope);
        fs::create_dir_all(&root).map_err(|e| OutputError::io(&root, e))?;
        Ok(Self {
            root,
            scope: scope.to_string(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// `<root>/<scope>.<suffix>`
    pub fn scoped_file(&self, suffix: &str) -> PathBuf {
        self.root.join(format!("{}.{}", self.scope, suffix))
    }

    /// `<root>/<name>`
    pub fn file(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}
