//! HTML to PDF conversion
//!
//! Rendering shells out to `wkhtmltopdf`, feeding the HTML on stdin.

use std::ffi::OsString;
use std::fmt;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use super::OutputError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orientation::Portrait => write!(f, "Portrait"),
            Orientation::Landscape => write!(f, "Landscape"),
        }
    }
}

/// Physical page of a rendered document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSetup {
    pub page_size: String,
    pub orientation: Orientation,
}

impl PageSetup {
    pub fn portrait(page_size: &str) -> Self {
        Self {
            page_size: page_size.to_string(),
            orientation: Orientation::Portrait,
        }
    }

    pub fn landscape(page_size: &str) -> Self {
        Self {
            page_size: page_size.to_string(),
            orientation: Orientation::Landscape,
        }
    }
}

/// Converts rendered HTML into a PDF file
pub trait PdfRenderer {
    fn render(&self, html: &str, output: &Path, page: &PageSetup) -> Result<(), OutputError>;
}

/// Command-line arguments for one conversion, reading HTML from stdin
pub fn wkhtmltopdf_args(output: &Path, page: &PageSetup) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "--quiet".into(),
        "--page-size".into(),
        page.page_size.clone().into(),
        "--orientation".into(),
        page.orientation.to_string().into(),
        "--encoding".into(),
        "UTF-8".into(),
        "--no-outline".into(),
        "--enable-local-file-access".into(),
        "-".into(),
    ];
    args.push(output.as_os_str().to_os_string());
    args
}

/// The `wkhtmltopdf` binary
#[derive(Debug, Clone)]
pub struct Wkhtmltopdf {
    program: PathBuf,
}

impl Default for Wkhtmltopdf {
    fn default() -> Self {
        Self {
            program: PathBuf::from("wkhtmltopdf"),
        }
    }
}

impl Wkhtmltopdf {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn name(&self) -> String {
        self.program.display().to_string()
    }
}

impl PdfRenderer for Wkhtmltopdf {
    fn render(&self, html: &str, output: &Path, page: &PageSetup) -> Result<(), OutputError> {
        let args = wkhtmltopdf_args(output, page);
        tracing::debug!(program = %self.name(), ?args, "converting HTML to PDF");

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| OutputError::RendererSpawn {
                program: self.name(),
                source: e,
            })?;

        // A converter that dies early closes the pipe; its exit status says why
        if let Some(mut stdin) = child.stdin.take() {
            match stdin.write_all(html.as_bytes()) {
                Err(e) if e.kind() != ErrorKind::BrokenPipe => {
                    return Err(OutputError::RendererSpawn {
                        program: self.name(),
                        source: e,
                    });
                }
                _ => {}
            }
        }

        let result = child.wait_with_output().map_err(|e| OutputError::RendererSpawn {
            program: self.name(),
            source: e,
        })?;

        if !result.status.success() {
            return Err(OutputError::RendererFailed {
                program: self.name(),
                status: result.status.to_string(),
                path: output.to_path_buf(),
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}
