//! Structured document loading (YAML / JSON)
//!
//! Every input file the tool reads goes through here so that "file not
//! found" and parse failures carry the offending path.

use serde::de::DeserializeOwned;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Errors raised while loading a structured document
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("File {0} not found")]
    NotFound(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Document format, chosen by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Json,
}

impl Format {
    /// `.json` files are JSON, everything else is YAML
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Format::Json,
            _ => Format::Yaml,
        }
    }
}

fn read_to_string(path: &Path) -> Result<String, DocumentError> {
    if !path.is_file() {
        return Err(DocumentError::NotFound(path.to_path_buf()));
    }
    fs::read_to_string(path).map_err(|source| DocumentError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse document contents in the given format
pub fn parse_str<T: DeserializeOwned>(
    contents: &str,
    format: Format,
    path: &Path,
) -> Result<T, DocumentError> {
    let parsed = match format {
        Format::Yaml => serde_yaml::from_str(contents).map_err(|e| e.to_string()),
        Format::Json => serde_json::from_str(contents).map_err(|e| e.to_string()),
    };
    parsed.map_err(|message| DocumentError::Parse {
        path: path.to_path_buf(),
        message,
    })
}

/// Load a YAML document
pub fn read_yaml<T: DeserializeOwned>(path: &Path) -> Result<T, DocumentError> {
    let contents = read_to_string(path)?;
    parse_str(&contents, Format::Yaml, path)
}

/// Load a YAML or JSON document depending on its extension
pub fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T, DocumentError> {
    let contents = read_to_string(path)?;
    parse_str(&contents, Format::from_path(path), path)
}

/// Deserialize helpers for scalars that users write either quoted or bare.
///
/// `id: 101` and `id: "101"` must both produce the string `"101"`. Floats are
/// rejected since their textual form cannot be recovered (`10.0` vs `10`).
pub(crate) mod scalar {
    use serde::de::{self, Deserializer, Visitor};
    use std::fmt;

    struct ScalarVisitor;

    impl<'de> Visitor<'de> for ScalarVisitor {
        type Value = String;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a string or an integer (quote values such as \"10.0\")")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_string<E: de::Error>(self, v: String) -> Result<String, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<String, E> {
            Ok(v.to_string())
        }
    }

    pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        d.deserialize_any(ScalarVisitor)
    }

    pub fn option<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        struct OptionVisitor;

        impl<'de> Visitor<'de> for OptionVisitor {
            type Value = Option<String>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an optional string or integer")
            }

            fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(None)
            }

            fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(None)
            }

            fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Self::Value, D::Error> {
                string(d).map(Some)
            }
        }

        d.deserialize_option(OptionVisitor)
    }
}
