//! Contest accounts
//!
//! Generates credentials for programming-contest infrastructure and renders
//! them into password sheets, YAML/TSV exports and OS provisioning files.
//! Three scopes are supported: individual contests, a multi-server CDS
//! deployment and an onsite challenge.

pub mod accounts;
pub mod config;
pub mod discovery;
pub mod document;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod validate;

pub use accounts::{Account, AccountKind, AccountRepository, PasswordSource};
pub use config::{Config, ConfigError};
pub use error::{Error, Result};
pub use pipeline::{Pipeline, ScopeReport};
pub use validate::{ValidationError, Validator};
