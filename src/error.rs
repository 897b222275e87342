//! Top-level error type and process exit codes

use crate::accounts::AccountError;
use crate::config::ConfigError;
use crate::output::OutputError;
use crate::validate::ValidationError;

/// Exit code for configuration and validation failures
pub const EXIT_CONFIG: i32 = 1;
/// Exit code for inconsistent account data
pub const EXIT_DATA: i32 = 2;
/// Exit code for failures while writing artifacts
pub const EXIT_OUTPUT: i32 = 3;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Accounts(#[from] AccountError),

    #[error(transparent)]
    Output(#[from] OutputError),

    #[error(transparent)]
    Passphrase(#[from] contest_passphrase::PassphraseError),
}

impl Error {
    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Config(_) | Error::Validation(_) | Error::Passphrase(_) => EXIT_CONFIG,
            Error::Accounts(e) if e.is_integrity() => EXIT_DATA,
            Error::Accounts(_) => EXIT_CONFIG,
            Error::Output(_) => EXIT_OUTPUT,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
