//! CLI-specific error types and mappings.
//!
//! Maps `CoreError` onto exit codes and user-facing messages.

use mlforge_core::{BackendError, CoreError};
use thiserror::Error;

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Core domain error.
    #[error("{0}")]
    Core(String),

    /// Invalid arguments or input files.
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    #[error("{0}")]
    NotFound(String),

    /// IO error (file not found, permission denied, etc.).
    #[error("IO error: {0}")]
    Io(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    /// The training engine could not be reached.
    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

impl CliError {
    /// Map error to appropriate exit code.
    ///
    /// Exit codes follow sysexits.h where one fits.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Core(_) => 1,
            Self::Arguments(_) => 2,    // EX_USAGE
            Self::NotFound(_) => 66,    // EX_NOINPUT
            Self::Unavailable(_) => 69, // EX_UNAVAILABLE
            Self::Database(_) => 73,    // EX_CANTCREAT (closest fit)
            Self::Io(_) => 74,          // EX_IOERR
            Self::Config(_) => 78,      // EX_CONFIG
        }
    }
}

impl From<&CoreError> for CliError {
    fn from(err: &CoreError) -> Self {
        let message = err.to_string();
        match err {
            CoreError::NotFound(_) => Self::NotFound(message),
            CoreError::Metadata(_) => Self::Database(message),
            CoreError::UnsupportedAlgorithm(_)
            | CoreError::InvalidHyperParameter { .. }
            | CoreError::InvalidInput(_)
            | CoreError::Validation(_) => Self::Arguments(message),
            CoreError::Storage(_) => Self::Io(message),
            CoreError::Settings(_) => Self::Config(message),
            CoreError::Backend(BackendError::Unavailable(_)) => Self::Unavailable(message),
            CoreError::DatasetPreparation(_)
            | CoreError::ModelNotReady(_)
            | CoreError::Backend(_)
            | CoreError::BuildRejected(_) => Self::Core(message),
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        Self::from(&err)
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Exit code for an error returned by a handler.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    if let Some(cli) = err.downcast_ref::<CliError>() {
        return cli.exit_code();
    }
    if let Some(core) = err.downcast_ref::<CoreError>() {
        return CliError::from(core).exit_code();
    }
    1
}
