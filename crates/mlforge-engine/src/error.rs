//! Transport-level errors and their mapping onto [`BackendError`].

use thiserror::Error;

use mlforge_core::ports::BackendError;

/// Errors from talking to the engine over HTTP.
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    /// The request never completed (connection refused, reset, timed out).
    #[error("Engine request to {url} failed: {message}")]
    Network { url: String, message: String },

    /// The engine answered with a non-success status.
    #[error("Engine returned {status} for {url}: {message}")]
    Status {
        status: u16,
        url: String,
        message: String,
    },

    #[error("Invalid engine response: {0}")]
    InvalidResponse(String),

    #[error("Invalid engine URL: {0}")]
    InvalidUrl(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    /// Map onto the port error. A status the engine uses to reject the work
    /// itself is reported through `rejected`.
    pub(crate) fn into_backend(self, rejected: fn(String) -> BackendError) -> BackendError {
        match self {
            Self::Network { .. } | Self::InvalidUrl(_) => BackendError::Unavailable(self.to_string()),
            Self::Status { status: 503, .. } => BackendError::Unavailable(self.to_string()),
            Self::Status { message, .. } => rejected(message),
            Self::InvalidResponse(message) => BackendError::Protocol(message),
        }
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}
