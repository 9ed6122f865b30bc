//! Error types for the osdi adaptor ecosystem.

use thiserror::Error;

/// Errors that can occur while translating or syncing events.
#[derive(Error, Debug)]
pub enum OsdiError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Upstream request failed (status {status}): {body}")]
    Upstream { status: u16, body: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Unexpected upstream response: {0}")]
    MalformedResponse(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl OsdiError {
    /// True when the remote store answered 404 for the requested resource.
    pub fn is_not_found(&self) -> bool {
        matches!(self, OsdiError::Upstream { status: 404, .. })
    }
}

/// Result type alias for osdi operations.
pub type OsdiResult<T> = Result<T, OsdiError>;
