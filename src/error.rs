//! PromptEnhancer Error Types
//!
//! Centralized error handling. Every failure is caught at the boundary
//! nearest its origin and turned into a user-facing notice; these types
//! carry the reason up to that boundary.

use thiserror::Error;

/// Central error type for PromptEnhancer
#[derive(Error, Debug)]
pub enum EnhancerError {
    #[error("Relay error: {0}")]
    Relay(#[from] RelayError),

    #[error("Document error: {0}")]
    Mutation(#[from] DocumentError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Lock poisoned: {0}")]
    Lock(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for PromptEnhancer operations
pub type EnhancerResult<T> = Result<T, EnhancerError>;

/// Helper to convert Mutex poison errors
impl<T> From<std::sync::PoisonError<T>> for EnhancerError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        EnhancerError::Lock(err.to_string())
    }
}

/// Failures reported by a relay transport.
///
/// The `Display` text is what ends up in "Enhancement failed: ..." notices.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RelayError {
    #[error("Extension is disabled")]
    Disabled,

    #[error("HTTP error! status: {0}")]
    Http(u16),

    #[error("{0}")]
    Transport(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Error string handed back by the far side of the relay
    #[error("{0}")]
    Remote(String),

    #[error("No response from background")]
    NoResponse,

    #[error("Request timed out")]
    Timeout,
}

impl From<reqwest::Error> for RelayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RelayError::Timeout
        } else if err.is_decode() {
            RelayError::MalformedResponse(err.to_string())
        } else {
            RelayError::Transport(err.to_string())
        }
    }
}

/// Failures raised by the host document while mutating it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    #[error("range is detached from the document")]
    Detached,

    #[error("insertion rejected by the document")]
    InsertionRejected,

    #[error("no caret or selection to insert at")]
    NoCaret,

    #[error("highlighting is not supported here")]
    HighlightUnsupported,
}
