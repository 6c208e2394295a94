//! Data source error types

use std::time::Duration;

/// Errors a [`DataSource`](crate::source::DataSource) can report for a fetch.
///
/// The engine never inspects these beyond logging and forwarding them to the
/// host: a failed fetch leaves the row cache untouched.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SourceError {
    /// The request never produced a response (connection refused, reset, ...).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The backend answered with an application-level failure.
    #[error("Status {code}: {message}")]
    Status {
        /// Status code reported by the backend.
        code: u16,
        /// Error message.
        message: String,
    },

    /// The source gave up waiting for the backend.
    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    /// The response could not be turned into rows.
    #[error("Decode error: {0}")]
    Decode(String),
}

impl SourceError {
    /// Creates a new transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Creates a new status error.
    pub fn status(code: u16, message: impl Into<String>) -> Self {
        Self::Status {
            code,
            message: message.into(),
        }
    }

    /// Creates a new decode error.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    /// Returns the status code if this is a status error.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Returns `true` if repeating the same fetch could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Status { code, .. } => matches!(code, 429 | 500 | 502 | 503 | 504),
            Self::Transport(_) => true,
            Self::Timeout(_) => true,
            Self::Decode(_) => false,
        }
    }
}
