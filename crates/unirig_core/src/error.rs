//! Core error types for the UniRig API.

use std::fmt;

/// Core result type
pub type CoreResult<T> = Result<T, CoreError>;

/// Core error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Invalid JSON encoding
    InvalidEncoding {
        /// Decoder message
        message: String,
    },

    /// Invalid ID format
    InvalidId {
        /// Why the ID was rejected
        reason: String,
    },

    /// Invalid timestamp
    InvalidTimestamp {
        /// Why the timestamp was rejected
        reason: String,
    },
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEncoding { message } => write!(f, "Invalid encoding: {}", message),
            Self::InvalidId { reason } => write!(f, "Invalid ID: {}", reason),
            Self::InvalidTimestamp { reason } => write!(f, "Invalid timestamp: {}", reason),
        }
    }
}

impl std::error::Error for CoreError {}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidEncoding {
            message: err.to_string(),
        }
    }
}
