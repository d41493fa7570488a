//! # Protocol Errors
//!
//! One variant per categorical outcome a registration or login can end in.
//! Messages are safe to show to the caller; backend detail stays in logs.

use thiserror::Error;
use zkauth_core::ValidationError;

/// Failure of a registration or login attempt.
#[derive(Error, Debug)]
pub enum AuthError {
    /// The request shape is malformed.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The username is already registered.
    #[error("user \"{0}\" already exists")]
    Conflict(String),

    /// The username is not registered.
    #[error("user \"{0}\" not found")]
    NotFound(String),

    /// The claimed commitment differs from the stored one.
    #[error("wrong credentials")]
    Credential,

    /// The proof did not verify.
    #[error("invalid proof")]
    Verification,

    /// Storage or scheduling failure.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Errors from a commitment store backend.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A record for this username already exists.
    #[error("user \"{0}\" already exists")]
    Conflict(String),

    /// The backend failed.
    #[error("store backend error: {0}")]
    Backend(String),

    /// A persisted record no longer parses.
    #[error("corrupt record for \"{username}\": {reason}")]
    Corrupt {
        /// Username of the bad row.
        username: String,
        /// Why it failed to parse.
        reason: String,
    },
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(username) => Self::Conflict(username),
            other => Self::Internal(other.to_string()),
        }
    }
}

/// Errors from the metrics sink.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// The metrics file could not be opened or written.
    #[error("metrics I/O failed at {}: {source}", .path.display())]
    Io {
        /// Metrics file path.
        path: std::path::PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A row could not be encoded as CSV.
    #[error("metrics row encoding failed: {0}")]
    Encode(#[from] csv::Error),
}
