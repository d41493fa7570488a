//! # Error Hierarchy
//!
//! Validation errors for the domain primitives in this crate. Every variant
//! carries the offending input (or its size) so that a rejected request can
//! be diagnosed from the log line alone.

use thiserror::Error;

/// Validation errors for domain primitive newtypes and request shapes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A field element string is not a canonical decimal below the modulus.
    #[error("invalid field element \"{value}\": {reason}")]
    InvalidFieldElement {
        /// The string that failed to parse.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A commitment did not have exactly two elements.
    #[error("invalid commitment: expected exactly 2 field elements, got {0}")]
    CommitmentLength(usize),

    /// Fewer public inputs than needed to carry a commitment.
    #[error("public inputs must end with a 2-element commitment, got {0} element(s)")]
    InsufficientPublicInputs(usize),

    /// Username fails format validation.
    #[error("invalid username: {0}")]
    InvalidUsername(String),

    /// A secret does not fit the 512-bit circuit input.
    #[error("secret is {0} bytes; the circuit accepts at most 64")]
    SecretTooLong(usize),
}
