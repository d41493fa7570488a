//! # Username Newtype
//!
//! The account identifier a commitment is registered under. Validated at
//! construction so every downstream consumer (store keys, metric rows,
//! log fields) can treat it as a well-formed single-line string.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ValidationError;

/// Maximum username length in bytes.
pub const MAX_USERNAME_BYTES: usize = 64;

/// A validated account username.
///
/// # Validation
///
/// - Non-empty after trimming whitespace
/// - At most [`MAX_USERNAME_BYTES`] bytes
/// - No control characters (keeps metric rows single-line)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Username(String);

impl Username {
    /// Create a username, validating format.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidUsername`] describing the violated rule.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        if s.trim().is_empty() {
            return Err(ValidationError::InvalidUsername(
                "must not be empty".to_string(),
            ));
        }
        if s.len() > MAX_USERNAME_BYTES {
            return Err(ValidationError::InvalidUsername(format!(
                "must be at most {MAX_USERNAME_BYTES} bytes, got {}",
                s.len()
            )));
        }
        if s.chars().any(char::is_control) {
            return Err(ValidationError::InvalidUsername(
                "must not contain control characters".to_string(),
            ));
        }
        Ok(Self(s))
    }

    /// Access the username string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Username {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Username {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}
