//! # User Record
//!
//! The unit persisted by the commitment store: a username bound to the
//! commitment it registered with. Records are created once and never
//! mutated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::field::Commitment;
use crate::identity::Username;

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Unique account identifier.
    pub username: Username,
    /// Hash commitment of the user's secret.
    pub commitment: Commitment,
    /// Registration time (UTC).
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    /// Create a record stamped with the current time.
    pub fn new(username: Username, commitment: Commitment) -> Self {
        Self {
            username,
            commitment,
            created_at: Utc::now(),
        }
    }
}
