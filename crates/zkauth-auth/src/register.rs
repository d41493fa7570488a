//! # Registration Protocol
//!
//! ```text
//! validate shape → create-once insert → register metric
//! ```
//!
//! Registration is create-once: a second registration for a username fails
//! with [`AuthError::Conflict`] whether or not the commitment differs, and
//! the stored record is never replaced. Nothing cryptographic happens here;
//! the commitment is trusted to be the hash of a real secret.

use chrono::Utc;
use zkauth_core::{Commitment, UserRecord, Username, ValidationError};

use crate::engine::AuthEngine;
use crate::error::AuthError;
use crate::metrics::{MetricEvent, RegisterTimings};
use crate::store::CommitmentStore;

/// A shape-checked registration.
#[derive(Debug, Clone, PartialEq)]
pub struct RegisterRequest {
    /// Account to create.
    pub username: Username,
    /// Commitment to bind to it.
    pub commitment: Commitment,
    /// Client timings for the metric row.
    pub timings: RegisterTimings,
}

impl RegisterRequest {
    /// Validate raw request fields.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] for a bad username, a commitment that is
    /// not exactly two elements, or an element that is not a field element.
    pub fn parse<S: AsRef<str>>(
        username: &str,
        stored_hash: &[S],
        timings: RegisterTimings,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            username: Username::new(username)?,
            commitment: Commitment::from_strings(stored_hash)?,
            timings,
        })
    }
}

impl<S: CommitmentStore> AuthEngine<S> {
    /// Register a commitment for a new username.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Conflict`] if the username is taken.
    /// - [`AuthError::Internal`] if the store fails.
    pub async fn register(&self, request: RegisterRequest) -> Result<UserRecord, AuthError> {
        let started = Utc::now();
        let record = UserRecord::new(request.username, request.commitment);

        if let Err(err) = self.store.create(record.clone()).await {
            tracing::info!(username = %record.username, error = %err, "registration refused");
            return Err(err.into());
        }

        self.record_metric(&MetricEvent::register(
            &record.username,
            &record.commitment,
            started,
            Utc::now(),
            &request.timings,
        ));
        tracing::info!(username = %record.username, "registered commitment");
        Ok(record)
    }
}
