//! # Login Protocol
//!
//! ```text
//! received ─► lookup ─► inputs-checked ─┬─► rejected-by-precheck
//!                                       └─► verifying ─┬─► accepted
//!                                                      └─► rejected
//! ```
//!
//! 1. Look up the stored commitment; unknown users fail with
//!    [`AuthError::NotFound`].
//! 2. Flatten the public inputs; the last two elements are the claimed
//!    commitment.
//! 3. Compare claimed and stored commitments in constant time. A mismatch
//!    fails with [`AuthError::Credential`] and the verifier is never called.
//! 4. Verify the proof on the blocking pool with the pre-checked commitment
//!    as the full public-input vector. The statement checked in step 3 is
//!    therefore exactly the statement the proof is verified against.
//! 5. Record `login-success` or `login-invalid`.
//!
//! Attempts are never retried; a rejected proof is a terminal outcome.

use std::sync::Arc;

use chrono::Utc;
use zkauth_core::{PublicInputs, Username, ValidationError};

use crate::engine::AuthEngine;
use crate::error::AuthError;
use crate::metrics::{LoginTimings, MetricEvent};
use crate::store::CommitmentStore;

/// A login attempt.
#[derive(Debug, Clone)]
pub struct LoginRequest {
    /// Account to log into.
    pub username: Username,
    /// Opaque proof, forwarded to the verifier.
    pub proof: serde_json::Value,
    /// Public inputs as sent by the client (possibly nested).
    pub inputs: PublicInputs,
    /// Client timings for the metric row.
    pub timings: LoginTimings,
}

impl LoginRequest {
    /// Validate raw request fields.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidUsername`] for a bad username.
    pub fn parse(
        username: &str,
        proof: serde_json::Value,
        inputs: PublicInputs,
        timings: LoginTimings,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            username: Username::new(username)?,
            proof,
            inputs,
            timings,
        })
    }
}

/// A successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    /// The authenticated user.
    pub username: Username,
}

impl LoginOutcome {
    /// Display message for the client.
    pub fn welcome_message(&self) -> String {
        format!("Welcome back, {}", self.username)
    }
}

impl<S: CommitmentStore> AuthEngine<S> {
    /// Authenticate a login attempt.
    ///
    /// # Errors
    ///
    /// - [`AuthError::NotFound`] for an unknown username.
    /// - [`AuthError::Validation`] if the inputs do not end in a commitment.
    /// - [`AuthError::Credential`] if the claimed commitment is not the
    ///   stored one.
    /// - [`AuthError::Verification`] if the proof is malformed or invalid.
    /// - [`AuthError::Internal`] on store or scheduling failure.
    pub async fn login(&self, request: LoginRequest) -> Result<LoginOutcome, AuthError> {
        let started = Utc::now();
        let username = request.username;

        let record = self
            .store
            .get(&username)
            .await?
            .ok_or_else(|| AuthError::NotFound(username.to_string()))?;

        let claimed = request.inputs.claimed_commitment()?;
        if !claimed.ct_eq(&record.commitment) {
            tracing::info!(username = %username, "login rejected by commitment pre-check");
            return Err(AuthError::Credential);
        }

        let verifier = Arc::clone(&self.verifier);
        let proof = request.proof;
        let verdict = tokio::task::spawn_blocking(move || verifier.verify(&proof, &claimed))
            .await
            .map_err(|e| AuthError::Internal(format!("verification task failed: {e}")))?;

        let accepted = match verdict {
            Ok(valid) => valid,
            Err(err) => {
                tracing::info!(username = %username, error = %err, "proof could not be evaluated");
                false
            }
        };

        self.record_metric(&MetricEvent::login(
            &username,
            accepted,
            started,
            Utc::now(),
            &request.timings,
        ));

        if accepted {
            tracing::info!(username = %username, "login accepted");
            Ok(LoginOutcome { username })
        } else {
            tracing::info!(username = %username, "login rejected: invalid proof");
            Err(AuthError::Verification)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn welcome_message_names_user() {
        let outcome = LoginOutcome {
            username: Username::new("alice").unwrap(),
        };
        assert_eq!(outcome.welcome_message(), "Welcome back, alice");
    }

    #[test]
    fn parse_validates_username() {
        let inputs: PublicInputs = serde_json::from_str(r#"["1","2"]"#).unwrap();
        assert!(LoginRequest::parse(
            "bob",
            serde_json::json!({}),
            inputs.clone(),
            LoginTimings::default()
        )
        .is_ok());
        assert!(LoginRequest::parse(
            "bad\nname",
            serde_json::json!({}),
            inputs,
            LoginTimings::default()
        )
        .is_err());
    }
}
