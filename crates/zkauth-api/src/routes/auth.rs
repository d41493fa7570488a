//! # Registration & Login Routes
//!
//! - `POST /register`: bind a commitment to a new username.
//! - `POST /login`: authenticate with a proof of knowledge of the secret
//!   behind the stored commitment.
//!
//! Handlers validate body shape and delegate to [`zkauth_auth::AuthEngine`].

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use zkauth_auth::{LoginRequest, LoginTimings, RegisterRequest, RegisterTimings};
use zkauth_core::{PublicInputs, COMMITMENT_LEN};

use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::state::AppState;

/// Assemble the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Registration body.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterBody {
    /// Account to create.
    pub username: String,
    /// Commitment as two decimal field-element strings.
    #[schema(example = json!(["2183429", "9912731"]))]
    pub stored_hash: Vec<String>,
    /// Optional client-side timings for the metric log.
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub metrics: Option<RegisterTimings>,
}

impl Validate for RegisterBody {
    fn validate(&self) -> Result<(), String> {
        if self.stored_hash.len() != COMMITMENT_LEN {
            return Err(format!(
                "stored_hash must have exactly {COMMITMENT_LEN} elements, got {}",
                self.stored_hash.len()
            ));
        }
        Ok(())
    }
}

/// Login body.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginBody {
    /// Account to log into.
    pub username: String,
    /// Proof object as produced by the client prover.
    #[schema(value_type = Object)]
    pub proof: serde_json::Value,
    /// Public inputs, possibly nested; the last two flattened elements are
    /// the claimed commitment.
    #[schema(value_type = Vec<Object>)]
    pub inputs: PublicInputs,
    /// Optional client-side timings for the metric log.
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub metrics: Option<LoginTimings>,
}

impl Validate for LoginBody {
    fn validate(&self) -> Result<(), String> {
        if self.proof.is_null() {
            return Err("proof is required".to_string());
        }
        Ok(())
    }
}

/// Successful registration.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegisterResponse {
    pub username: String,
    pub stored_hash: Vec<String>,
    pub message: String,
}

/// Successful login.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub username: String,
    /// `"Welcome back, <username>"`.
    pub message: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /register — Register a commitment.
#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterBody,
    responses(
        (status = 201, description = "Registered", body = RegisterResponse),
        (status = 400, description = "Malformed username or stored hash", body = crate::error::ErrorBody),
        (status = 409, description = "Username already registered", body = crate::error::ErrorBody),
    ),
    tag = "auth"
)]
pub(crate) async fn register(
    State(state): State<AppState>,
    body: Result<Json<RegisterBody>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let body = extract_validated_json(body)?;
    let request = RegisterRequest::parse(
        &body.username,
        &body.stored_hash,
        body.metrics.unwrap_or_default(),
    )?;

    let record = state.engine.register(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            username: record.username.to_string(),
            stored_hash: record.commitment.to_strings().to_vec(),
            message: "Registered".to_string(),
        }),
    ))
}

/// POST /login — Authenticate with a proof.
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginBody,
    responses(
        (status = 200, description = "Authenticated", body = LoginResponse),
        (status = 400, description = "Malformed body or public inputs", body = crate::error::ErrorBody),
        (status = 401, description = "Proof did not verify", body = crate::error::ErrorBody),
        (status = 403, description = "Claimed commitment differs from the stored one", body = crate::error::ErrorBody),
        (status = 404, description = "Unknown user", body = crate::error::ErrorBody),
    ),
    tag = "auth"
)]
pub(crate) async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginBody>, JsonRejection>,
) -> Result<Json<LoginResponse>, AppError> {
    let body = extract_validated_json(body)?;
    let request = LoginRequest::parse(
        &body.username,
        body.proof,
        body.inputs,
        body.metrics.unwrap_or_default(),
    )?;

    let outcome = state.engine.login(request).await?;

    Ok(Json(LoginResponse {
        message: outcome.welcome_message(),
        username: outcome.username.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_body_requires_two_elements() {
        let body: RegisterBody =
            serde_json::from_str(r#"{"username":"a","stored_hash":["1"]}"#).unwrap();
        assert!(body.validate().is_err());
        let body: RegisterBody =
            serde_json::from_str(r#"{"username":"a","stored_hash":["1","2"]}"#).unwrap();
        assert!(body.validate().is_ok());
        assert!(body.metrics.is_none());
    }

    #[test]
    fn register_body_reads_client_timings() {
        let body: RegisterBody = serde_json::from_str(
            r#"{"username":"a","stored_hash":["1","2"],
                "metrics":{"client_duration_ms":12.5,"client_start_ms":1000}}"#,
        )
        .unwrap();
        let timings = body.metrics.unwrap();
        assert_eq!(timings.client_duration_ms, Some(12.5));
        assert_eq!(timings.client_start_ms, Some(1000.0));
        assert_eq!(timings.client_end_ms, None);
    }

    #[test]
    fn login_body_requires_proof() {
        let body: LoginBody =
            serde_json::from_str(r#"{"username":"a","proof":null,"inputs":["1","2"]}"#).unwrap();
        assert!(body.validate().is_err());
    }

    #[test]
    fn login_body_accepts_nested_inputs() {
        let body: LoginBody = serde_json::from_str(
            r#"{"username":"a","proof":{"proof_hex":"00"},"inputs":[["1","2","3","4"],["5","6"]]}"#,
        )
        .unwrap();
        assert!(body.validate().is_ok());
        assert_eq!(body.inputs.flatten().len(), 6);
    }
}
