//! # Public Artifact Routes
//!
//! Browser clients fetch what they need to prove:
//!
//! - `GET /zk/out`: compiled program (`application/octet-stream`)
//! - `GET /zk/abi.json`: ABI descriptor (`application/json`)
//! - `GET /zk/proving.key`: proving key (`application/octet-stream`)
//!
//! Responses are the persisted bytes, unchanged, with
//! `Access-Control-Allow-Origin: *`. The verification key has no route.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderValue, Method};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use zkauth_zkp::artifacts::{ABI_FILE, PROGRAM_FILE, PROVING_KEY_FILE};

use crate::state::AppState;

const OCTET_STREAM: &str = "application/octet-stream";
const JSON: &str = "application/json";

/// Assemble the artifact router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(&format!("/zk/{PROGRAM_FILE}"), get(program))
        .route(&format!("/zk/{ABI_FILE}"), get(abi))
        .route(&format!("/zk/{PROVING_KEY_FILE}"), get(proving_key))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET]),
        )
}

fn artifact(content_type: &'static str, bytes: &[u8]) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, HeaderValue::from_static(content_type))],
        Bytes::copy_from_slice(bytes),
    )
}

/// GET /zk/out — Compiled program.
#[utoipa::path(
    get,
    path = "/zk/out",
    responses((status = 200, description = "Compiled program", content_type = "application/octet-stream")),
    tag = "artifacts"
)]
pub(crate) async fn program(State(state): State<AppState>) -> impl IntoResponse {
    artifact(OCTET_STREAM, &state.artifacts.program)
}

/// GET /zk/abi.json — ABI descriptor.
#[utoipa::path(
    get,
    path = "/zk/abi.json",
    responses((status = 200, description = "ABI descriptor", content_type = "application/json")),
    tag = "artifacts"
)]
pub(crate) async fn abi(State(state): State<AppState>) -> impl IntoResponse {
    artifact(JSON, &state.artifacts.abi_json)
}

/// GET /zk/proving.key — Proving key.
#[utoipa::path(
    get,
    path = "/zk/proving.key",
    responses((status = 200, description = "Proving key", content_type = "application/octet-stream")),
    tag = "artifacts"
)]
pub(crate) async fn proving_key(State(state): State<AppState>) -> impl IntoResponse {
    artifact(OCTET_STREAM, &state.artifacts.proving_key)
}
