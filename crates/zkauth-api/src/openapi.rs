//! # OpenAPI Specification Assembly
//!
//! Collects the utoipa-documented routes into one OpenAPI document served
//! at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// OpenAPI document for the service.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "zkauth",
        description = "Zero-knowledge commitment authentication.\n\nClients register a SHA-256 commitment to a secret they never send, then log in with a Groth16 proof that they know a preimage of it. Circuit artifacts for client-side proving are published under `/zk/*`."
    ),
    paths(
        crate::routes::auth::register,
        crate::routes::auth::login,
        crate::routes::artifacts::program,
        crate::routes::artifacts::abi,
        crate::routes::artifacts::proving_key,
    ),
    components(
        schemas(
            crate::routes::auth::RegisterBody,
            crate::routes::auth::RegisterResponse,
            crate::routes::auth::LoginBody,
            crate::routes::auth::LoginResponse,
            crate::error::ErrorBody,
            crate::error::ErrorDetail,
        )
    ),
    tags(
        (name = "auth", description = "Registration and proof-based login"),
        (name = "artifacts", description = "Public circuit artifacts"),
    )
)]
pub struct ApiDoc;

/// Router serving `/openapi.json`.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
