//! # zkauth-api — HTTP Service
//!
//! Axum service exposing zero-knowledge commitment authentication.
//!
//! ## API Surface
//!
//! | Route                  | Module                  | Purpose                      |
//! |------------------------|-------------------------|------------------------------|
//! | `POST /register`       | [`routes::auth`]        | Bind a commitment to a name  |
//! | `POST /login`          | [`routes::auth`]        | Prove knowledge of a secret  |
//! | `GET /zk/*`            | [`routes::artifacts`]   | Public circuit artifacts     |
//! | `GET /openapi.json`    | [`openapi`]             | OpenAPI document             |
//! | `GET /metrics`         | this module             | Prometheus scrape            |
//! | `GET /health/*`        | this module             | Liveness and readiness       |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! Compression → TraceLayer → MetricsMiddleware → Handler
//! ```
//!
//! ## Crate Policy
//!
//! - No protocol logic in handlers; they validate shape and delegate to
//!   [`zkauth_auth::AuthEngine`].
//! - All errors map to structured HTTP responses via [`AppError`].

pub mod bootstrap;
pub mod db;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Router};
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;
use zkauth_auth::CommitmentStore;

use crate::middleware::metrics::ApiMetrics;

pub use error::AppError;
pub use state::{AppConfig, AppState};

/// Request body cap. Groth16 proofs and public inputs are a few KiB.
const BODY_LIMIT: usize = 256 * 1024;

/// Assemble the application router.
pub fn app(state: AppState) -> Router {
    let metrics = state.metrics.clone();

    let api = Router::new()
        .merge(routes::auth::router())
        .merge(routes::artifacts::router())
        .merge(openapi::router())
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(from_fn(middleware::metrics::metrics_middleware))
        .layer(Extension(metrics.clone()))
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone());

    let probes = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .route("/metrics", get(prometheus_metrics))
        .layer(Extension(metrics))
        .with_state(state);

    Router::new()
        .merge(probes)
        .merge(api)
        .layer(CompressionLayer::new())
}

/// GET /health/liveness — the process is up.
async fn liveness() -> &'static str {
    "ok"
}

/// GET /health/readiness — the commitment store answers.
///
/// Artifacts need no check: without them the service never starts.
async fn readiness(State(state): State<AppState>) -> Result<&'static str, AppError> {
    state.engine.store().count().await.map_err(|err| {
        tracing::warn!(error = %err, "readiness check failed");
        AppError::ServiceUnavailable("commitment store unavailable".to_string())
    })?;
    Ok("ready")
}

/// GET /metrics — Prometheus scrape; refreshes the user gauge first.
async fn prometheus_metrics(
    State(state): State<AppState>,
    Extension(metrics): Extension<ApiMetrics>,
) -> impl IntoResponse {
    match state.engine.store().count().await {
        Ok(n) => metrics
            .registered_users()
            .set(i64::try_from(n).unwrap_or(i64::MAX)),
        Err(err) => tracing::warn!(error = %err, "failed to count users for metrics"),
    }

    match metrics.gather_and_encode() {
        Ok(body) => (
            StatusCode::OK,
            [(
                axum::http::header::CONTENT_TYPE,
                "text/plain; version=0.0.4; charset=utf-8",
            )],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("failed to encode metrics: {e}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
