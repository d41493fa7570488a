//! # Service Bootstrap
//!
//! Everything that must succeed before the first request is accepted.
//!
//! ## Bootstrap Sequence
//!
//! 1. **Commitment store**: open SQLite when `DATABASE_URL` is set,
//!    otherwise an in-memory map.
//! 2. **Artifacts**: reuse the persisted bundle or compile, run setup, and
//!    persist a new one (on the blocking pool; Groth16 setup takes seconds).
//! 3. **Metrics sink**: open the CSV log, writing the header if new.
//! 4. **State**: bind the engine to the bundle's verification key.
//!
//! Any failure aborts startup. The service never serves with a partial or
//! missing bundle.

use std::sync::Arc;

use zkauth_auth::{AuthEngine, MemoryStore, MetricsError, MetricsSink};
use zkauth_zkp::{
    ArtifactError, ArtifactManager, CommitmentVerifier, Groth16ProofSystem, MockProofSystem,
    ProofSystem, PublishedArtifacts,
};

use crate::middleware::metrics::ApiMetrics;
use crate::state::{AppConfig, AppState, ProofBackend, UserStore};

/// Errors during bootstrap.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    /// Database connection or migration failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Artifacts could not be loaded or generated.
    #[error("artifact error: {0}")]
    Artifacts(#[from] ArtifactError),

    /// Metrics log could not be opened.
    #[error("metrics sink error: {0}")]
    Metrics(#[from] MetricsError),

    /// Request metrics registry could not be built.
    #[error("request metrics error: {0}")]
    RequestMetrics(#[from] prometheus::Error),

    /// The artifact task panicked or was cancelled.
    #[error("artifact task failed: {0}")]
    Task(String),
}

/// Verifier plus the public files, from one artifact bundle.
pub struct PreparedArtifacts {
    pub verifier: Arc<dyn CommitmentVerifier>,
    pub published: PublishedArtifacts,
}

impl std::fmt::Debug for PreparedArtifacts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreparedArtifacts")
            .field("scheme", &self.verifier.scheme())
            .field("program_bytes", &self.published.program.len())
            .field("proving_key_bytes", &self.published.proving_key.len())
            .finish()
    }
}

/// Load or generate the bundle for `system`.
fn prepare_with<P: ProofSystem + Clone>(
    system: P,
    config: &AppConfig,
) -> Result<PreparedArtifacts, ArtifactError> {
    let manager = ArtifactManager::new(system, &config.artifact_dir, &config.key_dir);
    let bundle = manager.initialize(config.regenerate)?;
    Ok(PreparedArtifacts {
        verifier: Arc::new(manager.verifier(&bundle)),
        published: bundle.published().clone(),
    })
}

/// Load or generate artifacts for the configured backend.
///
/// Blocking; call from the blocking pool.
pub fn prepare_artifacts(config: &AppConfig) -> Result<PreparedArtifacts, ArtifactError> {
    match config.backend {
        ProofBackend::Groth16 => prepare_with(Groth16ProofSystem, config),
        ProofBackend::Mock => {
            tracing::warn!("ZK_BACKEND=mock: proofs are not zero-knowledge and not sound");
            prepare_with(MockProofSystem::default(), config)
        }
    }
}

/// Open the configured commitment store.
pub async fn open_store(config: &AppConfig) -> Result<UserStore, BootstrapError> {
    Ok(match crate::db::init_pool(config.database_url.as_deref()).await? {
        Some(pool) => UserStore::Sqlite(pool),
        None => UserStore::Memory(MemoryStore::new()),
    })
}

/// Run the full bootstrap sequence.
pub async fn bootstrap(config: AppConfig) -> Result<AppState, BootstrapError> {
    let store = open_store(&config).await?;

    let artifacts_config = config.clone();
    let prepared = tokio::task::spawn_blocking(move || prepare_artifacts(&artifacts_config))
        .await
        .map_err(|e| BootstrapError::Task(e.to_string()))??;

    let sink = MetricsSink::open(&config.metrics_file)?;
    let engine = AuthEngine::new(store, prepared.verifier).with_metrics(Arc::new(sink));

    tracing::info!(
        scheme = engine.scheme(),
        store = engine.store().kind(),
        artifact_dir = %config.artifact_dir.display(),
        metrics_file = %config.metrics_file.display(),
        "bootstrap complete"
    );

    Ok(AppState::new(
        engine,
        prepared.published,
        ApiMetrics::new()?,
        config,
    ))
}
