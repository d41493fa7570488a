//! # Application State
//!
//! Configuration read once at startup, the commitment store backend, and the
//! shared state handed to every handler.
//!
//! Everything in [`AppState`] is built during bootstrap and never mutated
//! afterwards; handlers only read it.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use sqlx::SqlitePool;
use zkauth_auth::{AuthEngine, CommitmentStore, MemoryStore, StoreError};
use zkauth_core::{UserRecord, Username};
use zkauth_zkp::PublishedArtifacts;

use crate::middleware::metrics::ApiMetrics;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Which proof system backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProofBackend {
    /// Groth16 over BN254.
    #[default]
    Groth16,
    /// Deterministic mock; no soundness, development only.
    Mock,
}

impl FromStr for ProofBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "groth16" | "g16" => Ok(Self::Groth16),
            "mock" => Ok(Self::Mock),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }
}

/// Invalid environment configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// `PORT` is not a valid port number.
    #[error("invalid PORT value: {0}")]
    InvalidPort(String),

    /// `ZK_BACKEND` names no known proof system.
    #[error("unknown ZK_BACKEND \"{0}\" (expected groth16 or mock)")]
    UnknownBackend(String),
}

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Directory holding the public artifacts (program, ABI, proving key).
    pub artifact_dir: PathBuf,
    /// Directory holding the verification key.
    pub key_dir: PathBuf,
    /// CSV metrics log.
    pub metrics_file: PathBuf,
    /// SQLite URL; `None` keeps users in memory.
    pub database_url: Option<String>,
    /// Discard persisted artifacts and run setup again.
    pub regenerate: bool,
    /// Proof system to use.
    pub backend: ProofBackend,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            artifact_dir: PathBuf::from("zk"),
            key_dir: PathBuf::from("keys"),
            metrics_file: PathBuf::from("metrics/auth_metrics.csv"),
            database_url: None,
            regenerate: false,
            backend: ProofBackend::default(),
        }
    }
}

impl AppConfig {
    /// Read configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for an unparseable `PORT` or `ZK_BACKEND`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`; unset or empty values fall back
    /// to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let port = match get("PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPort(raw))?,
            None => defaults.port,
        };
        let backend = match get("ZK_BACKEND") {
            Some(raw) => raw.parse()?,
            None => defaults.backend,
        };
        let regenerate = get("ZK_REGENERATE")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            port,
            artifact_dir: get("ZK_ARTIFACT_DIR").map_or(defaults.artifact_dir, PathBuf::from),
            key_dir: get("ZK_KEY_DIR").map_or(defaults.key_dir, PathBuf::from),
            metrics_file: get("METRICS_FILE").map_or(defaults.metrics_file, PathBuf::from),
            database_url: get("DATABASE_URL"),
            regenerate,
            backend,
        })
    }
}

// ---------------------------------------------------------------------------
// Store backend
// ---------------------------------------------------------------------------

/// The commitment store the service runs on.
#[derive(Debug, Clone)]
pub enum UserStore {
    /// Process-local map; lost on restart.
    Memory(MemoryStore),
    /// SQLite `users` table.
    Sqlite(SqlitePool),
}

impl UserStore {
    /// Backend name for logs and probes.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Memory(_) => "memory",
            Self::Sqlite(_) => "sqlite",
        }
    }
}

fn backend_error(err: sqlx::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}

impl CommitmentStore for UserStore {
    async fn create(&self, record: UserRecord) -> Result<(), StoreError> {
        match self {
            Self::Memory(store) => store.create(record).await,
            Self::Sqlite(pool) => {
                if crate::db::users::insert(pool, &record)
                    .await
                    .map_err(backend_error)?
                {
                    Ok(())
                } else {
                    Err(StoreError::Conflict(record.username.to_string()))
                }
            }
        }
    }

    async fn get(&self, username: &Username) -> Result<Option<UserRecord>, StoreError> {
        match self {
            Self::Memory(store) => store.get(username).await,
            Self::Sqlite(pool) => crate::db::users::get_by_username(pool, username)
                .await
                .map_err(backend_error)?
                .map(crate::db::users::UserRow::into_record)
                .transpose(),
        }
    }

    async fn count(&self) -> Result<u64, StoreError> {
        match self {
            Self::Memory(store) => store.count().await,
            Self::Sqlite(pool) => crate::db::users::count(pool).await.map_err(backend_error),
        }
    }
}

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// State shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Registration and login.
    pub engine: Arc<AuthEngine<UserStore>>,
    /// Public artifact bytes, served verbatim.
    pub artifacts: Arc<PublishedArtifacts>,
    /// HTTP request metrics.
    pub metrics: ApiMetrics,
    /// Configuration the service started with.
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Assemble state from bootstrapped parts.
    pub fn new(
        engine: AuthEngine<UserStore>,
        artifacts: PublishedArtifacts,
        metrics: ApiMetrics,
        config: AppConfig,
    ) -> Self {
        Self {
            engine: Arc::new(engine),
            artifacts: Arc::new(artifacts),
            metrics,
            config: Arc::new(config),
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("engine", &self.engine)
            .field("store", &self.engine.store().kind())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.port, 5000);
        assert_eq!(config.metrics_file, PathBuf::from("metrics/auth_metrics.csv"));
        assert!(config.database_url.is_none());
    }

    #[test]
    fn reads_every_variable() {
        let config = AppConfig::from_lookup(lookup(&[
            ("PORT", "8081"),
            ("ZK_ARTIFACT_DIR", "/srv/zk"),
            ("ZK_KEY_DIR", "/srv/keys"),
            ("METRICS_FILE", "/var/log/auth.csv"),
            ("DATABASE_URL", "sqlite://users.db"),
            ("ZK_REGENERATE", "true"),
            ("ZK_BACKEND", "mock"),
        ]))
        .unwrap();
        assert_eq!(config.port, 8081);
        assert_eq!(config.artifact_dir, PathBuf::from("/srv/zk"));
        assert_eq!(config.key_dir, PathBuf::from("/srv/keys"));
        assert_eq!(config.metrics_file, PathBuf::from("/var/log/auth.csv"));
        assert_eq!(config.database_url.as_deref(), Some("sqlite://users.db"));
        assert!(config.regenerate);
        assert_eq!(config.backend, ProofBackend::Mock);
    }

    #[test]
    fn empty_values_fall_back() {
        let config =
            AppConfig::from_lookup(lookup(&[("PORT", ""), ("DATABASE_URL", "  ")])).unwrap();
        assert_eq!(config.port, 5000);
        assert!(config.database_url.is_none());
    }

    #[test]
    fn rejects_bad_port_and_backend() {
        assert!(matches!(
            AppConfig::from_lookup(lookup(&[("PORT", "http")])),
            Err(ConfigError::InvalidPort(_))
        ));
        assert!(matches!(
            AppConfig::from_lookup(lookup(&[("ZK_BACKEND", "plonk")])),
            Err(ConfigError::UnknownBackend(_))
        ));
    }

    #[test]
    fn regenerate_flag_values() {
        for (raw, expected) in [("1", true), ("YES", true), ("0", false), ("no", false)] {
            let config = AppConfig::from_lookup(lookup(&[("ZK_REGENERATE", raw)])).unwrap();
            assert_eq!(config.regenerate, expected, "ZK_REGENERATE={raw}");
        }
    }
}
