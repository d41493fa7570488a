//! # zkauth-auth — Registration and Login Protocols
//!
//! Binds stored commitments to proof verification.
//!
//! ## Modules
//!
//! - **Store** (`store.rs`): the `CommitmentStore` trait with create-once
//!   semantics and the in-memory backend.
//! - **Metrics** (`metrics.rs`): append-only CSV event log.
//! - **Engine** (`engine.rs`): `AuthEngine`, holding store, verifier, and sink.
//! - **Register** (`register.rs`) and **Login** (`login.rs`): the protocols.
//!
//! ## Outcomes
//!
//! Every attempt ends in exactly one category: success, or one of
//! [`AuthError`]'s variants. Callers map those to transport status codes;
//! nothing here retries.

pub mod engine;
pub mod error;
pub mod login;
pub mod metrics;
pub mod register;
pub mod store;

pub use engine::AuthEngine;
pub use error::{AuthError, MetricsError, StoreError};
pub use login::{LoginOutcome, LoginRequest};
pub use metrics::{EventKind, LoginTimings, MetricEvent, MetricsSink, RegisterTimings};
pub use register::RegisterRequest;
pub use store::{CommitmentStore, MemoryStore};
