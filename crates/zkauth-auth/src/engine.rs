//! # Authentication Engine
//!
//! Holds the three collaborators the protocols need: the commitment store,
//! a verifier bound to the startup verification key, and the metrics sink.
//! Built once during bootstrap and shared behind `Arc`; nothing in it is
//! mutated after construction.

use std::sync::Arc;

use zkauth_zkp::CommitmentVerifier;

use crate::metrics::{MetricEvent, MetricsSink};
use crate::store::CommitmentStore;

/// Registration and login over a store `S`.
pub struct AuthEngine<S> {
    pub(crate) store: S,
    pub(crate) verifier: Arc<dyn CommitmentVerifier>,
    metrics: Option<Arc<MetricsSink>>,
}

impl<S: CommitmentStore> AuthEngine<S> {
    /// Engine without a metrics sink.
    pub fn new(store: S, verifier: Arc<dyn CommitmentVerifier>) -> Self {
        Self {
            store,
            verifier,
            metrics: None,
        }
    }

    /// Attach a metrics sink.
    pub fn with_metrics(mut self, sink: Arc<MetricsSink>) -> Self {
        self.metrics = Some(sink);
        self
    }

    /// The commitment store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Scheme tag of the verifier in use.
    pub fn scheme(&self) -> &'static str {
        self.verifier.scheme()
    }

    /// Append an event. A failed write is logged and does not fail the
    /// request it describes.
    pub(crate) fn record_metric(&self, event: &MetricEvent) {
        if let Some(sink) = &self.metrics {
            if let Err(err) = sink.record(event) {
                tracing::warn!(error = %err, event = event.kind.as_str(), "failed to append metric");
            }
        }
    }
}

impl<S> std::fmt::Debug for AuthEngine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthEngine")
            .field("scheme", &self.verifier.scheme())
            .field("metrics", &self.metrics.as_ref().map(|m| m.path().to_path_buf()))
            .finish()
    }
}
