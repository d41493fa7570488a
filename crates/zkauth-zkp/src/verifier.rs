//! # Commitment Verifier
//!
//! Object-safe view of "verify this opaque proof for this commitment", so
//! the login protocol can hold an `Arc<dyn CommitmentVerifier>` without
//! being generic over the proof system.

use serde::Deserialize;
use zkauth_core::Commitment;

use crate::traits::{ProofSystem, VerifyError};

/// Verifies opaque JSON proofs against a commitment.
pub trait CommitmentVerifier: Send + Sync {
    /// Scheme tag of the underlying proof system.
    fn scheme(&self) -> &'static str;

    /// Verify `proof` with `commitment` as the complete public-input vector.
    ///
    /// # Errors
    ///
    /// Returns [`VerifyError::MalformedProof`] if `proof` does not decode as
    /// a proof of this scheme.
    fn verify(&self, proof: &serde_json::Value, commitment: &Commitment)
        -> Result<bool, VerifyError>;
}

/// A proof system bound to one verification key.
#[derive(Clone)]
pub struct BundleVerifier<P: ProofSystem> {
    system: P,
    verifying_key: P::VerifyingKey,
}

impl<P: ProofSystem> BundleVerifier<P> {
    /// Bind `system` to `verifying_key`.
    pub fn new(system: P, verifying_key: P::VerifyingKey) -> Self {
        Self {
            system,
            verifying_key,
        }
    }
}

impl<P: ProofSystem> CommitmentVerifier for BundleVerifier<P> {
    fn scheme(&self) -> &'static str {
        self.system.scheme()
    }

    fn verify(
        &self,
        proof: &serde_json::Value,
        commitment: &Commitment,
    ) -> Result<bool, VerifyError> {
        let proof = P::Proof::deserialize(proof)
            .map_err(|e| VerifyError::MalformedProof(e.to_string()))?;
        self.system
            .verify(&self.verifying_key, &proof, commitment.elements())
    }
}
