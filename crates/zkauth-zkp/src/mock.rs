//! # Mock Proof System
//!
//! A deterministic, transparent stand-in for the Groth16 backend. Proofs are
//! SHA-256 digests binding the setup's key id to the public commitment; they
//! provide no zero-knowledge and no soundness against anyone who can read
//! the verifying key.
//!
//! Used by protocol and HTTP tests, and by `ZK_BACKEND=mock` for local
//! development where a multi-second trusted setup is in the way.
//!
//! ## Test hooks
//!
//! - [`MockProofSystem::with_verdict`] pins every `verify` outcome.
//! - [`MockProofSystem::verify_calls`] counts `verify` invocations across
//!   clones, so a test can assert that a pre-check short-circuited.
//!
//! ## Security Notice
//!
//! Never select this backend for a deployment that authenticates real users.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use zkauth_core::{FieldElement, COMMITMENT_LEN};

use crate::circuit::{Abi, CircuitContract, CommitmentWitness};
use crate::traits::{
    CircuitError, CompiledProgram, KeyEncodingError, ProofError, ProofSystem, SetupError,
    VerifyError,
};

/// Scheme tag carried in ABI and proofs.
pub const SCHEME: &str = "mock";

const PROGRAM_MAGIC: &[u8; 4] = b"ZKMK";
const PROOF_DOMAIN: &[u8] = b"zkauth-mock-proof-v1\0";
const KEY_ID_LEN: usize = 32;

/// A mock proof: 64 lowercase hex characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockProof {
    /// Hex-encoded SHA-256 digest.
    pub proof_hex: String,
}

/// Mock proving key: the setup run's random id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockProvingKey {
    key_id: [u8; KEY_ID_LEN],
}

/// Mock verifying key: the same id as its proving key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockVerifyingKey {
    key_id: [u8; KEY_ID_LEN],
}

/// Deterministic mock backend.
#[derive(Debug, Clone, Default)]
pub struct MockProofSystem {
    forced: Option<bool>,
    verify_calls: Arc<AtomicU64>,
}

impl MockProofSystem {
    /// A mock whose `verify` always returns `verdict` for well-formed proofs.
    pub fn with_verdict(verdict: bool) -> Self {
        Self {
            forced: Some(verdict),
            verify_calls: Arc::default(),
        }
    }

    /// Number of `verify` calls made through this instance or its clones.
    pub fn verify_calls(&self) -> u64 {
        self.verify_calls.load(Ordering::SeqCst)
    }

    fn proof_digest(key_id: &[u8; KEY_ID_LEN], public_inputs: &[FieldElement]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(PROOF_DOMAIN);
        hasher.update(key_id);
        for input in public_inputs {
            hasher.update(input.to_be_bytes());
        }
        hex::encode(hasher.finalize())
    }
}

fn decode_key_id(bytes: &[u8]) -> Result<[u8; KEY_ID_LEN], KeyEncodingError> {
    bytes.try_into().map_err(|_| {
        KeyEncodingError(format!(
            "mock key must be {KEY_ID_LEN} bytes, got {}",
            bytes.len()
        ))
    })
}

fn is_digest_hex(s: &str) -> bool {
    s.len() == 64 && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

impl ProofSystem for MockProofSystem {
    type Proof = MockProof;
    type VerifyingKey = MockVerifyingKey;
    type ProvingKey = MockProvingKey;

    fn scheme(&self) -> &'static str {
        SCHEME
    }

    fn compile(&self, contract: &CircuitContract) -> Result<CompiledProgram, CircuitError> {
        contract.validate()?;
        let descriptor =
            serde_json::to_vec(contract).map_err(|e| CircuitError::Synthesis(e.to_string()))?;
        let mut program = Vec::with_capacity(8 + descriptor.len());
        program.extend_from_slice(PROGRAM_MAGIC);
        program.extend_from_slice(&contract.version.to_le_bytes());
        program.extend_from_slice(&descriptor);
        Ok(CompiledProgram {
            program,
            abi: Abi::for_contract(contract, SCHEME, "none"),
        })
    }

    fn setup(
        &self,
        program: &CompiledProgram,
    ) -> Result<(Self::ProvingKey, Self::VerifyingKey), SetupError> {
        if !program.program.starts_with(PROGRAM_MAGIC) {
            return Err(SetupError::MalformedProgram(
                "missing mock program header".to_string(),
            ));
        }
        let mut key_id = [0u8; KEY_ID_LEN];
        OsRng
            .try_fill_bytes(&mut key_id)
            .map_err(|e| SetupError::KeyGeneration(e.to_string()))?;
        Ok((MockProvingKey { key_id }, MockVerifyingKey { key_id }))
    }

    fn prove(
        &self,
        pk: &Self::ProvingKey,
        witness: &CommitmentWitness,
    ) -> Result<Self::Proof, ProofError> {
        if !witness.is_consistent() {
            return Err(ProofError::Unsatisfied(
                "hash_input does not hash to stored_hash".to_string(),
            ));
        }
        Ok(MockProof {
            proof_hex: Self::proof_digest(&pk.key_id, witness.commitment.elements()),
        })
    }

    fn verify(
        &self,
        vk: &Self::VerifyingKey,
        proof: &Self::Proof,
        public_inputs: &[FieldElement],
    ) -> Result<bool, VerifyError> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        if !is_digest_hex(&proof.proof_hex) {
            return Err(VerifyError::MalformedProof(format!(
                "expected 64 lowercase hex characters, got {} characters",
                proof.proof_hex.len()
            )));
        }
        if public_inputs.len() != COMMITMENT_LEN {
            return Err(VerifyError::KeyMismatch(format!(
                "key expects {COMMITMENT_LEN} public inputs, got {}",
                public_inputs.len()
            )));
        }
        if let Some(verdict) = self.forced {
            return Ok(verdict);
        }
        Ok(proof.proof_hex == Self::proof_digest(&vk.key_id, public_inputs))
    }

    fn encode_proving_key(&self, pk: &Self::ProvingKey) -> Result<Vec<u8>, KeyEncodingError> {
        Ok(pk.key_id.to_vec())
    }

    fn decode_proving_key(&self, bytes: &[u8]) -> Result<Self::ProvingKey, KeyEncodingError> {
        decode_key_id(bytes).map(|key_id| MockProvingKey { key_id })
    }

    fn encode_verifying_key(&self, vk: &Self::VerifyingKey) -> Result<Vec<u8>, KeyEncodingError> {
        Ok(vk.key_id.to_vec())
    }

    fn decode_verifying_key(&self, bytes: &[u8]) -> Result<Self::VerifyingKey, KeyEncodingError> {
        decode_key_id(bytes).map(|key_id| MockVerifyingKey { key_id })
    }

    fn keys_match(&self, pk: &Self::ProvingKey, vk: &Self::VerifyingKey) -> bool {
        pk.key_id == vk.key_id
    }
}
