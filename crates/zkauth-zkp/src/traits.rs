//! # Proof System Trait (Sealed)
//!
//! The narrow capability interface the authentication engine requires from a
//! zero-knowledge toolkit: compile the circuit contract, run the trusted
//! setup, prove, and verify. Key serialization is part of the contract
//! because the artifact manager persists keys byte-exact.
//!
//! ## Sealed Trait
//!
//! `ProofSystem` is **sealed**: only backends defined inside `zkauth-zkp`
//! can implement it. Login decisions rest on `verify` returning `true`, so
//! an arbitrary downstream implementation must not be injectable.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use zkauth_core::FieldElement;

use crate::circuit::{Abi, CircuitContract, CommitmentWitness};

/// Error while compiling the circuit contract.
#[derive(Error, Debug)]
pub enum CircuitError {
    /// The contract descriptor does not describe a supported circuit.
    #[error("unsupported circuit contract: {0}")]
    Unsupported(String),
    /// Constraint synthesis failed.
    #[error("constraint synthesis failed: {0}")]
    Synthesis(String),
}

/// Error during the trusted setup.
#[derive(Error, Debug)]
pub enum SetupError {
    /// The program binary could not be decoded.
    #[error("malformed program: {0}")]
    MalformedProgram(String),
    /// Key generation failed inside the toolkit.
    #[error("key generation failed: {0}")]
    KeyGeneration(String),
    /// Generated keys disagree with the program's public-input shape.
    #[error("key/program shape mismatch: {0}")]
    ShapeMismatch(String),
}

/// Error during proof generation.
#[derive(Error, Debug)]
pub enum ProofError {
    /// The witness does not satisfy the circuit.
    #[error("witness does not satisfy the circuit: {0}")]
    Unsatisfied(String),
    /// Proof generation failed internally.
    #[error("proof generation failed: {0}")]
    GenerationFailed(String),
}

/// Error during proof verification.
///
/// Distinct from `Ok(false)`: these are proofs or keys that could not be
/// evaluated at all.
#[derive(Error, Debug)]
pub enum VerifyError {
    /// The proof is structurally malformed.
    #[error("malformed proof: {0}")]
    MalformedProof(String),
    /// The verifying key cannot evaluate these public inputs.
    #[error("key mismatch: {0}")]
    KeyMismatch(String),
}

/// Error while encoding or decoding key material.
#[derive(Error, Debug)]
#[error("key encoding error: {0}")]
pub struct KeyEncodingError(pub String);

/// Output of [`ProofSystem::compile`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledProgram {
    /// Backend-specific program binary (served as `out`).
    pub program: Vec<u8>,
    /// Input/output descriptor (served as `abi.json`).
    pub abi: Abi,
}

/// Private module that seals the [`ProofSystem`] trait.
mod private {
    /// Sealing marker trait. Not accessible outside `zkauth-zkp`.
    pub trait Sealed {}
}

/// Sealed trait defining the toolkit contract.
///
/// ## Associated Types
///
/// - **`Proof`**: opaque proof forwarded from client to verifier. Must
///   round-trip through JSON since it arrives in a request body.
/// - **`VerifyingKey`**: retained server-side only; cloned into verifiers.
/// - **`ProvingKey`**: published to clients; may be large.
pub trait ProofSystem: private::Sealed + Send + Sync + 'static {
    /// The proof type produced by this system.
    type Proof: Serialize + DeserializeOwned + Clone + std::fmt::Debug + Send + Sync;
    /// The verifying key type.
    type VerifyingKey: Clone + Send + Sync;
    /// The proving key type.
    type ProvingKey: Send + Sync;

    /// Short scheme tag recorded in the ABI (e.g. `"g16"`).
    fn scheme(&self) -> &'static str;

    /// Compile the circuit contract into a program binary and ABI.
    ///
    /// Deterministic for a given contract and toolkit version.
    ///
    /// # Errors
    ///
    /// Returns [`CircuitError`] if the contract is malformed or unsupported.
    fn compile(&self, contract: &CircuitContract) -> Result<CompiledProgram, CircuitError>;

    /// Run the trusted setup for a compiled program.
    ///
    /// Randomized: two runs yield incompatible key pairs.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError`] if the program is malformed or the generated
    /// keys do not fit it.
    fn setup(
        &self,
        program: &CompiledProgram,
    ) -> Result<(Self::ProvingKey, Self::VerifyingKey), SetupError>;

    /// Generate a proof of knowledge for a witness.
    ///
    /// # Errors
    ///
    /// Returns [`ProofError::Unsatisfied`] if the witness does not hash to
    /// its commitment.
    fn prove(
        &self,
        pk: &Self::ProvingKey,
        witness: &CommitmentWitness,
    ) -> Result<Self::Proof, ProofError>;

    /// Verify a proof against the circuit's public inputs.
    ///
    /// # Returns
    ///
    /// `Ok(true)` if the proof is valid, `Ok(false)` if it is well-formed but
    /// cryptographically invalid.
    ///
    /// # Errors
    ///
    /// Returns [`VerifyError`] if the proof or inputs cannot be evaluated.
    fn verify(
        &self,
        vk: &Self::VerifyingKey,
        proof: &Self::Proof,
        public_inputs: &[FieldElement],
    ) -> Result<bool, VerifyError>;

    /// Serialize a proving key for publication.
    fn encode_proving_key(&self, pk: &Self::ProvingKey) -> Result<Vec<u8>, KeyEncodingError>;

    /// Deserialize a published proving key.
    fn decode_proving_key(&self, bytes: &[u8]) -> Result<Self::ProvingKey, KeyEncodingError>;

    /// Serialize a verifying key for trusted storage.
    fn encode_verifying_key(&self, vk: &Self::VerifyingKey) -> Result<Vec<u8>, KeyEncodingError>;

    /// Deserialize a verifying key from trusted storage.
    fn decode_verifying_key(&self, bytes: &[u8]) -> Result<Self::VerifyingKey, KeyEncodingError>;

    /// Whether `vk` is the verifying half of `pk` (same setup run).
    fn keys_match(&self, pk: &Self::ProvingKey, vk: &Self::VerifyingKey) -> bool;
}

// ---- Sealed trait implementations for authorized proof systems ----

#[cfg(feature = "mock")]
impl private::Sealed for crate::mock::MockProofSystem {}

#[cfg(feature = "groth16")]
impl private::Sealed for crate::groth16::Groth16ProofSystem {}
