//! # zkauth-zkp — Zero-Knowledge Layer
//!
//! Everything between a user secret and a yes/no verification verdict.
//!
//! ## Architecture
//!
//! - **Circuit** (`circuit.rs`): the contract proved by every login. The
//!   secret encoding, commitment split, and hash function live here and
//!   nowhere else.
//!
//! - **Traits** (`traits.rs`): the sealed `ProofSystem` trait
//!   {compile, setup, prove, verify}. Backends are interchangeable behind it.
//!
//! - **Groth16** (`groth16.rs`, feature `groth16`): BN254 Groth16 via
//!   arkworks, with the commitment statement as an R1CS circuit.
//!
//! - **Mock** (`mock.rs`, feature `mock`): deterministic digests with a
//!   controllable verdict and a call counter, for protocol tests.
//!
//! - **Artifacts** (`artifacts.rs`): compile, set up, persist, and reload
//!   the bundle; fail-fast on any error.
//!
//! - **Verifier** (`verifier.rs`): object-safe `CommitmentVerifier` bound to
//!   a verification key, consumed by the login protocol.
//!
//! ## Crate Policy
//!
//! - Depends on `zkauth-core` only internally.
//! - Toolkit crates are optional dependencies behind feature flags.
//! - No `unsafe`.

pub mod artifacts;
pub mod circuit;
#[cfg(feature = "groth16")]
pub mod groth16;
#[cfg(feature = "mock")]
pub mod mock;
pub mod traits;
pub mod verifier;

pub use artifacts::{ArtifactBundle, ArtifactError, ArtifactManager, PublishedArtifacts};
pub use circuit::{commit, encode_secret, CircuitContract, CommitmentWitness, HashInput, Secret};
#[cfg(feature = "groth16")]
pub use groth16::{Groth16Proof, Groth16ProofSystem};
#[cfg(feature = "mock")]
pub use mock::{MockProof, MockProofSystem};
pub use traits::{
    CircuitError, CompiledProgram, KeyEncodingError, ProofError, ProofSystem, SetupError,
    VerifyError,
};
pub use verifier::{BundleVerifier, CommitmentVerifier};
