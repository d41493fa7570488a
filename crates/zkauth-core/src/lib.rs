#![deny(missing_docs)]

//! # zkauth-core — Foundational Types for zkauth
//!
//! This crate defines the types every other crate in the workspace depends
//! on. It has no internal crate dependencies and no dependency on the proving
//! toolkit: field elements are plain big integers checked against the BN254
//! scalar modulus, so the protocol layer can validate requests without
//! touching curve arithmetic.
//!
//! ## Design Principles
//!
//! 1. **Newtypes for domain primitives.** A [`Username`] is not a `String`,
//!    a [`Commitment`] is not a `Vec<String>`. Both validate at construction.
//!
//! 2. **Commitments are exactly two field elements.** The length invariant is
//!    enforced by the type (`[FieldElement; 2]`), not by callers.
//!
//! 3. **[`ValidationError`] for every malformed input.** Structured errors with
//!    `thiserror`, no `.unwrap()` outside tests.

pub mod error;
pub mod field;
pub mod identity;
pub mod inputs;
pub mod record;

// Re-export primary types at crate root for ergonomic imports.
pub use error::ValidationError;
pub use field::{Commitment, FieldElement, BN254_SCALAR_MODULUS, COMMITMENT_LEN};
pub use identity::Username;
pub use inputs::PublicInputs;
pub use record::UserRecord;
