//! # zkauth-cli — Command-Line Toolkit
//!
//! Everything a client or operator does outside the server process.
//!
//! ## Subcommands
//!
//! - `setup`: compile the circuit, run setup, persist the artifact bundle.
//! - `commit`: derive the registration payload from credentials.
//! - `prove`: build a login payload with the published proving key.
//! - `verify`: check a login payload against the verification key.
//!
//! ## Crate Policy
//!
//! - Argument parsing lives in `main.rs`; handlers here return an exit code.
//! - Payloads are the JSON bodies `POST /register` and `POST /login` accept.

use clap::ValueEnum;

/// Proof system selection, shared by every subcommand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Backend {
    /// Groth16 over BN254.
    #[default]
    Groth16,
    /// Deterministic mock (development only).
    Mock,
}

/// Run `$body` with `$system` bound to the selected proof system.
macro_rules! with_backend {
    ($backend:expr, |$system:ident| $body:expr) => {
        match $backend {
            $crate::Backend::Groth16 => {
                let $system = ::zkauth_zkp::Groth16ProofSystem;
                $body
            }
            $crate::Backend::Mock => {
                let $system = ::zkauth_zkp::MockProofSystem::default();
                $body
            }
        }
    };
}
pub(crate) use with_backend;

pub mod commit;
pub mod payload;
pub mod prove;
pub mod setup;
pub mod verify;
