//! # Commit Subcommand
//!
//! Derives the registration payload from credentials. The secret is the
//! preimage `"<username>:<password>:<salt>"`, packed into four 128-bit
//! chunks and hashed; only the resulting commitment leaves this process.

use anyhow::{Context, Result};
use clap::Args;
use zkauth_zkp::{CommitmentWitness, Secret};

use crate::payload::RegisterPayload;

/// Credentials shared by `commit` and `prove`.
#[derive(Args, Clone)]
pub struct CredentialArgs {
    /// Account name.
    #[arg(long)]
    pub username: String,
    /// Password.
    #[arg(long)]
    pub password: String,
    /// Per-user salt.
    #[arg(long)]
    pub salt: String,
}

impl std::fmt::Debug for CredentialArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialArgs")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("salt", &self.salt)
            .finish()
    }
}

impl CredentialArgs {
    /// Build the witness (hash input and commitment) for these credentials.
    pub fn witness(&self) -> Result<CommitmentWitness> {
        let secret = Secret::from_credentials(&self.username, &self.password, &self.salt)
            .context("credentials do not fit the circuit's secret size")?;
        Ok(CommitmentWitness::from_secret(&secret))
    }
}

/// Arguments for `zkauth commit`.
#[derive(Args, Debug)]
pub struct CommitArgs {
    #[command(flatten)]
    pub credentials: CredentialArgs,
}

/// Registration payload for `credentials`.
pub fn register_payload(credentials: &CredentialArgs) -> Result<RegisterPayload> {
    let witness = credentials.witness()?;
    Ok(RegisterPayload {
        username: credentials.username.clone(),
        stored_hash: witness.commitment.to_strings().to_vec(),
    })
}

/// Execute `zkauth commit`: print the registration payload as JSON.
pub fn run_commit(args: &CommitArgs) -> Result<u8> {
    let payload = register_payload(&args.credentials)?;
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(0)
}
