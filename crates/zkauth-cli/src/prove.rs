//! # Prove Subcommand
//!
//! Client-side login: load the published proving key, build the witness
//! from credentials, and emit the `POST /login` body. Needs only the public
//! artifact directory, exactly what a browser fetches from `/zk/*`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use zkauth_core::PublicInputs;
use zkauth_zkp::{ArtifactManager, CommitmentWitness, ProofSystem};

use crate::commit::CredentialArgs;
use crate::payload::LoginPayload;
use crate::{with_backend, Backend};

/// Arguments for `zkauth prove`.
#[derive(Args, Debug)]
pub struct ProveArgs {
    #[command(flatten)]
    pub credentials: CredentialArgs,
    /// Directory holding the published artifacts.
    #[arg(long, default_value = "zk")]
    pub artifact_dir: PathBuf,
    /// Write the payload here instead of stdout.
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

/// Public inputs for the login body: the commitment and nothing else.
///
/// The hash-input chunks are private witness values and never leave the
/// client.
pub fn public_inputs(witness: &CommitmentWitness) -> PublicInputs {
    PublicInputs::from(&witness.commitment)
}

fn prove_with<P: ProofSystem>(system: P, args: &ProveArgs) -> Result<LoginPayload> {
    // The verification key directory is never read on the client side.
    let manager = ArtifactManager::new(system, &args.artifact_dir, PathBuf::new());
    let pk = manager
        .load_proving_key()
        .with_context(|| format!("no usable proving key in {}", args.artifact_dir.display()))?;

    let witness = args.credentials.witness()?;
    let started = std::time::Instant::now();
    let proof = manager
        .system()
        .prove(&pk, &witness)
        .context("proof generation failed")?;
    tracing::info!(elapsed_ms = started.elapsed().as_millis() as u64, "proof generated");

    Ok(LoginPayload {
        username: args.credentials.username.clone(),
        proof: serde_json::to_value(proof)?,
        inputs: public_inputs(&witness),
    })
}

/// Build the login payload for the selected backend.
pub fn login_payload(args: &ProveArgs, backend: Backend) -> Result<LoginPayload> {
    with_backend!(backend, |system| prove_with(system, args))
}

/// Execute `zkauth prove`.
pub fn run_prove(args: &ProveArgs, backend: Backend) -> Result<u8> {
    let payload = login_payload(args, backend)?;
    let json = serde_json::to_string_pretty(&payload)?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("failed to write payload: {}", path.display()))?;
            println!("OK: login payload written to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(0)
}
