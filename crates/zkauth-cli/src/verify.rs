//! # Verify Subcommand
//!
//! Offline check of a login payload against the verification key. The
//! claimed commitment (last two flattened inputs) is the statement; there is
//! no stored commitment to compare with here, so a passing check means only
//! that the proof is valid for the commitment it claims.
//!
//! Exit code 0 when the proof verifies, 1 when it does not.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use zkauth_zkp::{ArtifactManager, BundleVerifier, CommitmentVerifier, ProofSystem};

use crate::payload::LoginPayload;
use crate::{with_backend, Backend};

/// Arguments for `zkauth verify`.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Directory holding the published artifacts.
    #[arg(long, default_value = "zk")]
    pub artifact_dir: PathBuf,
    /// Directory holding the verification key.
    #[arg(long, default_value = "keys")]
    pub key_dir: PathBuf,
    /// Login payload as written by `zkauth prove`.
    #[arg(long, value_name = "FILE")]
    pub payload: PathBuf,
}

fn read_payload(path: &Path) -> Result<LoginPayload> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read payload: {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid login payload: {}", path.display()))
}

fn verify_with<P: ProofSystem + Clone>(
    system: P,
    args: &VerifyArgs,
    payload: &LoginPayload,
) -> Result<bool> {
    let manager = ArtifactManager::new(system, &args.artifact_dir, &args.key_dir);
    let vk = manager
        .load_verifying_key()
        .with_context(|| format!("no usable verification key in {}", args.key_dir.display()))?;
    let claimed = payload
        .inputs
        .claimed_commitment()
        .context("public inputs do not end in a commitment")?;

    let verifier = BundleVerifier::new(manager.system().clone(), vk);
    match verifier.verify(&payload.proof, &claimed) {
        Ok(valid) => Ok(valid),
        Err(err) => {
            tracing::warn!(error = %err, "proof could not be evaluated");
            Ok(false)
        }
    }
}

/// Verify the payload at `args.payload`.
pub fn check_payload(args: &VerifyArgs, backend: Backend) -> Result<bool> {
    let payload = read_payload(&args.payload)?;
    with_backend!(backend, |system| verify_with(system, args, &payload))
}

/// Execute `zkauth verify`.
pub fn run_verify(args: &VerifyArgs, backend: Backend) -> Result<u8> {
    if check_payload(args, backend)? {
        println!("OK: proof verifies");
        Ok(0)
    } else {
        println!("FAIL: proof rejected");
        Ok(1)
    }
}
