//! # Setup Subcommand
//!
//! Generates the artifact bundle offline, so a server can start on
//! pre-provisioned artifacts. Without `--force` an existing consistent
//! bundle is kept.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use zkauth_zkp::artifacts::{ABI_FILE, PROGRAM_FILE, PROVING_KEY_FILE, VERIFICATION_KEY_FILE};
use zkauth_zkp::{ArtifactManager, ProofSystem};

use crate::{with_backend, Backend};

/// Arguments for `zkauth setup`.
#[derive(Args, Debug)]
pub struct SetupArgs {
    /// Directory for the public artifacts.
    #[arg(long, default_value = "zk")]
    pub artifact_dir: PathBuf,
    /// Directory for the verification key.
    #[arg(long, default_value = "keys")]
    pub key_dir: PathBuf,
    /// Regenerate even if a consistent bundle exists. Invalidates every
    /// proof made with the old proving key.
    #[arg(long)]
    pub force: bool,
}

fn setup_with<P: ProofSystem>(system: P, args: &SetupArgs) -> Result<u8> {
    let scheme = system.scheme();
    let manager = ArtifactManager::new(system, &args.artifact_dir, &args.key_dir);
    manager
        .initialize(args.force)
        .context("artifact generation failed")?;

    println!("OK: artifact bundle ready ({scheme})");
    for path in bundle_files(&args.artifact_dir, &args.key_dir) {
        println!("  {}", path.display());
    }
    Ok(0)
}

fn bundle_files(artifact_dir: &Path, key_dir: &Path) -> [PathBuf; 4] {
    [
        artifact_dir.join(PROGRAM_FILE),
        artifact_dir.join(ABI_FILE),
        artifact_dir.join(PROVING_KEY_FILE),
        key_dir.join(VERIFICATION_KEY_FILE),
    ]
}

/// Execute `zkauth setup`.
pub fn run_setup(args: &SetupArgs, backend: Backend) -> Result<u8> {
    with_backend!(backend, |system| setup_with(system, args))
}
