//! # zkauth CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use zkauth_cli::commit::{run_commit, CommitArgs};
use zkauth_cli::prove::{run_prove, ProveArgs};
use zkauth_cli::setup::{run_setup, SetupArgs};
use zkauth_cli::verify::{run_verify, VerifyArgs};
use zkauth_cli::Backend;

/// zkauth — zero-knowledge commitment authentication toolkit.
///
/// Generates circuit artifacts, derives registration commitments, and
/// produces and checks login proofs without a running server.
#[derive(Parser, Debug)]
#[command(name = "zkauth", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Proof system.
    #[arg(long, value_enum, default_value_t = Backend::Groth16, global = true)]
    backend: Backend,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compile the circuit, run setup, and persist the artifact bundle.
    Setup(SetupArgs),

    /// Print the registration payload for a set of credentials.
    Commit(CommitArgs),

    /// Produce a login payload using the published proving key.
    Prove(ProveArgs),

    /// Check a login payload against the verification key.
    Verify(VerifyArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Setup(args) => run_setup(&args, cli.backend),
        Commands::Commit(args) => run_commit(&args),
        Commands::Prove(args) => run_prove(&args, cli.backend),
        Commands::Verify(args) => run_verify(&args, cli.backend),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}
