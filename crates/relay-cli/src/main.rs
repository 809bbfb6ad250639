//! # relay CLI entry point
//!
//! Parses command-line arguments, installs the tracing subscriber, and
//! dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use relay_cli::digest::{run_digest, DigestArgs};
use relay_cli::plan::{run_plan, PlanArgs};
use relay_cli::verify::{run_verify, VerifyArgs};

/// Rollup state relay.
///
/// Verifies a rollup's state changes against its committed hash chain,
/// re-batches them, and emits Merkle proof payloads for the destination
/// ledger.
#[derive(Parser, Debug)]
#[command(name = "relay", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build proof payloads for a rollup transaction from a ledger snapshot.
    Plan(PlanArgs),

    /// Verify every payload of a plan file against its root.
    Verify(VerifyArgs),

    /// Compute the hash-chain digest of a record file.
    Digest(DigestArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "relay CLI starting");

    let result = match cli.command {
        Commands::Plan(args) => run_plan(&args),
        Commands::Verify(args) => run_verify(&args),
        Commands::Digest(args) => run_digest(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

/// `RUST_LOG` wins when set; otherwise verbosity picks the level.
fn init_tracing(verbose: u8, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        })
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
