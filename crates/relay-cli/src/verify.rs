//! # Verify Subcommand
//!
//! Re-checks a plan file the way the destination verifier would: every
//! encoded batch must be canonical, carry its declared index, and prove into
//! the plan root.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use relay_rollup::RelayPlan;

/// Arguments for the `relay verify` subcommand.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Plan file produced by `relay plan`.
    #[arg(long)]
    pub payloads: PathBuf,
}

/// Execute `relay verify`. Returns exit code 0 if every payload verifies,
/// 1 otherwise.
pub fn run_verify(args: &VerifyArgs) -> Result<u8> {
    let raw = std::fs::read_to_string(&args.payloads)
        .with_context(|| format!("reading {}", args.payloads.display()))?;
    let plan: RelayPlan = serde_json::from_str(&raw)
        .with_context(|| format!("parsing plan {}", args.payloads.display()))?;

    match plan.verify() {
        Ok(()) => {
            println!(
                "OK: {} payloads verified against root {}",
                plan.payloads.len(),
                plan.root.map_or_else(|| "none".to_string(), |r| r.to_string())
            );
            Ok(0)
        }
        Err(e) => {
            println!("FAIL: {e}");
            Ok(1)
        }
    }
}
