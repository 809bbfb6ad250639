//! # Digest Subcommand
//!
//! Folds a JSON array of state-change records into its hash-chain digest,
//! the value a source contract commits to in its `Rollup` event.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use relay_core::StateChangeRecord;
use relay_crypto::fold;

/// Arguments for the `relay digest` subcommand.
#[derive(Args, Debug)]
pub struct DigestArgs {
    /// JSON array of `{ "key": "0x..", "value": "0x.." }` records.
    #[arg(long)]
    pub records: PathBuf,
}

/// Execute `relay digest`.
pub fn run_digest(args: &DigestArgs) -> Result<u8> {
    let raw = std::fs::read_to_string(&args.records)
        .with_context(|| format!("reading {}", args.records.display()))?;
    let records: Vec<StateChangeRecord> = serde_json::from_str(&raw)
        .with_context(|| format!("parsing records {}", args.records.display()))?;
    let digest = fold(&records);
    tracing::debug!(records = records.len(), %digest, "records folded");
    println!("{digest}");
    Ok(0)
}
