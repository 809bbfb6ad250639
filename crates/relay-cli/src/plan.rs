//! # Plan Subcommand
//!
//! Runs the full relay pipeline for one rollup transaction against a JSON
//! ledger snapshot and writes the resulting `RelayPlan` as JSON.
//!
//! Configuration is read from `--config` (YAML) when given, then `RELAY_*`
//! environment overrides are applied. Ctrl-C cancels the run between ledger
//! queries.

use std::path::{Path, PathBuf};

use alloy_primitives::B256;
use anyhow::{Context, Result};
use clap::Args;
use tokio_util::sync::CancellationToken;

use relay_ledger::InMemoryLedger;
use relay_rollup::{RelayConfig, RelayOrchestrator, RelayPlan};

/// Arguments for the `relay plan` subcommand.
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Ledger snapshot (JSON) to read the rollup from.
    #[arg(long)]
    pub snapshot: PathBuf,

    /// Rollup transaction hash (0x-prefixed hex).
    #[arg(long)]
    pub tx: String,

    /// Relay configuration (YAML).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write the plan here instead of stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

/// Load relay settings: YAML file (or defaults), then environment overrides.
pub fn load_config(path: Option<&Path>) -> Result<RelayConfig> {
    let mut config = match path {
        Some(path) => RelayConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => RelayConfig::default(),
    };
    config
        .apply_env()
        .context("applying RELAY_* environment overrides")?;
    config.validate().context("invalid relay configuration")?;
    Ok(config)
}

/// Execute `relay plan`.
pub fn run_plan(args: &PlanArgs) -> Result<u8> {
    let tx: B256 = args
        .tx
        .trim()
        .parse()
        .with_context(|| format!("invalid transaction hash {:?}", args.tx))?;
    let config = load_config(args.config.as_deref())?;
    let ledger = InMemoryLedger::load(&args.snapshot)
        .with_context(|| format!("loading snapshot {}", args.snapshot.display()))?;
    let orchestrator = RelayOrchestrator::new(ledger, config)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("starting async runtime")?;
    let plan = runtime.block_on(async {
        let cancel = CancellationToken::new();
        let on_interrupt = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupt received, cancelling relay");
                on_interrupt.cancel();
            }
        });
        orchestrator.relay(tx, &cancel).await
    })?;

    write_plan(&plan, args.out.as_deref())?;
    Ok(0)
}

fn write_plan(plan: &RelayPlan, out: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(plan)?;
    match out {
        Some(path) => {
            std::fs::write(path, format!("{json}\n"))
                .with_context(|| format!("writing plan to {}", path.display()))?;
            eprintln!(
                "OK: {} payloads, root {} -> {}",
                plan.payloads.len(),
                plan.root.map_or_else(|| "none".to_string(), |r| r.to_string()),
                path.display()
            );
        }
        None => println!("{json}"),
    }
    Ok(())
}
