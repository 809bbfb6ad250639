//! # relay-rollup — Relay Pipeline
//!
//! Turns a verified rollup into destination-ready proof payloads:
//!
//! - **Reconcile** (`reconcile.rs`): hash-chain verification, or one of the
//!   key-based reconciliation policies.
//!
//! - **Batcher** (`batcher.rs`): dense, 0-based, fixed-size partitioning.
//!
//! - **Payload** (`payload.rs`): per-batch submission payloads and offline
//!   verification of a whole plan.
//!
//! - **Orchestrator** (`orchestrator.rs`): fetch, reconcile, batch, encode,
//!   commit, and assemble, failing fast on the first error.
//!
//! - **Config** (`config.rs`): YAML settings with `RELAY_*` environment
//!   overrides.
//!
//! ## Crate Policy
//!
//! - Depends on `relay-core`, `relay-crypto`, and `relay-ledger` internally.
//! - Every stage after fetching is pure and deterministic.
//! - Batch bytes are produced only by `EncodedBatch::encode`.

pub mod batcher;
pub mod config;
pub mod orchestrator;
pub mod payload;
pub mod reconcile;

pub use batcher::{partition, validate_batch_size};
pub use config::{ConfigError, RelayConfig};
pub use orchestrator::{plan, RelayOrchestrator};
pub use payload::{PayloadError, ProofPayload, RelayPlan};
pub use reconcile::{reconcile, RecordPolicy};
