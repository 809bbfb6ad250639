//! # relay-cli — Rollup State Relay Command-Line Interface
//!
//! ## Subcommands
//!
//! - `plan` — Run the relay pipeline for one rollup transaction against a
//!   ledger snapshot and emit the proof payloads
//! - `verify` — Check a plan file's payloads against its Merkle root
//! - `digest` — Compute the hash-chain digest of a record file
//!
//! ## Crate Policy
//!
//! - CLI construction (argument parsing) is separated from business logic.
//! - Handler functions delegate to the domain crates.
//! - Handlers return a process exit code; `anyhow` carries errors to `main`.

pub mod digest;
pub mod plan;
pub mod verify;
