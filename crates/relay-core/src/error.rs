//! # Error Types — Structured Error Hierarchy
//!
//! Defines the error types used throughout the relay. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - Integrity failures carry the expected and computed digests.
//! - Fetch failures carry the scope that failed (block range, page, receipt,
//!   or total-count query) and the last ledger error seen.
//! - Only `LedgerError::Transient` is ever retried. Every other error aborts
//!   the pipeline and no partial output is returned.

use std::fmt;

use alloy_primitives::{B256, U256};
use thiserror::Error;

use crate::digest::Digest;

/// Top-level error type for a relay run.
#[derive(Error, Debug)]
pub enum RelayError {
    /// Transient ledger failures survived every retry attempt.
    #[error("fetch exhausted after {attempts} attempts during {scope}: {last_error}")]
    FetchExhausted {
        /// The query that kept failing.
        scope: FetchScope,
        /// Number of attempts made.
        attempts: u32,
        /// The error returned by the final attempt.
        last_error: LedgerError,
    },

    /// The fetched records do not fold to the committed digest.
    #[error("hash chain mismatch over {records} records: expected {expected}, computed {actual}")]
    HashChainMismatch {
        /// Digest committed by the source ledger.
        expected: Digest,
        /// Digest computed from the fetched records.
        actual: Digest,
        /// Number of records folded.
        records: usize,
    },

    /// Batch size must be positive.
    #[error("invalid batch size {0}: must be positive")]
    InvalidBatchSize(u64),

    /// Malformed record or event data.
    #[error("encoding error: {0}")]
    Encoding(#[from] EncodingError),

    /// Merkle tree construction or proof failure.
    #[error("merkle error: {0}")]
    Merkle(#[from] MerkleError),

    /// A non-retryable ledger error.
    #[error("ledger error during {scope}: {source}")]
    Ledger {
        /// The query that failed.
        scope: FetchScope,
        /// The underlying ledger error.
        #[source]
        source: LedgerError,
    },

    /// The rollup transaction receipt lacks a required event.
    #[error("event {event} not found in receipt of transaction {tx_hash}")]
    MissingEvent {
        /// Event name that was searched for.
        event: &'static str,
        /// The rollup transaction.
        tx_hash: B256,
    },

    /// The run was cancelled between sub-queries.
    #[error("relay cancelled")]
    Cancelled,

    /// Invalid relay configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Error from the ledger query interface.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// A failure that may succeed on retry (timeouts, dropped connections).
    #[error("transient ledger failure: {0}")]
    Transient(String),

    /// A failure that retrying cannot fix (unknown transaction, bad request).
    #[error("ledger failure: {0}")]
    Permanent(String),
}

impl LedgerError {
    /// Returns true if the retry policy should try again.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

/// Error while encoding or decoding canonical ABI data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    /// ABI decoding rejected the input.
    #[error("abi decoding failed: {0}")]
    Abi(String),

    /// Input decoded, but re-encoding it does not reproduce the same bytes.
    #[error("non-canonical encoding of {0}")]
    NonCanonical(&'static str),

    /// A state-change key was not exactly 32 bytes.
    #[error("state-change key must be 32 bytes, got {0}")]
    KeyLength(usize),

    /// The rollup start block does not fit in a 64-bit block number.
    #[error("start block {0} exceeds u64 range")]
    StartBlockOverflow(U256),

    /// Invalid hex input.
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    /// An unrecognized name for an enumerated setting.
    #[error("unknown {kind} {value:?}")]
    UnknownVariant {
        /// The setting being parsed.
        kind: &'static str,
        /// The rejected input.
        value: String,
    },
}

impl From<alloy_sol_types::Error> for EncodingError {
    fn from(err: alloy_sol_types::Error) -> Self {
        Self::Abi(err.to_string())
    }
}

/// Error in Merkle tree operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MerkleError {
    /// A tree needs at least one leaf.
    #[error("cannot build a merkle tree without leaves")]
    EmptyTree,

    /// Proof requested for a leaf that does not exist.
    #[error("leaf index {index} out of range for {len} leaves")]
    LeafIndexOutOfRange {
        /// Requested leaf.
        index: usize,
        /// Number of leaves in the tree.
        len: usize,
    },
}

/// The ledger query an error is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchScope {
    /// Receipt lookup for the rollup transaction.
    Receipt(B256),
    /// Event scan over an inclusive block range.
    Blocks {
        /// First block of the sub-range.
        start: u64,
        /// Last block of the sub-range (inclusive).
        end: u64,
    },
    /// Total record count for an epoch.
    Total {
        /// Rollup epoch.
        epoch: u64,
    },
    /// One page of indexed records.
    Page {
        /// Rollup epoch.
        epoch: u64,
        /// First record index of the page.
        start: u64,
        /// Requested page size.
        size: u64,
    },
}

impl fmt::Display for FetchScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Receipt(tx) => write!(f, "receipt {tx}"),
            Self::Blocks { start, end } => write!(f, "blocks [{start}, {end}]"),
            Self::Total { epoch } => write!(f, "total of epoch {epoch}"),
            Self::Page { epoch, start, size } => {
                write!(f, "epoch {epoch} page [{start}, {})", start.saturating_add(*size))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(LedgerError::Transient("timeout".into()).is_transient());
        assert!(!LedgerError::Permanent("unknown tx".into()).is_transient());
    }

    #[test]
    fn test_fetch_scope_display() {
        assert_eq!(
            FetchScope::Blocks { start: 10, end: 34 }.to_string(),
            "blocks [10, 34]"
        );
        assert_eq!(
            FetchScope::Page { epoch: 3, start: 25, size: 25 }.to_string(),
            "epoch 3 page [25, 50)"
        );
    }

    #[test]
    fn test_mismatch_message_carries_both_digests() {
        let err = RelayError::HashChainMismatch {
            expected: Digest::new([1u8; 32]),
            actual: Digest::new([2u8; 32]),
            records: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains(&"01".repeat(32)));
        assert!(msg.contains(&"02".repeat(32)));
        assert!(msg.contains("3 records"));
    }
}
