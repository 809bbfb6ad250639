//! # Ledger Client Interface
//!
//! The relay reaches the source ledger only through [`LedgerClient`]. Live
//! RPC transports and the in-memory snapshot ledger both implement it, so the
//! fetcher and orchestrator are transport-agnostic.
//!
//! Every method reports failures as [`LedgerError`]: `Transient` failures are
//! retried by the fetcher's retry policy, `Permanent` failures abort the run.

use std::future::Future;

use alloy_primitives::{Address, Bytes, B256};
use serde::{Deserialize, Serialize};

use relay_core::{
    encode_state_change, CommitmentEvent, LedgerError, RollupCommitment, StateChangeRecord,
    STATE_CHANGE_TOPIC,
};

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// A log entry as returned by the source ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLog {
    /// Emitting contract.
    pub address: Address,
    /// Indexed topics; `topics[0]` is the event signature hash.
    pub topics: Vec<B256>,
    /// ABI-encoded non-indexed event data.
    pub data: Bytes,
    /// Block containing the log.
    pub block_number: u64,
    /// Position of the log within its block.
    #[serde(default)]
    pub log_index: u64,
}

impl RawLog {
    /// The event signature hash, if the log has topics.
    pub fn topic0(&self) -> Option<B256> {
        self.topics.first().copied()
    }

    /// Build a `StateChange` log for `record`.
    pub fn state_change(
        address: Address,
        block_number: u64,
        log_index: u64,
        record: &StateChangeRecord,
    ) -> Self {
        Self {
            address,
            topics: vec![STATE_CHANGE_TOPIC],
            data: encode_state_change(record).into(),
            block_number,
            log_index,
        }
    }

    /// Build a `Rollup`/`InitiateRollup` log carrying `commitment`.
    pub fn commitment(
        address: Address,
        event: CommitmentEvent,
        block_number: u64,
        log_index: u64,
        commitment: &RollupCommitment,
    ) -> Self {
        Self {
            address,
            topics: vec![event.topic()],
            data: commitment.encode().into(),
            block_number,
            log_index,
        }
    }
}

/// The receipt of a mined transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    /// Transaction hash.
    pub tx_hash: B256,
    /// Called contract; `None` for contract creation.
    #[serde(default)]
    pub to: Option<Address>,
    /// Block the transaction was mined in.
    pub block_number: u64,
    /// Logs emitted by the transaction, in emission order.
    #[serde(default)]
    pub logs: Vec<RawLog>,
}

impl TxReceipt {
    /// First log whose `topic0` equals `topic`.
    pub fn find_log(&self, topic: B256) -> Option<&RawLog> {
        self.logs.iter().find(|log| log.topic0() == Some(topic))
    }
}

/// An inclusive block range `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockRange {
    /// First block.
    pub start: u64,
    /// Last block (inclusive).
    pub end: u64,
}

impl BlockRange {
    /// Create a range. `start > end` denotes an empty range.
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    /// Returns true if the range contains no blocks.
    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    /// Returns true if `block` lies within the range.
    pub fn contains(&self, block: u64) -> bool {
        self.start <= block && block <= self.end
    }

    /// Split into consecutive sub-ranges of at most `width` blocks.
    ///
    /// Each sub-range ends at `min(start + width - 1, end)` and the next one
    /// starts right after it. A `width` of zero is treated as one.
    pub fn chunks(self, width: u64) -> BlockChunks {
        BlockChunks {
            next: (!self.is_empty()).then_some(self.start),
            end: self.end,
            width: width.max(1),
        }
    }
}

/// Iterator over the sub-ranges of a [`BlockRange`].
#[derive(Debug, Clone)]
pub struct BlockChunks {
    next: Option<u64>,
    end: u64,
    width: u64,
}

impl Iterator for BlockChunks {
    type Item = BlockRange;

    fn next(&mut self) -> Option<BlockRange> {
        let start = self.next?;
        let chunk_end = start.saturating_add(self.width - 1).min(self.end);
        self.next = chunk_end.checked_add(1).filter(|s| *s <= self.end);
        Some(BlockRange::new(start, chunk_end))
    }
}

// ---------------------------------------------------------------------------
// Client trait
// ---------------------------------------------------------------------------

/// Asynchronous access to the source ledger.
///
/// Implementations must be `Send + Sync` and return `Send` futures so a relay
/// run can be spawned onto a multi-threaded runtime.
pub trait LedgerClient: Send + Sync {
    /// Fetch the receipt of a mined transaction.
    fn transaction_receipt(
        &self,
        tx_hash: B256,
    ) -> impl Future<Output = Result<TxReceipt, LedgerError>> + Send;

    /// Logs emitted by `contract` with the given `topic0` within `range`,
    /// ordered by block number then log index.
    fn query_events(
        &self,
        contract: Address,
        topic0: B256,
        range: BlockRange,
    ) -> impl Future<Output = Result<Vec<RawLog>, LedgerError>> + Send;

    /// Records `[start, start + size)` of `epoch`, as exposed by the source
    /// contract's indexed record store. Indices past the end yield fewer (or
    /// zero) records.
    fn query_paged(
        &self,
        contract: Address,
        epoch: u64,
        start: u64,
        size: u64,
    ) -> impl Future<Output = Result<Vec<StateChangeRecord>, LedgerError>> + Send;

    /// Number of records stored for `epoch`.
    fn total_records(
        &self,
        contract: Address,
        epoch: u64,
    ) -> impl Future<Output = Result<u64, LedgerError>> + Send;
}
