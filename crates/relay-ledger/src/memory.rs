//! # In-Memory Ledger
//!
//! A deterministic [`LedgerClient`] backed by a [`LedgerSnapshot`]: a serde
//! JSON document of transaction receipts, event logs, and per-epoch record
//! stores. Used by tests and by the CLI for offline relay planning.
//!
//! Fault injection (`with_transient_failures`) makes the first `n` queries
//! fail with `LedgerError::Transient`, which exercises the retry policy
//! without a network.

use std::path::Path;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use alloy_primitives::{Address, B256};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use relay_core::{LedgerError, StateChangeRecord};

use crate::ledger::{BlockRange, LedgerClient, RawLog, TxReceipt};

/// Records stored by a source contract for one epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochRecords {
    /// Contract holding the records.
    pub contract: Address,
    /// Rollup epoch.
    pub epoch: u64,
    /// Records in index order.
    pub records: Vec<StateChangeRecord>,
}

/// Serializable ledger contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// Mined transaction receipts.
    #[serde(default)]
    pub receipts: Vec<TxReceipt>,
    /// Logs visible to event queries.
    #[serde(default)]
    pub logs: Vec<RawLog>,
    /// Indexed record stores.
    #[serde(default)]
    pub epochs: Vec<EpochRecords>,
}

/// Error loading a ledger snapshot.
#[derive(Error, Debug)]
pub enum SnapshotError {
    /// The snapshot file could not be read.
    #[error("failed to read snapshot {path}: {source}")]
    Io {
        /// Snapshot path.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The snapshot is not valid JSON for [`LedgerSnapshot`].
    #[error("invalid snapshot JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Deterministic in-process ledger.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    snapshot: LedgerSnapshot,
    pending_failures: AtomicU32,
    queries: AtomicU64,
}

impl InMemoryLedger {
    /// An empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// A ledger serving `snapshot`.
    pub fn from_snapshot(snapshot: LedgerSnapshot) -> Self {
        Self {
            snapshot,
            ..Self::default()
        }
    }

    /// Parse a JSON snapshot.
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(Self::from_snapshot(serde_json::from_str(json)?))
    }

    /// Load a JSON snapshot file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| SnapshotError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&raw)
    }

    /// Add a transaction receipt.
    pub fn with_receipt(mut self, receipt: TxReceipt) -> Self {
        self.snapshot.receipts.push(receipt);
        self
    }

    /// Add a log visible to event queries.
    pub fn with_log(mut self, log: RawLog) -> Self {
        self.snapshot.logs.push(log);
        self
    }

    /// Store the indexed records of `epoch` for `contract`.
    pub fn with_epoch_records(
        mut self,
        contract: Address,
        epoch: u64,
        records: Vec<StateChangeRecord>,
    ) -> Self {
        self.snapshot.epochs.push(EpochRecords {
            contract,
            epoch,
            records,
        });
        self
    }

    /// Fail the next `n` queries with a transient error.
    pub fn with_transient_failures(self, n: u32) -> Self {
        self.pending_failures.store(n, Ordering::SeqCst);
        self
    }

    /// The ledger contents.
    pub fn snapshot(&self) -> &LedgerSnapshot {
        &self.snapshot
    }

    /// Number of queries received so far, including failed ones.
    pub fn query_count(&self) -> u64 {
        self.queries.load(Ordering::SeqCst)
    }

    fn begin_query(&self, what: &str) -> Result<(), LedgerError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        let injected = self
            .pending_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(LedgerError::Transient(format!("injected failure in {what}")));
        }
        Ok(())
    }

    fn epoch(&self, contract: Address, epoch: u64) -> Option<&EpochRecords> {
        self.snapshot
            .epochs
            .iter()
            .find(|e| e.contract == contract && e.epoch == epoch)
    }
}

impl LedgerClient for InMemoryLedger {
    async fn transaction_receipt(&self, tx_hash: B256) -> Result<TxReceipt, LedgerError> {
        self.begin_query("transaction_receipt")?;
        self.snapshot
            .receipts
            .iter()
            .find(|r| r.tx_hash == tx_hash)
            .cloned()
            .ok_or_else(|| LedgerError::Permanent(format!("unknown transaction {tx_hash}")))
    }

    async fn query_events(
        &self,
        contract: Address,
        topic0: B256,
        range: BlockRange,
    ) -> Result<Vec<RawLog>, LedgerError> {
        self.begin_query("query_events")?;
        let mut logs: Vec<RawLog> = self
            .snapshot
            .logs
            .iter()
            .filter(|log| {
                log.address == contract
                    && log.topic0() == Some(topic0)
                    && range.contains(log.block_number)
            })
            .cloned()
            .collect();
        logs.sort_by_key(|log| (log.block_number, log.log_index));
        Ok(logs)
    }

    async fn query_paged(
        &self,
        contract: Address,
        epoch: u64,
        start: u64,
        size: u64,
    ) -> Result<Vec<StateChangeRecord>, LedgerError> {
        self.begin_query("query_paged")?;
        let Some(store) = self.epoch(contract, epoch) else {
            return Ok(Vec::new());
        };
        let len = store.records.len();
        let from = usize::try_from(start).unwrap_or(usize::MAX).min(len);
        let to = usize::try_from(start.saturating_add(size))
            .unwrap_or(usize::MAX)
            .min(len);
        Ok(store.records[from..to].to_vec())
    }

    async fn total_records(&self, contract: Address, epoch: u64) -> Result<u64, LedgerError> {
        self.begin_query("total_records")?;
        Ok(self
            .epoch(contract, epoch)
            .map_or(0, |store| store.records.len() as u64))
    }
}
