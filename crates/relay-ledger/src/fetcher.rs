//! # State-Change Fetcher
//!
//! Collects the ordered state-change records a rollup committed to.
//!
//! ## Discovery
//!
//! - **Event scan**: split `[start_block, receipt.block_number]` into
//!   sub-ranges of at most `query_size` blocks and query `StateChange` logs
//!   from the source contract for each, in order.
//! - **Indexed pull**: read the epoch's record count, then pull pages
//!   `[i, i + query_size)` for `i = 0, query_size, ...` while `i <= total`.
//!   The final page may be empty.
//!
//! Every sub-query runs under the [`RetryPolicy`]. The first sub-query that
//! exhausts its retries fails the whole fetch and accumulated records are
//! dropped. Cancellation is observed between sub-queries and during back-off.

use std::fmt;
use std::str::FromStr;

use alloy_primitives::{Address, B256};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use relay_core::{
    decode_state_change, CommitmentEvent, EncodingError, FetchScope, RelayError,
    RollupCommitment, StateChangeRecord, STATE_CHANGE_TOPIC,
};

use crate::ledger::{BlockRange, LedgerClient};
use crate::retry::RetryPolicy;

/// Default number of blocks (event scan) or records (indexed pull) per query.
pub const DEFAULT_QUERY_SIZE: u64 = 25;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// How records are located on the source ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiscoveryMode {
    /// Scan `StateChange` logs block range by block range.
    #[default]
    EventScan,
    /// Pull records by index from the source contract's epoch store.
    IndexedPull,
}

impl DiscoveryMode {
    /// Configuration name of the mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EventScan => "event-scan",
            Self::IndexedPull => "indexed-pull",
        }
    }
}

impl fmt::Display for DiscoveryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DiscoveryMode {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "event-scan" => Ok(Self::EventScan),
            "indexed-pull" => Ok(Self::IndexedPull),
            other => Err(EncodingError::UnknownVariant {
                kind: "discovery mode",
                value: other.to_string(),
            }),
        }
    }
}

/// Fetcher settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetcherConfig {
    /// Blocks per event-scan query, or records per indexed-pull page.
    pub query_size: u64,
    /// Retry policy applied to every sub-query.
    pub retry: RetryPolicy,
    /// Record discovery mode.
    pub discovery: DiscoveryMode,
    /// Event in the rollup receipt that carries the commitment.
    pub commitment_event: CommitmentEvent,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            query_size: DEFAULT_QUERY_SIZE,
            retry: RetryPolicy::default(),
            discovery: DiscoveryMode::default(),
            commitment_event: CommitmentEvent::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Rollup context
// ---------------------------------------------------------------------------

/// Everything learned from the rollup transaction receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollupContext {
    /// The rollup transaction.
    pub tx_hash: B256,
    /// The decoded commitment.
    pub commitment: RollupCommitment,
    /// Rollup epoch, taken from the `Rollup` event's nonce field.
    pub epoch: u64,
    /// Contract that emitted the state changes.
    pub contract: Address,
    /// Block the rollup transaction was mined in.
    pub end_block: u64,
}

impl RollupContext {
    /// The block range holding the rollup's `StateChange` events.
    pub fn block_range(&self) -> BlockRange {
        BlockRange::new(self.commitment.start_block, self.end_block)
    }
}

// ---------------------------------------------------------------------------
// Fetcher
// ---------------------------------------------------------------------------

/// Reads rollup commitments and state-change records from a [`LedgerClient`].
#[derive(Debug)]
pub struct StateChangeFetcher<L> {
    ledger: L,
    config: FetcherConfig,
}

impl<L: LedgerClient> StateChangeFetcher<L> {
    /// Create a fetcher.
    ///
    /// # Errors
    ///
    /// Returns `RelayError::Config` if `query_size` is zero.
    pub fn new(ledger: L, config: FetcherConfig) -> Result<Self, RelayError> {
        if config.query_size == 0 {
            return Err(RelayError::Config("query size must be at least 1".to_string()));
        }
        Ok(Self { ledger, config })
    }

    /// The underlying ledger client.
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Active settings.
    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    /// Read the rollup receipt and decode its commitment.
    ///
    /// The epoch always comes from the `Rollup` event. The commitment comes
    /// from the configured commitment event, which may be `Rollup` itself.
    ///
    /// # Errors
    ///
    /// `RelayError::MissingEvent` if either event is absent, plus any fetch
    /// or decoding error.
    pub async fn fetch_commitment(
        &self,
        tx_hash: B256,
        cancel: &CancellationToken,
    ) -> Result<RollupContext, RelayError> {
        let ledger = &self.ledger;
        let receipt = self
            .config
            .retry
            .run(FetchScope::Receipt(tx_hash), cancel, move || {
                ledger.transaction_receipt(tx_hash)
            })
            .await?;

        let rollup_log = receipt
            .find_log(CommitmentEvent::Rollup.topic())
            .ok_or(RelayError::MissingEvent {
                event: CommitmentEvent::Rollup.name(),
                tx_hash,
            })?;
        let epoch = RollupCommitment::decode(&rollup_log.data)?.nonce;

        let event = self.config.commitment_event;
        let commitment_log = match event {
            CommitmentEvent::Rollup => rollup_log,
            CommitmentEvent::InitiateRollup => {
                receipt
                    .find_log(event.topic())
                    .ok_or(RelayError::MissingEvent {
                        event: event.name(),
                        tx_hash,
                    })?
            }
        };
        let commitment = RollupCommitment::decode(&commitment_log.data)?;
        let contract = receipt.to.unwrap_or(rollup_log.address);

        tracing::info!(
            tx = %tx_hash,
            %contract,
            epoch,
            event = event.name(),
            dest_domain = %commitment.dest_domain_id,
            batch_size = commitment.batch_size,
            start_block = commitment.start_block,
            end_block = receipt.block_number,
            "rollup commitment decoded"
        );

        Ok(RollupContext {
            tx_hash,
            commitment,
            epoch,
            contract,
            end_block: receipt.block_number,
        })
    }

    /// Fetch the rollup's records using the configured discovery mode.
    pub async fn fetch_records(
        &self,
        ctx: &RollupContext,
        cancel: &CancellationToken,
    ) -> Result<Vec<StateChangeRecord>, RelayError> {
        let records = match self.config.discovery {
            DiscoveryMode::EventScan => {
                self.scan_events(ctx.contract, ctx.block_range(), cancel)
                    .await?
            }
            DiscoveryMode::IndexedPull => self.pull_indexed(ctx.contract, ctx.epoch, cancel).await?,
        };
        tracing::info!(
            discovery = %self.config.discovery,
            records = records.len(),
            "state changes fetched"
        );
        Ok(records)
    }

    /// Collect `StateChange` records emitted by `contract` within `range`.
    pub async fn scan_events(
        &self,
        contract: Address,
        range: BlockRange,
        cancel: &CancellationToken,
    ) -> Result<Vec<StateChangeRecord>, RelayError> {
        let ledger = &self.ledger;
        let mut records = Vec::new();
        for chunk in range.chunks(self.config.query_size) {
            if cancel.is_cancelled() {
                return Err(RelayError::Cancelled);
            }
            let scope = FetchScope::Blocks {
                start: chunk.start,
                end: chunk.end,
            };
            let logs = self
                .config
                .retry
                .run(scope, cancel, move || {
                    ledger.query_events(contract, STATE_CHANGE_TOPIC, chunk)
                })
                .await?;
            tracing::debug!(
                start = chunk.start,
                end = chunk.end,
                logs = logs.len(),
                "scanned block range"
            );
            for log in &logs {
                records.push(decode_state_change(&log.data)?);
            }
        }
        Ok(records)
    }

    /// Pull every record of `epoch` by index.
    pub async fn pull_indexed(
        &self,
        contract: Address,
        epoch: u64,
        cancel: &CancellationToken,
    ) -> Result<Vec<StateChangeRecord>, RelayError> {
        let ledger = &self.ledger;
        let retry = self.config.retry;
        let size = self.config.query_size;

        let total = retry
            .run(FetchScope::Total { epoch }, cancel, move || {
                ledger.total_records(contract, epoch)
            })
            .await?;
        tracing::debug!(epoch, total, "epoch record count");

        let mut records = Vec::new();
        let mut start = 0u64;
        while start <= total {
            if cancel.is_cancelled() {
                return Err(RelayError::Cancelled);
            }
            let scope = FetchScope::Page { epoch, start, size };
            let page = retry
                .run(scope, cancel, move || {
                    ledger.query_paged(contract, epoch, start, size)
                })
                .await?;
            tracing::debug!(epoch, start, size, records = page.len(), "pulled page");
            records.extend(page);
            start = match start.checked_add(size) {
                Some(next) => next,
                None => break,
            };
        }
        if records.len() as u64 != total {
            tracing::warn!(
                epoch,
                expected = total,
                actual = records.len(),
                "pulled record count differs from the epoch total"
            );
        }
        Ok(records)
    }
}
