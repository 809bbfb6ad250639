//! # relay-ledger — Source-Ledger Access
//!
//! Everything the relay needs to read from the source ledger:
//!
//! - **`LedgerClient`**: the async query interface (receipts, event logs,
//!   indexed record pages, record counts).
//! - **`RetryPolicy`**: bounded fixed-delay retry of transient failures with
//!   cancellation during back-off.
//! - **`StateChangeFetcher`**: commitment discovery from the rollup receipt and
//!   record collection by event scan or indexed pull.
//! - **`InMemoryLedger`**: a snapshot-backed client for tests and offline runs.
//!
//! ## Crate Policy
//!
//! - Depends only on `relay-core` internally.
//! - The fetcher performs all relay I/O; no other crate talks to a ledger.
//! - Accumulated records are discarded on any fetch failure.

pub mod fetcher;
pub mod ledger;
pub mod memory;
pub mod retry;

pub use fetcher::{
    DiscoveryMode, FetcherConfig, RollupContext, StateChangeFetcher, DEFAULT_QUERY_SIZE,
};
pub use ledger::{BlockChunks, BlockRange, LedgerClient, RawLog, TxReceipt};
pub use memory::{EpochRecords, InMemoryLedger, LedgerSnapshot, SnapshotError};
pub use retry::{RetryPolicy, DEFAULT_ATTEMPTS, DEFAULT_INTERVAL_MS};
