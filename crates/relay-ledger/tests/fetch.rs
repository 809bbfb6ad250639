//! Fetcher behavior against the in-memory ledger and a failing stub.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use alloy_primitives::{Address, Bytes, B256};
use tokio_util::sync::CancellationToken;

use relay_core::{
    CommitmentEvent, DomainId, EncodingError, FetchScope, LedgerError, RelayError, ResourceId,
    RollupCommitment, StateChangeRecord, EMPTY_DIGEST, STATE_CHANGE_TOPIC,
};
use relay_ledger::{
    BlockRange, DiscoveryMode, FetcherConfig, InMemoryLedger, LedgerClient, RawLog, RetryPolicy,
    StateChangeFetcher, TxReceipt,
};

const TOKEN: Address = Address::new([0xaa; 20]);
const BRIDGE: Address = Address::new([0xbb; 20]);
const TX: B256 = B256::new([0x11; 32]);

fn rec(n: u64) -> StateChangeRecord {
    StateChangeRecord::new(StateChangeRecord::uint_key(n), format!("v{n}").into_bytes())
}

fn commitment(nonce: u64, start_block: u64) -> RollupCommitment {
    RollupCommitment {
        dest_domain_id: DomainId(2),
        resource_id: ResourceId(B256::new([0x07; 32])),
        nonce,
        batch_size: 2,
        start_block,
        committed_digest: EMPTY_DIGEST,
    }
}

fn receipt(block: u64, logs: Vec<RawLog>) -> TxReceipt {
    TxReceipt {
        tx_hash: TX,
        to: Some(TOKEN),
        block_number: block,
        logs,
    }
}

fn config(query_size: u64, discovery: DiscoveryMode) -> FetcherConfig {
    FetcherConfig {
        query_size,
        retry: RetryPolicy::new(3, Duration::from_millis(1)).unwrap(),
        discovery,
        commitment_event: CommitmentEvent::Rollup,
    }
}

/// Token ledger with one `StateChange` per block in `10..=34` and a rollup at
/// block 34 covering `[10, 34]`.
fn scanned_ledger() -> InMemoryLedger {
    let rollup = RawLog::commitment(TOKEN, CommitmentEvent::Rollup, 34, 0, &commitment(3, 10));
    let mut ledger = InMemoryLedger::new().with_receipt(receipt(34, vec![rollup]));
    for block in 10..=34 {
        ledger = ledger.with_log(RawLog::state_change(TOKEN, block, 0, &rec(block)));
    }
    // Outside the rollup range.
    ledger
        .with_log(RawLog::state_change(TOKEN, 9, 0, &rec(9)))
        .with_log(RawLog::state_change(TOKEN, 35, 0, &rec(35)))
}

// ---------------------------------------------------------------------------
// Commitment discovery
// ---------------------------------------------------------------------------

#[tokio::test]
async fn commitment_decoded_from_rollup_event() {
    let fetcher = StateChangeFetcher::new(scanned_ledger(), FetcherConfig::default()).unwrap();
    let ctx = fetcher
        .fetch_commitment(TX, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(ctx.commitment, commitment(3, 10));
    assert_eq!(ctx.epoch, 3);
    assert_eq!(ctx.contract, TOKEN);
    assert_eq!(ctx.block_range(), BlockRange::new(10, 34));
}

#[tokio::test]
async fn bridge_commitment_uses_initiate_rollup_event() {
    let rollup = RawLog::commitment(TOKEN, CommitmentEvent::Rollup, 50, 0, &commitment(8, 1));
    let mut bridged = commitment(99, 40);
    bridged.batch_size = 16;
    let initiate =
        RawLog::commitment(BRIDGE, CommitmentEvent::InitiateRollup, 50, 1, &bridged);
    let mut r = receipt(50, vec![rollup, initiate]);
    r.to = None;
    let ledger = InMemoryLedger::new().with_receipt(r);

    let cfg = FetcherConfig {
        commitment_event: CommitmentEvent::InitiateRollup,
        ..FetcherConfig::default()
    };
    let fetcher = StateChangeFetcher::new(ledger, cfg).unwrap();
    let ctx = fetcher
        .fetch_commitment(TX, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(ctx.commitment, bridged);
    // Epoch comes from the Rollup event even when the bridge event commits.
    assert_eq!(ctx.epoch, 8);
    // No `to`: falls back to the Rollup log's emitter.
    assert_eq!(ctx.contract, TOKEN);
}

#[tokio::test]
async fn missing_rollup_event_is_reported() {
    let ledger = InMemoryLedger::new().with_receipt(receipt(5, vec![]));
    let fetcher = StateChangeFetcher::new(ledger, FetcherConfig::default()).unwrap();
    let err = fetcher
        .fetch_commitment(TX, &CancellationToken::new())
        .await
        .unwrap_err();
    match err {
        RelayError::MissingEvent { event, tx_hash } => {
            assert_eq!(event, "Rollup");
            assert_eq!(tx_hash, TX);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn unknown_transaction_fails_without_retry() {
    let ledger = InMemoryLedger::new();
    let fetcher = StateChangeFetcher::new(ledger, config(25, DiscoveryMode::EventScan)).unwrap();
    let err = fetcher
        .fetch_commitment(TX, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, RelayError::Ledger { .. }));
    assert_eq!(fetcher.ledger().query_count(), 1);
}

// ---------------------------------------------------------------------------
// Event scan
// ---------------------------------------------------------------------------

#[tokio::test]
async fn event_scan_chunks_range_and_keeps_order() {
    let fetcher =
        StateChangeFetcher::new(scanned_ledger(), config(10, DiscoveryMode::EventScan)).unwrap();
    let cancel = CancellationToken::new();
    let ctx = fetcher.fetch_commitment(TX, &cancel).await.unwrap();
    let records = fetcher.fetch_records(&ctx, &cancel).await.unwrap();

    let expected: Vec<StateChangeRecord> = (10..=34).map(rec).collect();
    assert_eq!(records, expected);
    // One receipt query plus [10,19], [20,29], [30,34].
    assert_eq!(fetcher.ledger().query_count(), 4);
}

#[tokio::test]
async fn event_scan_recovers_from_transient_failures() {
    let ledger = scanned_ledger().with_transient_failures(2);
    let fetcher = StateChangeFetcher::new(ledger, config(25, DiscoveryMode::EventScan)).unwrap();
    let cancel = CancellationToken::new();
    let ctx = fetcher.fetch_commitment(TX, &cancel).await.unwrap();
    let records = fetcher.fetch_records(&ctx, &cancel).await.unwrap();
    assert_eq!(records.len(), 25);
}

#[tokio::test]
async fn event_scan_rejects_short_keys() {
    let bad = RawLog {
        address: TOKEN,
        topics: vec![STATE_CHANGE_TOPIC],
        data: Bytes::from(state_change_data(&[0x01; 20], b"x")),
        block_number: 3,
        log_index: 0,
    };
    let ledger = InMemoryLedger::new().with_log(bad);
    let fetcher = StateChangeFetcher::new(ledger, FetcherConfig::default()).unwrap();
    let err = fetcher
        .scan_events(TOKEN, BlockRange::new(0, 10), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RelayError::Encoding(EncodingError::KeyLength(20))
    ));
}

/// `abi.encode((bytes key, bytes value))` built by hand.
fn state_change_data(key: &[u8], value: &[u8]) -> Vec<u8> {
    fn word(n: usize) -> [u8; 32] {
        let mut w = [0u8; 32];
        w[24..].copy_from_slice(&(n as u64).to_be_bytes());
        w
    }
    fn padded(bytes: &[u8]) -> Vec<u8> {
        let mut out = bytes.to_vec();
        out.resize(bytes.len().div_ceil(32) * 32, 0);
        out
    }
    let key_tail = [word(key.len()).to_vec(), padded(key)].concat();
    let mut out = Vec::new();
    out.extend_from_slice(&word(0x20));
    out.extend_from_slice(&word(0x40));
    out.extend_from_slice(&word(0x40 + key_tail.len()));
    out.extend_from_slice(&key_tail);
    out.extend_from_slice(&word(value.len()));
    out.extend_from_slice(&padded(value));
    out
}

// ---------------------------------------------------------------------------
// Indexed pull
// ---------------------------------------------------------------------------

#[tokio::test]
async fn indexed_pull_reads_pages_until_past_total() {
    let records: Vec<StateChangeRecord> = (0..4).map(rec).collect();
    let rollup = RawLog::commitment(TOKEN, CommitmentEvent::Rollup, 9, 0, &commitment(6, 0));
    let ledger = InMemoryLedger::new()
        .with_receipt(receipt(9, vec![rollup]))
        .with_epoch_records(TOKEN, 6, records.clone());
    let fetcher = StateChangeFetcher::new(ledger, config(2, DiscoveryMode::IndexedPull)).unwrap();
    let cancel = CancellationToken::new();
    let ctx = fetcher.fetch_commitment(TX, &cancel).await.unwrap();
    let pulled = fetcher.fetch_records(&ctx, &cancel).await.unwrap();

    assert_eq!(pulled, records);
    // Receipt, total, then pages at 0, 2, 4 (the last one empty).
    assert_eq!(fetcher.ledger().query_count(), 5);
}

#[tokio::test]
async fn indexed_pull_empty_epoch() {
    let fetcher =
        StateChangeFetcher::new(InMemoryLedger::new(), config(5, DiscoveryMode::IndexedPull))
            .unwrap();
    let pulled = fetcher
        .pull_indexed(TOKEN, 1, &CancellationToken::new())
        .await
        .unwrap();
    assert!(pulled.is_empty());
}

// ---------------------------------------------------------------------------
// Exhaustion and cancellation
// ---------------------------------------------------------------------------

/// Ledger whose event queries always time out.
#[derive(Default)]
struct FlakyLedger {
    event_calls: AtomicU32,
}

impl LedgerClient for FlakyLedger {
    async fn transaction_receipt(&self, _tx_hash: B256) -> Result<TxReceipt, LedgerError> {
        Err(LedgerError::Permanent("not used".into()))
    }

    async fn query_events(
        &self,
        _contract: Address,
        _topic0: B256,
        _range: BlockRange,
    ) -> Result<Vec<RawLog>, LedgerError> {
        self.event_calls.fetch_add(1, Ordering::SeqCst);
        Err(LedgerError::Transient("request timed out".into()))
    }

    async fn query_paged(
        &self,
        _contract: Address,
        _epoch: u64,
        _start: u64,
        _size: u64,
    ) -> Result<Vec<StateChangeRecord>, LedgerError> {
        Ok(Vec::new())
    }

    async fn total_records(&self, _contract: Address, _epoch: u64) -> Result<u64, LedgerError> {
        Ok(0)
    }
}

#[tokio::test]
async fn always_failing_ledger_exhausts_configured_attempts() {
    let fetcher =
        StateChangeFetcher::new(FlakyLedger::default(), config(10, DiscoveryMode::EventScan))
            .unwrap();
    let err = fetcher
        .scan_events(TOKEN, BlockRange::new(100, 150), &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(fetcher.ledger().event_calls.load(Ordering::SeqCst), 3);
    match err {
        RelayError::FetchExhausted {
            scope,
            attempts,
            last_error,
        } => {
            assert_eq!(scope, FetchScope::Blocks { start: 100, end: 109 });
            assert_eq!(attempts, 3);
            assert!(last_error.is_transient());
        }
        other => panic!("unexpected error: {other}"),
    }
}

/// Reports `total` records per epoch but serves at most `served` of them.
/// With `served == None` every page read fails permanently.
struct MiscountingLedger {
    total: u64,
    served: Option<u64>,
    page_calls: AtomicU32,
}

impl LedgerClient for MiscountingLedger {
    async fn transaction_receipt(&self, _tx_hash: B256) -> Result<TxReceipt, LedgerError> {
        Err(LedgerError::Permanent("not used".into()))
    }

    async fn query_events(
        &self,
        _contract: Address,
        _topic0: B256,
        _range: BlockRange,
    ) -> Result<Vec<RawLog>, LedgerError> {
        Err(LedgerError::Permanent("not used".into()))
    }

    async fn query_paged(
        &self,
        _contract: Address,
        _epoch: u64,
        start: u64,
        size: u64,
    ) -> Result<Vec<StateChangeRecord>, LedgerError> {
        self.page_calls.fetch_add(1, Ordering::SeqCst);
        let served = self
            .served
            .ok_or_else(|| LedgerError::Permanent("execution reverted".into()))?;
        Ok((start..served.min(start.saturating_add(size))).map(rec).collect())
    }

    async fn total_records(&self, _contract: Address, _epoch: u64) -> Result<u64, LedgerError> {
        Ok(self.total)
    }
}

#[tokio::test]
async fn huge_reported_total_fails_on_first_page() {
    let ledger = MiscountingLedger {
        total: u64::MAX / 2,
        served: None,
        page_calls: AtomicU32::new(0),
    };
    let fetcher = StateChangeFetcher::new(ledger, config(10, DiscoveryMode::IndexedPull)).unwrap();
    let err = fetcher
        .pull_indexed(TOKEN, 1, &CancellationToken::new())
        .await
        .unwrap_err();

    match err {
        RelayError::Ledger { scope, source } => {
            assert_eq!(
                scope,
                FetchScope::Page {
                    epoch: 1,
                    start: 0,
                    size: 10
                }
            );
            assert!(!source.is_transient());
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(fetcher.ledger().page_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn short_indexed_read_returns_what_was_served() {
    let ledger = MiscountingLedger {
        total: 10,
        served: Some(3),
        page_calls: AtomicU32::new(0),
    };
    let fetcher = StateChangeFetcher::new(ledger, config(5, DiscoveryMode::IndexedPull)).unwrap();
    let records = fetcher
        .pull_indexed(TOKEN, 1, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(records, (0..3).map(rec).collect::<Vec<_>>());
    // Pages at 0, 5, 10.
    assert_eq!(fetcher.ledger().page_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn cancelled_fetch_returns_no_records() {
    let fetcher =
        StateChangeFetcher::new(scanned_ledger(), config(1, DiscoveryMode::EventScan)).unwrap();
    let cancel = CancellationToken::new();
    let ctx = fetcher.fetch_commitment(TX, &cancel).await.unwrap();
    cancel.cancel();
    let err = fetcher.fetch_records(&ctx, &cancel).await.unwrap_err();
    assert!(matches!(err, RelayError::Cancelled));
    assert_eq!(fetcher.ledger().query_count(), 1);
}

#[test]
fn zero_query_size_rejected() {
    let err = StateChangeFetcher::new(InMemoryLedger::new(), config(0, DiscoveryMode::EventScan))
        .unwrap_err();
    assert!(matches!(err, RelayError::Config(_)));
}
