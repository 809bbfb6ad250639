//! # ABI Reference Vector Tests
//!
//! These tests pin the exact bytes of every canonical layout the relay
//! produces. The destination verifier decodes these layouts independently, so
//! any drift here breaks interoperability even if the relay stays internally
//! consistent.
//!
//! Expected values follow the Solidity ABI head/tail rules and are written one
//! 32-byte word per line.

use relay_core::{
    chain_link_preimage, encode_state_change, Batch, BatchLayout, DomainId, EncodedBatch,
    ResourceId, RollupCommitment, StateChangeRecord, EMPTY_DIGEST,
};

use alloy_primitives::{hex, B256};

fn words(ws: &[&str]) -> Vec<u8> {
    let joined: String = ws.concat();
    assert_eq!(joined.len() % 64, 0, "vector must be whole words");
    hex::decode(joined).expect("valid hex vector")
}

const ZERO: &str = "0000000000000000000000000000000000000000000000000000000000000000";
const ONE: &str = "0000000000000000000000000000000000000000000000000000000000000001";
const W20: &str = "0000000000000000000000000000000000000000000000000000000000000020";
const W40: &str = "0000000000000000000000000000000000000000000000000000000000000040";
const W80: &str = "0000000000000000000000000000000000000000000000000000000000000080";
const A_PADDED: &str = "6100000000000000000000000000000000000000000000000000000000000000";

fn record_one_a() -> StateChangeRecord {
    StateChangeRecord::new(StateChangeRecord::uint_key(1), b"a".to_vec())
}

// ---------------------------------------------------------------------------
// Batch layouts
// ---------------------------------------------------------------------------

#[test]
fn test_bytes_key_batch_layout() {
    let batch = Batch {
        index: 0,
        records: vec![record_one_a()],
    };
    let encoded = EncodedBatch::encode(&batch, BatchLayout::BytesKey);
    let expected = words(&[
        ZERO, // index
        W40,  // offset of records
        ONE,  // records.length
        W20,  // offset of records[0]
        W40,  // offset of key within tuple
        W80,  // offset of value within tuple
        W20,  // key.length
        ONE,  // key
        ONE,  // value.length
        A_PADDED,
    ]);
    assert_eq!(encoded.as_bytes(), expected.as_slice());
}

#[test]
fn test_empty_batch_layout() {
    let batch = Batch {
        index: 5,
        records: vec![],
    };
    let encoded = EncodedBatch::encode(&batch, BatchLayout::BytesKey);
    let five = "0000000000000000000000000000000000000000000000000000000000000005";
    assert_eq!(encoded.as_bytes(), words(&[five, W40, ZERO]).as_slice());
}

// ---------------------------------------------------------------------------
// Hash-chain link
// ---------------------------------------------------------------------------

#[test]
fn test_chain_link_preimage_layout() {
    let preimage = chain_link_preimage(&EMPTY_DIGEST, &record_one_a());
    let expected = words(&[
        W40,  // offset of acc
        W80,  // offset of record tuple
        W20,  // acc.length
        ZERO, // acc
        W40,  // offset of key within tuple
        W80,  // offset of value within tuple
        W20,  // key.length
        ONE,  // key
        ONE,  // value.length
        A_PADDED,
    ]);
    assert_eq!(preimage, expected);
}

// ---------------------------------------------------------------------------
// Event payloads
// ---------------------------------------------------------------------------

#[test]
fn test_state_change_event_layout() {
    let data = encode_state_change(&record_one_a());
    let expected = words(&[W20, W40, W80, W20, ONE, ONE, A_PADDED]);
    assert_eq!(data, expected);
}

#[test]
fn test_rollup_event_layout() {
    let commitment = RollupCommitment {
        dest_domain_id: DomainId(1),
        resource_id: ResourceId(B256::ZERO),
        nonce: 1,
        batch_size: 2,
        start_block: 0x40,
        committed_digest: EMPTY_DIGEST,
    };
    let two = "0000000000000000000000000000000000000000000000000000000000000002";
    let expected = words(&[ONE, ZERO, ONE, two, W40, ZERO]);
    assert_eq!(commitment.encode(), expected);
    assert_eq!(RollupCommitment::decode(&expected).unwrap(), commitment);
}
