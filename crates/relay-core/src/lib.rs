//! # relay-core — Foundational Types for the Rollup State Relay
//!
//! This crate defines the data model shared by every stage of the relay
//! pipeline. Every other crate in the workspace depends on `relay-core`; it
//! depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Named-field records.** `StateChangeRecord { key, value }` replaces the
//!    ad hoc `(bytes32, bytes)` tuples seen on the wire.
//!
//! 2. **`EncodedBatch` newtype.** Leaf bytes can only be produced through the
//!    canonical ABI encoder, so every leaf hash is computed over bytes the
//!    destination verifier can decode.
//!
//! 3. **Explicit digest order.** `Digest` orders byte-wise, which equals
//!    unsigned big-endian integer order. No implicit big-integer comparison.
//!
//! 4. **One error taxonomy.** `RelayError` covers fetch exhaustion, hash-chain
//!    mismatch, invalid batch size, and encoding failures with full context.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `relay-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod commitment;
pub mod digest;
pub mod error;
pub mod identity;
pub mod record;

// Re-export primary types for ergonomic imports.
pub use canonical::{
    chain_link_preimage, decode_state_change, encode_state_change, BatchLayout, EncodedBatch,
    STATE_CHANGE_TOPIC,
};
pub use commitment::{CommitmentEvent, RollupCommitment};
pub use digest::{keccak256_digest, Digest, DIGEST_LEN, EMPTY_DIGEST};
pub use error::{EncodingError, FetchScope, LedgerError, MerkleError, RelayError};
pub use identity::{DomainId, ResourceId};
pub use record::{Batch, StateChangeRecord};
