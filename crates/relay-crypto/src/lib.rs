//! # relay-crypto — Cryptographic Primitives
//!
//! Provides the hashing building blocks of the relay pipeline:
//!
//! - **Keccak-256 leaf hashing** computed from `EncodedBatch` (the only valid
//!   leaf input type, so every leaf is a canonical ABI encoding).
//! - **State-change hash chain** that recomputes the source ledger's running
//!   accumulator and rejects record sets that do not fold to the commitment.
//! - **Sorted-pair Merkle tree** with odd-node promotion, per-leaf inclusion
//!   proofs, and stateless proof verification.
//!
//! ## Crate Policy
//!
//! - Depends only on `relay-core` internally.
//! - No mocking of hashing in tests. All tests use real Keccak-256 over real
//!   ABI encodings.
//! - `unsafe` prohibited.

pub mod hash_chain;
pub mod keccak;
pub mod merkle;

pub use hash_chain::{fold, HashChain, HashChainVerifier};
pub use keccak::{hash_sorted_pair, leaf_hash};
pub use merkle::{compute_root, verify_proof, InclusionProof, MerkleTree};
