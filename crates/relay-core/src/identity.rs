//! # Domain Identity Newtypes
//!
//! Newtype wrappers for the identifiers carried by a rollup. These prevent
//! accidental confusion between a destination domain and a nonce (both
//! `uint64` on the wire) or between a resource ID and a digest (both
//! `bytes32`).

use alloy_primitives::B256;
use serde::{Deserialize, Serialize};

/// Identifier of a bridge domain (chain) in the relay network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DomainId(pub u64);

/// Identifier of the bridged resource (token contract mapping).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(pub B256);

impl DomainId {
    /// Access the inner domain number.
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl ResourceId {
    /// Access the inner 32-byte word.
    pub fn as_b256(&self) -> B256 {
        self.0
    }
}

impl std::fmt::Display for DomainId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "domain:{}", self.0)
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "resource:{}", self.0)
    }
}
