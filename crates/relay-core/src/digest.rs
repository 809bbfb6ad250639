//! # Digest — 32-Byte Keccak-256 Values
//!
//! Defines `Digest`, the single hash type flowing through the relay: hash-chain
//! accumulators, batch leaf hashes, Merkle nodes, and the committed digest of a
//! rollup all share it.
//!
//! ## Ordering
//!
//! `Digest` carries an explicit total order: byte-wise lexicographic
//! comparison of the 32 bytes. Because the bytes are big-endian, this is the
//! same order as comparing the digests as unsigned 256-bit integers. The
//! sorted-pair Merkle rule and key sorting both rely on this order.

use std::fmt;
use std::str::FromStr;

use alloy_primitives::{hex, keccak256, B256};
use serde::{Deserialize, Serialize};

use crate::error::EncodingError;

/// Length of a digest in bytes.
pub const DIGEST_LEN: usize = 32;

/// The all-zero digest: the initial state of the hash-chain accumulator.
pub const EMPTY_DIGEST: Digest = Digest(B256::ZERO);

/// A 32-byte Keccak-256 digest.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Digest(B256);

impl Digest {
    /// Wrap raw digest bytes.
    pub const fn new(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(B256::new(bytes))
    }

    /// The raw 32 bytes.
    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0 .0
    }

    /// The digest as an alloy `B256` word, for ABI encoding.
    pub fn as_b256(&self) -> B256 {
        self.0
    }

    /// Returns true for [`EMPTY_DIGEST`].
    pub fn is_empty(&self) -> bool {
        self.0 == B256::ZERO
    }

    /// Render the digest as lowercase hex without a `0x` prefix.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse a 64-char hex string, with or without a `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, EncodingError> {
        B256::from_str(s.trim())
            .map(Self)
            .map_err(|e| EncodingError::InvalidHex(format!("{s}: {e}")))
    }
}

impl From<B256> for Digest {
    fn from(value: B256) -> Self {
        Self(value)
    }
}

impl From<[u8; DIGEST_LEN]> for Digest {
    fn from(value: [u8; DIGEST_LEN]) -> Self {
        Self::new(value)
    }
}

impl From<Digest> for B256 {
    fn from(value: Digest) -> Self {
        value.0
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        self.0.as_slice()
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl FromStr for Digest {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

/// Compute the Keccak-256 digest of arbitrary bytes.
///
/// Callers hashing batches should go through `relay_crypto::leaf_hash`, which
/// only accepts an `EncodedBatch`.
pub fn keccak256_digest(data: impl AsRef<[u8]>) -> Digest {
    Digest(keccak256(data))
}
