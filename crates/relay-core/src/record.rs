//! # State-Change Records and Batches
//!
//! A `StateChangeRecord` is one key/value mutation emitted by the source
//! ledger. Records are immutable once fetched and keep the order in which the
//! source emitted them. Keys are not assumed unique.
//!
//! A `Batch` is an index-labeled, contiguous slice of the verified record
//! sequence, created by the batcher and consumed by the encoder.

use alloy_primitives::{Bytes, B256, U256};
use serde::{Deserialize, Serialize};

use crate::error::EncodingError;

/// One atomic key/value mutation to be replayed on the destination ledger.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateChangeRecord {
    /// Fixed 32-byte key.
    pub key: B256,
    /// Opaque value bytes.
    pub value: Bytes,
}

impl StateChangeRecord {
    /// Create a record from a key word and value bytes.
    pub fn new(key: B256, value: impl Into<Bytes>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }

    /// Create a record from a dynamically sized key, as carried by
    /// `StateChange` event payloads.
    ///
    /// # Errors
    ///
    /// Returns `EncodingError::KeyLength` unless the key is exactly 32 bytes.
    pub fn from_parts(key: &[u8], value: impl Into<Bytes>) -> Result<Self, EncodingError> {
        if key.len() != 32 {
            return Err(EncodingError::KeyLength(key.len()));
        }
        Ok(Self::new(B256::from_slice(key), value))
    }

    /// Key word for an unsigned integer key, i.e. `abi.encode(uint256 n)`.
    pub fn uint_key(n: u64) -> B256 {
        B256::from(U256::from(n))
    }
}

/// An index-labeled partition of the verified record sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    /// Dense, 0-based batch position.
    pub index: u64,
    /// Records in emission order.
    pub records: Vec<StateChangeRecord>,
}

impl Batch {
    /// Number of records in the batch.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the batch has no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
