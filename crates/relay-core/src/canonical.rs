//! # Canonical Encoding — ABI Byte Production
//!
//! This module defines `EncodedBatch`, the sole construction path for the
//! bytes that are hashed into Merkle leaves and later decoded by the
//! destination verifier, together with the other fixed ABI layouts the relay
//! depends on.
//!
//! ## Security Invariant
//!
//! `EncodedBatch` has a private inner field. It is produced either by
//! [`EncodedBatch::encode`] or by [`EncodedBatch::from_wire`], which decodes
//! and re-encodes its input and rejects anything that does not reproduce the
//! same bytes. Leaf hashing accepts only `&EncodedBatch`, so a leaf can never
//! be computed over non-canonical bytes.
//!
//! ## Layouts
//!
//! | Data | Solidity equivalent |
//! |---|---|
//! | Batch, `bytes-key` | `abi.encode(uint64 index, (bytes,bytes)[] records)` |
//! | Batch, `bytes32-key` | `abi.encode(uint64 index, (bytes32,bytes)[] records)` |
//! | Chain link | `abi.encode(bytes acc, (bytes key, bytes value) record)` |
//! | `StateChange` data | `abi.encode((bytes key, bytes value))` |
//! | `Rollup` data | `abi.encode(uint64, bytes32, uint64, uint64, uint256, bytes32)` |

use std::fmt;
use std::str::FromStr;

use alloy_primitives::{Bytes, B256};
use alloy_sol_types::{sol, SolEvent, SolValue};
use serde::{Deserialize, Serialize};

use crate::digest::Digest;
use crate::error::EncodingError;
use crate::record::{Batch, StateChangeRecord};

sol! {
    /// Key/value pair as emitted by the source contract.
    struct KeyValuePair {
        bytes key;
        bytes value;
    }

    /// Emitted once per mutation on the source ledger.
    event StateChange(KeyValuePair change);

    /// Emitted when a rollup epoch is sealed.
    event Rollup(
        uint64 destDomainID,
        bytes32 resourceID,
        uint64 nonce,
        uint64 batchSize,
        uint256 startBlock,
        bytes32 stateChangeHash
    );

    /// Bridge variant of `Rollup` with the same field layout.
    event InitiateRollup(
        uint64 destDomainID,
        bytes32 resourceID,
        uint64 nonce,
        uint64 batchSize,
        uint256 startBlock,
        bytes32 stateChangeHash
    );
}

/// `topic0` of `StateChange((bytes,bytes))` logs.
pub const STATE_CHANGE_TOPIC: B256 = <StateChange as SolEvent>::SIGNATURE_HASH;

// ---------------------------------------------------------------------------
// Batch layout
// ---------------------------------------------------------------------------

/// Versioned binary layout of an encoded batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BatchLayout {
    /// `(uint64, (bytes, bytes)[])`: keys encoded as dynamic bytes.
    #[default]
    BytesKey,
    /// `(uint64, (bytes32, bytes)[])`: keys encoded as fixed words. Used by
    /// token contracts deployed against the first relay release.
    Bytes32Key,
}

impl BatchLayout {
    /// Returns the layout identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BytesKey => "bytes-key",
            Self::Bytes32Key => "bytes32-key",
        }
    }
}

impl fmt::Display for BatchLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BatchLayout {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "bytes-key" => Ok(Self::BytesKey),
            "bytes32-key" => Ok(Self::Bytes32Key),
            other => Err(EncodingError::UnknownVariant {
                kind: "batch layout",
                value: other.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// EncodedBatch
// ---------------------------------------------------------------------------

/// Canonical ABI bytes of a `(index, records)` batch.
///
/// # Invariants
///
/// - Produced only by [`EncodedBatch::encode`] or [`EncodedBatch::from_wire`].
/// - Identical `Batch` and layout always yield identical bytes.
/// - The bytes always decode back to the batch they were produced from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EncodedBatch(Vec<u8>);

impl EncodedBatch {
    /// Encode a batch under the given layout.
    pub fn encode(batch: &Batch, layout: BatchLayout) -> Self {
        let bytes = match layout {
            BatchLayout::BytesKey => {
                let rows: Vec<(Bytes, Bytes)> = batch
                    .records
                    .iter()
                    .map(|r| (Bytes::copy_from_slice(r.key.as_slice()), r.value.clone()))
                    .collect();
                (batch.index, rows).abi_encode_params()
            }
            BatchLayout::Bytes32Key => {
                let rows: Vec<(B256, Bytes)> = batch
                    .records
                    .iter()
                    .map(|r| (r.key, r.value.clone()))
                    .collect();
                (batch.index, rows).abi_encode_params()
            }
        };
        Self(bytes)
    }

    /// Accept bytes received from elsewhere (a payload file, calldata) after
    /// checking that they are the canonical encoding of some batch.
    ///
    /// # Errors
    ///
    /// Returns `EncodingError` if the bytes do not decode under `layout` or if
    /// re-encoding the decoded batch does not reproduce them.
    pub fn from_wire(bytes: &[u8], layout: BatchLayout) -> Result<(Self, Batch), EncodingError> {
        let batch = decode_batch(bytes, layout)?;
        let encoded = Self::encode(&batch, layout);
        if encoded.as_bytes() != bytes {
            return Err(EncodingError::NonCanonical("batch"));
        }
        Ok((encoded, batch))
    }

    /// Decode the batch these bytes were produced from.
    pub fn decode(&self, layout: BatchLayout) -> Result<Batch, EncodingError> {
        decode_batch(&self.0, layout)
    }

    /// Access the encoded bytes for hashing.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consume into the raw byte vector.
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Returns the length of the encoding.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the encoding is empty. Never true for a real batch.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for EncodedBatch {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

fn decode_batch(bytes: &[u8], layout: BatchLayout) -> Result<Batch, EncodingError> {
    let (index, records) = match layout {
        BatchLayout::BytesKey => {
            let (index, rows) = <(u64, Vec<(Bytes, Bytes)>)>::abi_decode_params(bytes)?;
            let records = rows
                .into_iter()
                .map(|(k, v)| StateChangeRecord::from_parts(&k, v))
                .collect::<Result<Vec<_>, _>>()?;
            (index, records)
        }
        BatchLayout::Bytes32Key => {
            let (index, rows) = <(u64, Vec<(B256, Bytes)>)>::abi_decode_params(bytes)?;
            let records = rows
                .into_iter()
                .map(|(k, v)| StateChangeRecord::new(k, v))
                .collect();
            (index, records)
        }
    };
    Ok(Batch { index, records })
}

// ---------------------------------------------------------------------------
// Hash-chain link and event payloads
// ---------------------------------------------------------------------------

/// Bytes hashed to advance the accumulator by one record:
/// `abi.encode(bytes acc, (bytes key, bytes value) record)`.
pub fn chain_link_preimage(acc: &Digest, record: &StateChangeRecord) -> Vec<u8> {
    (
        Bytes::copy_from_slice(acc.as_bytes()),
        (
            Bytes::copy_from_slice(record.key.as_slice()),
            record.value.clone(),
        ),
    )
        .abi_encode_params()
}

/// Decode the data of a `StateChange` log into a record.
///
/// # Errors
///
/// Returns `EncodingError::Abi` for malformed data and
/// `EncodingError::KeyLength` if the key is not a 32-byte word.
pub fn decode_state_change(data: &[u8]) -> Result<StateChangeRecord, EncodingError> {
    let (key, value) = <(Bytes, Bytes)>::abi_decode(data)?;
    StateChangeRecord::from_parts(&key, value)
}

/// Encode a record as `StateChange` log data, `abi.encode((bytes key, bytes value))`.
pub fn encode_state_change(record: &StateChangeRecord) -> Vec<u8> {
    (
        Bytes::copy_from_slice(record.key.as_slice()),
        record.value.clone(),
    )
        .abi_encode()
}
