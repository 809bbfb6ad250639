//! # Record Reconciliation
//!
//! Decides which fetched records are batched and in what order.
//!
//! | Policy | Hash chain | Output |
//! |---|---|---|
//! | `verify-chain` | verified | every record, verbatim, in emission order |
//! | `latest-per-key` | skipped | one record per key holding its latest value, in first-seen key order |
//! | `sorted-by-key` | skipped | every record, stably sorted ascending by key |
//!
//! Key order is byte-wise on the 32-byte key, which equals unsigned
//! big-endian integer order.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use relay_core::{Digest, EncodingError, RelayError, StateChangeRecord};
use relay_crypto::HashChainVerifier;

/// How fetched records are reconciled before batching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecordPolicy {
    /// Verify the hash chain and keep every record.
    #[default]
    VerifyChain,
    /// Keep the latest value per key.
    LatestPerKey,
    /// Sort records by key.
    SortedByKey,
}

impl RecordPolicy {
    /// Configuration name of the policy.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VerifyChain => "verify-chain",
            Self::LatestPerKey => "latest-per-key",
            Self::SortedByKey => "sorted-by-key",
        }
    }

    /// Returns true if the policy checks the committed digest.
    pub fn verifies_chain(&self) -> bool {
        matches!(self, Self::VerifyChain)
    }
}

impl fmt::Display for RecordPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordPolicy {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "verify-chain" => Ok(Self::VerifyChain),
            "latest-per-key" => Ok(Self::LatestPerKey),
            "sorted-by-key" => Ok(Self::SortedByKey),
            other => Err(EncodingError::UnknownVariant {
                kind: "record policy",
                value: other.to_string(),
            }),
        }
    }
}

/// Apply `policy` to the fetched records.
///
/// # Errors
///
/// Returns `RelayError::HashChainMismatch` under `verify-chain` when the
/// records do not fold to `committed`.
pub fn reconcile(
    records: Vec<StateChangeRecord>,
    committed: Digest,
    policy: RecordPolicy,
) -> Result<Vec<StateChangeRecord>, RelayError> {
    let fetched = records.len();
    let out = match policy {
        RecordPolicy::VerifyChain => {
            HashChainVerifier::new(committed).verify(&records)?;
            records
        }
        RecordPolicy::LatestPerKey => latest_per_key(records),
        RecordPolicy::SortedByKey => sorted_by_key(records),
    };
    tracing::info!(%policy, fetched, kept = out.len(), "records reconciled");
    Ok(out)
}

/// Deduplicate by key: each key keeps its first position and its last value.
pub fn latest_per_key(records: Vec<StateChangeRecord>) -> Vec<StateChangeRecord> {
    let mut position = HashMap::with_capacity(records.len());
    let mut out: Vec<StateChangeRecord> = Vec::with_capacity(records.len());
    for record in records {
        match position.get(&record.key) {
            Some(&i) => out[i] = record,
            None => {
                position.insert(record.key, out.len());
                out.push(record);
            }
        }
    }
    out
}

/// Stable ascending sort by key.
pub fn sorted_by_key(mut records: Vec<StateChangeRecord>) -> Vec<StateChangeRecord> {
    records.sort_by(|a, b| a.key.cmp(&b.key));
    records
}
