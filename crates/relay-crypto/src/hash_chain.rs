//! # State-Change Hash Chain
//!
//! The source ledger commits to the exact content and order of a rollup's
//! state changes by folding each record into a running Keccak-256
//! accumulator:
//!
//! ```text
//! acc_0     = EMPTY_DIGEST
//! acc_{i+1} = keccak256(abi.encode(bytes acc_i, (bytes key, bytes value) r_i))
//! ```
//!
//! The relay recomputes the fold over the records it fetched and refuses to
//! batch anything unless the result equals the committed digest. Reordering,
//! dropping, duplicating, or mutating a single byte of any record changes the
//! final accumulator.

use relay_core::{
    chain_link_preimage, keccak256_digest, Digest, RelayError, StateChangeRecord, EMPTY_DIGEST,
};

/// Incremental hash-chain accumulator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashChain {
    acc: Digest,
    len: usize,
}

impl HashChain {
    /// Start a chain at [`EMPTY_DIGEST`].
    pub fn new() -> Self {
        Self {
            acc: EMPTY_DIGEST,
            len: 0,
        }
    }

    /// Fold one record into the accumulator and return the new value.
    pub fn push(&mut self, record: &StateChangeRecord) -> Digest {
        self.acc = keccak256_digest(chain_link_preimage(&self.acc, record));
        self.len += 1;
        self.acc
    }

    /// Current accumulator value.
    pub fn digest(&self) -> Digest {
        self.acc
    }

    /// Number of records folded so far.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if no record has been folded.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for HashChain {
    fn default() -> Self {
        Self::new()
    }
}

/// Fold an ordered record sequence into its chain digest.
pub fn fold<'a>(records: impl IntoIterator<Item = &'a StateChangeRecord>) -> Digest {
    let mut chain = HashChain::new();
    for record in records {
        chain.push(record);
    }
    chain.digest()
}

/// Checks fetched records against a committed chain digest.
#[derive(Debug, Clone, Copy)]
pub struct HashChainVerifier {
    committed: Digest,
}

impl HashChainVerifier {
    /// Create a verifier for the digest committed by the source ledger.
    pub fn new(committed: Digest) -> Self {
        Self { committed }
    }

    /// The digest records must fold to.
    pub fn committed(&self) -> Digest {
        self.committed
    }

    /// Fold `records` and compare with the committed digest.
    ///
    /// # Errors
    ///
    /// Returns `RelayError::HashChainMismatch` with both digests if the fold
    /// differs. The mismatch is structural; retrying cannot fix it.
    pub fn verify(&self, records: &[StateChangeRecord]) -> Result<(), RelayError> {
        let actual = fold(records);
        if actual != self.committed {
            tracing::error!(
                expected = %self.committed,
                actual = %actual,
                records = records.len(),
                "state-change hash chain mismatch"
            );
            return Err(RelayError::HashChainMismatch {
                expected: self.committed,
                actual,
                records: records.len(),
            });
        }
        tracing::debug!(digest = %actual, records = records.len(), "hash chain verified");
        Ok(())
    }
}
