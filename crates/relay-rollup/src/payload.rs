//! # Proof Payloads
//!
//! A `ProofPayload` is everything the destination verifier needs to accept
//! one batch: the rollup identity, the batch index, the encoded batch bytes,
//! the batch's Merkle proof, and the root. A `RelayPlan` holds one payload
//! per batch, in batch order.
//!
//! Payload verification re-runs the destination's checks offline: the bytes
//! must be a canonical encoding of the declared batch index and the proof
//! must lead from `keccak256(bytes)` to the root.

use alloy_primitives::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use relay_core::{
    BatchLayout, Digest, DomainId, EncodedBatch, EncodingError, ResourceId, RollupCommitment,
};
use relay_crypto::{leaf_hash, verify_proof};

/// Error from offline payload verification.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PayloadError {
    /// The batch bytes are malformed or non-canonical.
    #[error("batch {batch_index}: {source}")]
    Encoding {
        /// Declared batch index.
        batch_index: u64,
        /// Decoding failure.
        #[source]
        source: EncodingError,
    },

    /// The encoded batch carries a different index than the payload.
    #[error("payload declares batch {declared} but encodes batch {encoded}")]
    IndexMismatch {
        /// Index in the payload.
        declared: u64,
        /// Index inside the encoded bytes.
        encoded: u64,
    },

    /// The Merkle proof does not lead to the root.
    #[error("batch {batch_index}: merkle proof does not reach root {root}")]
    InvalidProof {
        /// Declared batch index.
        batch_index: u64,
        /// Root the proof was checked against.
        root: Digest,
    },

    /// A payload names a different root than the plan.
    #[error("batch {batch_index}: root {actual} differs from plan root {expected}")]
    RootMismatch {
        /// Declared batch index.
        batch_index: u64,
        /// Root of the plan.
        expected: Digest,
        /// Root in the payload.
        actual: Digest,
    },

    /// The plan has payloads but no root.
    #[error("plan has {payloads} payloads but no root")]
    MissingRoot {
        /// Number of payloads.
        payloads: usize,
    },

    /// The plan has a root but no payloads.
    #[error("plan has root {0} but no payloads")]
    UnexpectedRoot(Digest),

    /// A payload names a different rollup than the plan's commitment.
    #[error("batch {batch_index}: {field} differs from the commitment")]
    IdentityMismatch {
        /// Declared batch index.
        batch_index: u64,
        /// Mismatching field.
        field: &'static str,
    },

    /// Payload indices are not dense and 0-based.
    #[error("payload at position {position} has batch index {batch_index}")]
    OutOfOrder {
        /// Position in the plan.
        position: usize,
        /// Declared batch index.
        batch_index: u64,
    },
}

/// Submission payload for one batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofPayload {
    /// Destination domain.
    pub dest_domain_id: DomainId,
    /// Bridged resource.
    pub resource_id: ResourceId,
    /// Rollup nonce.
    pub nonce: u64,
    /// Batch position.
    pub batch_index: u64,
    /// Canonical batch encoding.
    pub encoded_batch: Bytes,
    /// Siblings from the batch leaf to the root.
    pub merkle_proof: Vec<Digest>,
    /// Root over every batch of the rollup.
    pub root_hash: Digest,
}

impl ProofPayload {
    /// Check the payload the way the destination verifier would.
    pub fn verify(&self, layout: BatchLayout) -> Result<(), PayloadError> {
        let (encoded, batch) =
            EncodedBatch::from_wire(&self.encoded_batch, layout).map_err(|source| {
                PayloadError::Encoding {
                    batch_index: self.batch_index,
                    source,
                }
            })?;
        if batch.index != self.batch_index {
            return Err(PayloadError::IndexMismatch {
                declared: self.batch_index,
                encoded: batch.index,
            });
        }
        if !verify_proof(leaf_hash(&encoded), &self.merkle_proof, self.root_hash) {
            return Err(PayloadError::InvalidProof {
                batch_index: self.batch_index,
                root: self.root_hash,
            });
        }
        Ok(())
    }
}

/// Output of a relay run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayPlan {
    /// The commitment the payloads were derived from.
    pub commitment: RollupCommitment,
    /// Batch size in effect.
    pub batch_size: u64,
    /// Layout of `encoded_batch` in every payload.
    pub layout: BatchLayout,
    /// Number of records after reconciliation.
    pub record_count: usize,
    /// Merkle root, or `None` when there are no records.
    pub root: Option<Digest>,
    /// One payload per batch, in batch order.
    pub payloads: Vec<ProofPayload>,
}

impl RelayPlan {
    /// Returns true if the plan has nothing to submit.
    pub fn is_empty(&self) -> bool {
        self.payloads.is_empty()
    }

    /// Verify every payload and their agreement with the plan root and
    /// commitment.
    pub fn verify(&self) -> Result<(), PayloadError> {
        let root = match (self.root, self.payloads.is_empty()) {
            (None, true) => return Ok(()),
            (Some(root), false) => root,
            (Some(root), true) => return Err(PayloadError::UnexpectedRoot(root)),
            (None, false) => {
                return Err(PayloadError::MissingRoot {
                    payloads: self.payloads.len(),
                })
            }
        };
        for (position, payload) in self.payloads.iter().enumerate() {
            if payload.batch_index != position as u64 {
                return Err(PayloadError::OutOfOrder {
                    position,
                    batch_index: payload.batch_index,
                });
            }
            self.check_identity(payload)?;
            if payload.root_hash != root {
                return Err(PayloadError::RootMismatch {
                    batch_index: payload.batch_index,
                    expected: root,
                    actual: payload.root_hash,
                });
            }
            payload.verify(self.layout)?;
        }
        Ok(())
    }

    fn check_identity(&self, payload: &ProofPayload) -> Result<(), PayloadError> {
        let field = if payload.dest_domain_id != self.commitment.dest_domain_id {
            "dest_domain_id"
        } else if payload.resource_id != self.commitment.resource_id {
            "resource_id"
        } else if payload.nonce != self.commitment.nonce {
            "nonce"
        } else {
            return Ok(());
        };
        Err(PayloadError::IdentityMismatch {
            batch_index: payload.batch_index,
            field,
        })
    }
}
