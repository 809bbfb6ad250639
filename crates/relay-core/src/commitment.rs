//! # Rollup Commitment
//!
//! The `RollupCommitment` is decoded from a single source-ledger event and is
//! the contract the rest of the pipeline must satisfy: where the records
//! start, how they are batched, and which digest they must fold to.

use alloy_primitives::{B256, U256};
use alloy_sol_types::{SolEvent, SolValue};
use serde::{Deserialize, Serialize};

use crate::canonical::{InitiateRollup, Rollup};
use crate::digest::Digest;
use crate::error::EncodingError;
use crate::identity::{DomainId, ResourceId};

/// Which event in the rollup receipt carries the commitment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommitmentEvent {
    /// `Rollup(...)`, emitted by token contracts.
    #[default]
    Rollup,
    /// `InitiateRollup(...)`, emitted by bridge contracts.
    InitiateRollup,
}

impl CommitmentEvent {
    /// Event name as declared in the contract ABI.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Rollup => "Rollup",
            Self::InitiateRollup => "InitiateRollup",
        }
    }

    /// `topic0` of the event.
    pub fn topic(&self) -> B256 {
        match self {
            Self::Rollup => Rollup::SIGNATURE_HASH,
            Self::InitiateRollup => InitiateRollup::SIGNATURE_HASH,
        }
    }
}

impl std::fmt::Display for CommitmentEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Rollup => "rollup",
            Self::InitiateRollup => "initiate-rollup",
        })
    }
}

impl std::str::FromStr for CommitmentEvent {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "rollup" => Ok(Self::Rollup),
            "initiate-rollup" => Ok(Self::InitiateRollup),
            other => Err(EncodingError::UnknownVariant {
                kind: "commitment event",
                value: other.to_string(),
            }),
        }
    }
}

/// The commitment a rollup makes to its state changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollupCommitment {
    /// Destination domain.
    pub dest_domain_id: DomainId,
    /// Bridged resource.
    pub resource_id: ResourceId,
    /// Rollup nonce (the epoch for indexed-pull discovery).
    pub nonce: u64,
    /// Records per batch. Validated as positive by the batcher.
    pub batch_size: u64,
    /// First block of the rollup's event range.
    pub start_block: u64,
    /// Digest the fetched records must fold to.
    pub committed_digest: Digest,
}

type RollupFields = (u64, B256, u64, u64, U256, B256);

impl RollupCommitment {
    /// Decode `Rollup`/`InitiateRollup` log data.
    ///
    /// # Errors
    ///
    /// Returns `EncodingError::Abi` for malformed data and
    /// `EncodingError::StartBlockOverflow` if the start block is not a valid
    /// 64-bit block number.
    pub fn decode(data: &[u8]) -> Result<Self, EncodingError> {
        let (dest, resource, nonce, batch_size, start_block, digest) =
            RollupFields::abi_decode_params(data)?;
        let start_block =
            u64::try_from(start_block).map_err(|_| EncodingError::StartBlockOverflow(start_block))?;
        Ok(Self {
            dest_domain_id: DomainId(dest),
            resource_id: ResourceId(resource),
            nonce,
            batch_size,
            start_block,
            committed_digest: Digest::from(digest),
        })
    }

    /// Encode as `Rollup`/`InitiateRollup` log data.
    pub fn encode(&self) -> Vec<u8> {
        let fields: RollupFields = (
            self.dest_domain_id.get(),
            self.resource_id.as_b256(),
            self.nonce,
            self.batch_size,
            U256::from(self.start_block),
            self.committed_digest.as_b256(),
        );
        fields.abi_encode_params()
    }
}
