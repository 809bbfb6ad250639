//! # Relay Orchestrator
//!
//! Drives one rollup through the pipeline:
//!
//! ```text
//! fetch commitment -> validate batch size -> fetch records
//!   -> reconcile -> batch -> encode -> commit -> proof payloads
//! ```
//!
//! Each stage consumes the previous stage's output. The first failure aborts
//! the run and nothing partial is returned. Only the two fetch stages touch
//! the ledger; [`plan`] runs everything after them without I/O.

use alloy_primitives::{Bytes, B256};
use tokio_util::sync::CancellationToken;

use relay_core::{EncodedBatch, RelayError, RollupCommitment, StateChangeRecord};
use relay_crypto::MerkleTree;
use relay_ledger::{LedgerClient, StateChangeFetcher};

use crate::batcher::{partition, validate_batch_size};
use crate::config::RelayConfig;
use crate::payload::{ProofPayload, RelayPlan};
use crate::reconcile::reconcile;

/// Runs relay pipelines against one ledger.
#[derive(Debug)]
pub struct RelayOrchestrator<L> {
    fetcher: StateChangeFetcher<L>,
    config: RelayConfig,
}

impl<L: LedgerClient> RelayOrchestrator<L> {
    /// Validate `config` and build an orchestrator over `ledger`.
    pub fn new(ledger: L, config: RelayConfig) -> Result<Self, RelayError> {
        config.validate()?;
        let fetcher = StateChangeFetcher::new(ledger, config.fetcher_config()?)?;
        Ok(Self { fetcher, config })
    }

    /// Active settings.
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// The fetcher and, through it, the ledger.
    pub fn fetcher(&self) -> &StateChangeFetcher<L> {
        &self.fetcher
    }

    /// Relay the rollup made by transaction `tx_hash`.
    pub async fn relay(
        &self,
        tx_hash: B256,
        cancel: &CancellationToken,
    ) -> Result<RelayPlan, RelayError> {
        tracing::info!(tx = %tx_hash, "relay started");
        let ctx = self.fetcher.fetch_commitment(tx_hash, cancel).await?;
        validate_batch_size(effective_batch_size(&ctx.commitment, &self.config))?;
        let records = self.fetcher.fetch_records(&ctx, cancel).await?;
        let plan = plan(&ctx.commitment, records, &self.config)?;
        tracing::info!(
            tx = %tx_hash,
            batches = plan.payloads.len(),
            root = ?plan.root,
            "relay plan ready"
        );
        Ok(plan)
    }

    /// Run the post-fetch stages over already fetched records.
    pub fn plan(
        &self,
        commitment: &RollupCommitment,
        records: Vec<StateChangeRecord>,
    ) -> Result<RelayPlan, RelayError> {
        plan(commitment, records, &self.config)
    }
}

fn effective_batch_size(commitment: &RollupCommitment, config: &RelayConfig) -> u64 {
    config.batch_size.unwrap_or(commitment.batch_size)
}

/// Reconcile, batch, encode, and commit `records`, then assemble one payload
/// per batch. An empty record set yields an empty plan with no root.
pub fn plan(
    commitment: &RollupCommitment,
    records: Vec<StateChangeRecord>,
    config: &RelayConfig,
) -> Result<RelayPlan, RelayError> {
    let batch_size = validate_batch_size(effective_batch_size(commitment, config))?.get();
    if batch_size != commitment.batch_size {
        tracing::warn!(
            committed = commitment.batch_size,
            batch_size,
            "batch size override differs from the committed batch size"
        );
    }
    let layout = config.batch_layout;

    let records = reconcile(records, commitment.committed_digest, config.record_policy)?;
    let batches = partition(&records, batch_size)?;
    tracing::info!(records = records.len(), batch_size, batches = batches.len(), "records batched");

    let mut plan = RelayPlan {
        commitment: commitment.clone(),
        batch_size,
        layout,
        record_count: records.len(),
        root: None,
        payloads: Vec::with_capacity(batches.len()),
    };
    if batches.is_empty() {
        tracing::info!("no records to relay");
        return Ok(plan);
    }

    let encoded: Vec<EncodedBatch> = batches
        .iter()
        .map(|batch| EncodedBatch::encode(batch, layout))
        .collect();
    let tree = MerkleTree::from_encoded_batches(&encoded)?;
    let root = tree.root();
    tracing::info!(%root, leaves = tree.len(), %layout, "merkle root computed");

    for (position, (batch, bytes)) in batches.iter().zip(encoded).enumerate() {
        plan.payloads.push(ProofPayload {
            dest_domain_id: commitment.dest_domain_id,
            resource_id: commitment.resource_id,
            nonce: commitment.nonce,
            batch_index: batch.index,
            encoded_batch: Bytes::from(bytes.into_bytes()),
            merkle_proof: tree.proof(position)?,
            root_hash: root,
        });
    }
    plan.root = Some(root);
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_core::{BatchLayout, DomainId, ResourceId, EMPTY_DIGEST};
    use relay_crypto::fold;

    use crate::reconcile::RecordPolicy;

    fn rec(n: u64, v: &str) -> StateChangeRecord {
        StateChangeRecord::new(StateChangeRecord::uint_key(n), v.as_bytes().to_vec())
    }

    fn commitment(batch_size: u64, records: &[StateChangeRecord]) -> RollupCommitment {
        RollupCommitment {
            dest_domain_id: DomainId(1),
            resource_id: ResourceId(B256::new([0x42; 32])),
            nonce: 9,
            batch_size,
            start_block: 0,
            committed_digest: fold(records),
        }
    }

    #[test]
    fn test_empty_records_give_empty_plan() {
        let plan = plan(&commitment(4, &[]), Vec::new(), &RelayConfig::default()).unwrap();
        assert!(plan.is_empty());
        assert_eq!(plan.root, None);
        assert_eq!(plan.record_count, 0);
    }

    #[test]
    fn test_single_batch_root_is_leaf_with_empty_proof() {
        let records = vec![rec(1, "a")];
        let plan = plan(&commitment(8, &records), records, &RelayConfig::default()).unwrap();
        assert_eq!(plan.payloads.len(), 1);
        assert!(plan.payloads[0].merkle_proof.is_empty());
        assert!(plan.verify().is_ok());
    }

    #[test]
    fn test_zero_batch_size_fails_before_reconcile() {
        let records = vec![rec(1, "a")];
        let mut c = commitment(0, &records);
        // A wrong digest would fail reconciliation; batch size is checked first.
        c.committed_digest = EMPTY_DIGEST;
        let err = plan(&c, records, &RelayConfig::default()).unwrap_err();
        assert!(matches!(err, RelayError::InvalidBatchSize(0)));
    }

    #[test]
    fn test_batch_size_override_wins() {
        let records: Vec<_> = (0..6).map(|n| rec(n, "v")).collect();
        let config = RelayConfig {
            batch_size: Some(4),
            ..RelayConfig::default()
        };
        let plan = plan(&commitment(1, &records), records, &config).unwrap();
        assert_eq!(plan.batch_size, 4);
        assert_eq!(plan.commitment.batch_size, 1);
        assert_eq!(plan.payloads.len(), 2);
    }

    #[test]
    fn test_payloads_carry_commitment_identity() {
        let records: Vec<_> = (0..5).map(|n| rec(n, "v")).collect();
        let c = commitment(2, &records);
        let plan = plan(&c, records, &RelayConfig::default()).unwrap();
        for (i, p) in plan.payloads.iter().enumerate() {
            assert_eq!(p.batch_index, i as u64);
            assert_eq!(p.dest_domain_id, c.dest_domain_id);
            assert_eq!(p.resource_id, c.resource_id);
            assert_eq!(p.nonce, c.nonce);
            assert_eq!(Some(p.root_hash), plan.root);
        }
        assert!(plan.verify().is_ok());
    }

    #[test]
    fn test_legacy_layout_and_sorted_policy() {
        let records = vec![rec(3, "c"), rec(1, "a"), rec(2, "b")];
        let config = RelayConfig {
            record_policy: RecordPolicy::SortedByKey,
            batch_layout: BatchLayout::Bytes32Key,
            ..RelayConfig::default()
        };
        let mut c = commitment(2, &records);
        c.committed_digest = EMPTY_DIGEST;
        let plan = plan(&c, records, &config).unwrap();
        let (_, first) =
            EncodedBatch::from_wire(&plan.payloads[0].encoded_batch, BatchLayout::Bytes32Key)
                .unwrap();
        assert_eq!(first.records, vec![rec(1, "a"), rec(2, "b")]);
        assert!(plan.verify().is_ok());
    }
}
