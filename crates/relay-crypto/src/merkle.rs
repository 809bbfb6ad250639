//! # Sorted-Pair Merkle Tree
//!
//! A binary Merkle tree over batch leaf hashes. The destination verifier
//! accepts any single batch given its encoded bytes, an inclusion proof, and
//! the root.
//!
//! ## Algorithm
//!
//! - Leaf: `keccak256(EncodedBatch)` (computed by [`leaf_hash`]).
//! - Node: `keccak256(min(left, right) || max(left, right))`, the sorted-pair
//!   rule. Children are ordered by unsigned big-endian value before hashing,
//!   so a verifier never needs left/right bookkeeping.
//! - Levels pair adjacent nodes left-to-right. When a level has an odd number
//!   of nodes, the last node is **promoted unchanged** to the next level. It is
//!   not duplicated.
//! - A single-leaf tree has the leaf as its root and an empty proof.
//!
//! ## Proofs
//!
//! `proof(i)` lists sibling digests from the leaf up to the root. A level at
//! which the node on the path was promoted contributes no sibling, so proof
//! lengths may differ between leaves of the same tree.

use serde::{Deserialize, Serialize};

use relay_core::{Digest, EncodedBatch, MerkleError};

use crate::keccak::{hash_sorted_pair, leaf_hash};

// ---------------------------------------------------------------------------
// Tree construction
// ---------------------------------------------------------------------------

/// Compute the next level up from `level`.
fn parent_level(level: &[Digest]) -> Vec<Digest> {
    level
        .chunks(2)
        .map(|pair| match pair {
            [left, right] => hash_sorted_pair(left, right),
            [single] => *single,
            _ => unreachable!("chunks(2) yields one or two nodes"),
        })
        .collect()
}

/// A sorted-pair Merkle tree with every level retained for proof generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleTree {
    /// `levels[0]` holds the leaves, the last level holds only the root.
    levels: Vec<Vec<Digest>>,
}

impl MerkleTree {
    /// Build a tree over leaf hashes in batch order.
    ///
    /// # Errors
    ///
    /// Returns `MerkleError::EmptyTree` if `leaves` is empty.
    pub fn from_leaves(leaves: Vec<Digest>) -> Result<Self, MerkleError> {
        if leaves.is_empty() {
            return Err(MerkleError::EmptyTree);
        }
        let mut levels = vec![leaves];
        while let Some(top) = levels.last() {
            if top.len() == 1 {
                break;
            }
            let next = parent_level(top);
            levels.push(next);
        }
        Ok(Self { levels })
    }

    /// Hash each encoded batch into a leaf and build the tree.
    pub fn from_encoded_batches(batches: &[EncodedBatch]) -> Result<Self, MerkleError> {
        Self::from_leaves(batches.iter().map(leaf_hash).collect())
    }

    /// The root hash.
    pub fn root(&self) -> Digest {
        // `from_leaves` guarantees a non-empty final level.
        self.levels
            .last()
            .and_then(|top| top.first())
            .copied()
            .unwrap_or_default()
    }

    /// Number of leaves.
    pub fn len(&self) -> usize {
        self.levels[0].len()
    }

    /// Always false; a tree has at least one leaf.
    pub fn is_empty(&self) -> bool {
        self.levels[0].is_empty()
    }

    /// All leaf hashes in batch order.
    pub fn leaves(&self) -> &[Digest] {
        &self.levels[0]
    }

    /// The leaf hash at `index`.
    pub fn leaf(&self, index: usize) -> Result<Digest, MerkleError> {
        self.levels[0]
            .get(index)
            .copied()
            .ok_or(MerkleError::LeafIndexOutOfRange {
                index,
                len: self.len(),
            })
    }

    /// Number of levels including leaves and root.
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    /// Sibling digests from leaf `index` up to the root.
    ///
    /// # Errors
    ///
    /// Returns `MerkleError::LeafIndexOutOfRange` for an unknown leaf.
    pub fn proof(&self, index: usize) -> Result<Vec<Digest>, MerkleError> {
        self.leaf(index)?;
        let mut path = Vec::with_capacity(self.levels.len().saturating_sub(1));
        let mut pos = index;
        for level in &self.levels[..self.levels.len() - 1] {
            let sibling = pos ^ 1;
            if let Some(hash) = level.get(sibling) {
                path.push(*hash);
            }
            pos /= 2;
        }
        Ok(path)
    }

    /// Build the full inclusion proof record for leaf `index`.
    pub fn inclusion_proof(&self, index: usize) -> Result<InclusionProof, MerkleError> {
        Ok(InclusionProof {
            leaf_index: index,
            leaf: self.leaf(index)?,
            siblings: self.proof(index)?,
            root: self.root(),
        })
    }
}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

/// Recompute a root from a leaf and its sibling path.
pub fn compute_root(leaf: Digest, proof: &[Digest]) -> Digest {
    proof
        .iter()
        .fold(leaf, |acc, sibling| hash_sorted_pair(&acc, sibling))
}

/// Verify that `leaf` is included under `root` via `proof`, using the
/// sorted-pair rule at every step.
pub fn verify_proof(leaf: Digest, proof: &[Digest], root: Digest) -> bool {
    compute_root(leaf, proof) == root
}

/// An inclusion proof for one leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InclusionProof {
    /// Index of the leaf being proven.
    pub leaf_index: usize,
    /// The leaf hash.
    pub leaf: Digest,
    /// Sibling digests from leaf to root.
    pub siblings: Vec<Digest>,
    /// The tree root.
    pub root: Digest,
}

impl InclusionProof {
    /// Verify the proof against its own root.
    pub fn verify(&self) -> bool {
        verify_proof(self.leaf, &self.siblings, self.root)
    }
}
