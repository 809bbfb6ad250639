//! # Keccak-256 Leaf and Node Hashing
//!
//! Computes batch leaf hashes exclusively from `EncodedBatch`, ensuring that
//! every leaf committed to the Merkle tree flows through the canonical ABI
//! encoder.
//!
//! ## Security Invariant
//!
//! The function signature `leaf_hash(batch: &EncodedBatch) -> Digest` makes it
//! a compile error to hash raw bytes as a leaf.

use relay_core::{keccak256_digest, Digest, EncodedBatch};

/// Compute the Merkle leaf hash of an encoded batch: `keccak256(encoded)`.
pub fn leaf_hash(batch: &EncodedBatch) -> Digest {
    keccak256_digest(batch.as_bytes())
}

/// Compute a parent node under the sorted-pair rule:
/// `keccak256(min(a, b) || max(a, b))`.
///
/// The order is the byte-wise order of [`Digest`], i.e. unsigned big-endian.
/// Swapping the arguments never changes the result.
pub fn hash_sorted_pair(a: &Digest, b: &Digest) -> Digest {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    let mut input = [0u8; 64];
    input[..32].copy_from_slice(lo.as_bytes());
    input[32..].copy_from_slice(hi.as_bytes());
    keccak256_digest(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_core::{Batch, BatchLayout, StateChangeRecord};

    #[test]
    fn test_sorted_pair_is_symmetric() {
        let a = keccak256_digest(b"left");
        let b = keccak256_digest(b"right");
        assert_eq!(hash_sorted_pair(&a, &b), hash_sorted_pair(&b, &a));
    }

    #[test]
    fn test_sorted_pair_concatenates_low_first() {
        let lo = Digest::new([0x01; 32]);
        let hi = Digest::new([0xf0; 32]);
        let mut manual = Vec::new();
        manual.extend_from_slice(lo.as_bytes());
        manual.extend_from_slice(hi.as_bytes());
        assert_eq!(hash_sorted_pair(&hi, &lo), keccak256_digest(&manual));
    }

    #[test]
    fn test_leaf_hash_is_keccak_of_encoding() {
        let batch = Batch {
            index: 0,
            records: vec![StateChangeRecord::new(
                StateChangeRecord::uint_key(1),
                b"a".to_vec(),
            )],
        };
        let encoded = EncodedBatch::encode(&batch, BatchLayout::BytesKey);
        assert_eq!(leaf_hash(&encoded), keccak256_digest(encoded.as_bytes()));
    }
}
