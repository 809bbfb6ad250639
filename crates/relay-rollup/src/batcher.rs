//! # Batcher
//!
//! Partitions the reconciled record sequence into contiguous, index-labeled
//! batches. Batch `i` holds records `[i * size, min((i + 1) * size, n))`.
//! Indices are dense and 0-based, and concatenating all batches reproduces
//! the input exactly.

use std::num::NonZeroU64;

use relay_core::{Batch, RelayError, StateChangeRecord};

/// Reject a zero batch size.
///
/// # Errors
///
/// Returns `RelayError::InvalidBatchSize` for zero.
pub fn validate_batch_size(batch_size: u64) -> Result<NonZeroU64, RelayError> {
    NonZeroU64::new(batch_size).ok_or(RelayError::InvalidBatchSize(batch_size))
}

/// Split `records` into batches of `batch_size`. The last batch may be short.
/// Empty input yields no batches.
pub fn partition(
    records: &[StateChangeRecord],
    batch_size: u64,
) -> Result<Vec<Batch>, RelayError> {
    let size = validate_batch_size(batch_size)?;
    let chunk = usize::try_from(size.get()).unwrap_or(usize::MAX);
    Ok(records
        .chunks(chunk)
        .zip(0u64..)
        .map(|(slice, index)| Batch {
            index,
            records: slice.to_vec(),
        })
        .collect())
}

/// Number of batches `n` records produce at `batch_size`.
pub fn batch_count(n: usize, batch_size: NonZeroU64) -> u64 {
    (n as u64).div_ceil(batch_size.get())
}
