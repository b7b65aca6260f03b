//! Reversed index construction, filtering and merging
//!
//! A reversed index maps each blocking signature to the list of record
//! ids that produced it. One index is accumulated per strategy spec in a
//! single streaming pass, pruned against the configured size bounds, and
//! the survivors are unioned into the merged index handed to the Bloom
//! encoder.

use ahash::{AHashMap, AHashSet};
use rayon::prelude::*;

use crate::config::FilterMode;
use crate::signature::{generate_signatures, ResolvedStrategy};
use crate::{BlockingError, RecordId, PARALLEL_THRESHOLD};

/// Mapping from signature to the record ids that produced it.
///
/// Id lists preserve duplicates; relative order reflects input order
/// only incidentally and is not a contract.
pub type ReversedIndex = AHashMap<String, Vec<RecordId>>;

/// Build one reversed index per strategy spec over the whole batch.
///
/// Signature generation is embarrassingly parallel across records, so
/// large batches run map-then-merge with no shared mutable state; the
/// final reduction into the per-spec maps is sequential.
#[must_use]
pub fn build_reversed_indexes(
    specs: &[Vec<ResolvedStrategy>],
    records: &[Vec<String>],
    record_ids: &[RecordId],
) -> Vec<ReversedIndex> {
    let per_record: Vec<Vec<AHashSet<String>>> = if records.len() >= PARALLEL_THRESHOLD {
        records
            .par_iter()
            .map(|record| generate_signatures(specs, record))
            .collect()
    } else {
        records
            .iter()
            .map(|record| generate_signatures(specs, record))
            .collect()
    };

    let mut indexes: Vec<ReversedIndex> = (0..specs.len()).map(|_| ReversedIndex::new()).collect();

    for (record_id, signature_sets) in record_ids.iter().zip(per_record) {
        for (index, signatures) in indexes.iter_mut().zip(signature_sets) {
            for signature in signatures {
                index
                    .entry(signature)
                    .or_insert_with(Vec::new)
                    .push(record_id.clone());
            }
        }
    }

    indexes
}

/// Prune entries whose occurrence count falls outside the configured
/// bounds. Bounds are exclusive on both ends: an entry exactly at a
/// bound is dropped.
#[must_use]
pub fn filter_reversed_index(
    index: ReversedIndex,
    batch_size: usize,
    mode: &FilterMode,
) -> ReversedIndex {
    let (lower, upper) = mode.bounds(batch_size);
    index
        .into_iter()
        .filter(|(_, record_ids)| {
            let size = record_ids.len() as f64;
            size > lower && size < upper
        })
        .collect()
}

/// Union the filtered per-spec indexes into one map.
///
/// A signature emitted by several specs has its id lists concatenated,
/// mirroring the Bloom encoder's collision policy. An empty merged index
/// is a fatal configuration signal.
pub fn merge_reversed_indexes(
    per_strategy: Vec<ReversedIndex>,
) -> Result<ReversedIndex, BlockingError> {
    let mut merged = ReversedIndex::new();
    for index in per_strategy {
        for (signature, record_ids) in index {
            merged
                .entry(signature)
                .or_insert_with(Vec::new)
                .extend(record_ids);
        }
    }

    if merged.is_empty() {
        return Err(BlockingError::AllRecordsFilteredOut);
    }

    Ok(merged)
}

/// Fraction of the input batch present in at least one surviving block,
/// as a percentage rounded to two decimals.
#[must_use]
pub fn coverage(index: &ReversedIndex, total_records: usize) -> f64 {
    if total_records == 0 {
        return 0.0;
    }
    let covered: AHashSet<&RecordId> = index.values().flatten().collect();
    round2(covered.len() as f64 / total_records as f64 * 100.0)
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
