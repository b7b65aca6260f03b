//! Bloom-filter encoding of surviving signatures
//!
//! Each signature is mapped to the set of bit positions it would flip in
//! an m-bit Bloom filter, using k positions derived by double hashing:
//! the SHA-256 digest of the signature supplies two independent 64-bit
//! base hashes, and position i is `(h1 + i * h2) mod m`. The canonical
//! key is the sorted, deduplicated position list, so two signatures that
//! flip the same bits compare equal and their blocks merge.

use ahash::{AHashMap, AHashSet};
use rayon::prelude::*;
use sha2::{Digest, Sha256};
use smallvec::SmallVec;

use crate::index::reversed::ReversedIndex;
use crate::{RecordId, PARALLEL_THRESHOLD};

/// Final block structure: canonical Bloom key -> record ids.
pub type EncodedIndex = AHashMap<BloomKey, Vec<RecordId>>;

/// Canonical bit pattern of one signature: the sorted, deduplicated
/// positions set in an m-bit vector.
///
/// Canonicalization is load-bearing: equality of two keys must depend
/// only on the bits they set, never on the signatures they came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BloomKey(SmallVec<[u32; 8]>);

impl BloomKey {
    /// Encode a signature into its Bloom key.
    ///
    /// Deterministic: the same signature with the same `bf_len` and
    /// `num_hash_functions` always yields the same key. `bf_len` must be
    /// non-zero (enforced at configuration validation).
    #[must_use]
    pub fn from_signature(signature: &str, bf_len: usize, num_hash_functions: usize) -> Self {
        let digest = Sha256::digest(signature.as_bytes());

        let mut h1_bytes = [0u8; 8];
        let mut h2_bytes = [0u8; 8];
        h1_bytes.copy_from_slice(&digest[..8]);
        h2_bytes.copy_from_slice(&digest[8..16]);
        let h1 = u64::from_be_bytes(h1_bytes);
        let h2 = u64::from_be_bytes(h2_bytes);

        let m = bf_len as u64;
        let mut positions: SmallVec<[u32; 8]> = (0..num_hash_functions as u64)
            .map(|i| (h1.wrapping_add(i.wrapping_mul(h2)) % m) as u32)
            .collect();

        positions.sort_unstable();
        positions.dedup();
        BloomKey(positions)
    }

    /// Sorted bit positions set by this key.
    #[must_use]
    pub fn positions(&self) -> &[u32] {
        &self.0
    }
}

/// Encode the merged reversed index into the final block structure.
///
/// Signatures colliding on the same canonical key have their record-id
/// lists concatenated; no id is ever dropped and no deduplication is
/// performed. Encoding is parallel across signatures for large indexes.
#[must_use]
pub fn encode_reversed_index(
    index: ReversedIndex,
    bf_len: usize,
    num_hash_functions: usize,
) -> EncodedIndex {
    let pairs: Vec<(BloomKey, Vec<RecordId>)> = if index.len() >= PARALLEL_THRESHOLD {
        index
            .into_iter()
            .collect::<Vec<_>>()
            .into_par_iter()
            .map(|(signature, record_ids)| {
                (
                    BloomKey::from_signature(&signature, bf_len, num_hash_functions),
                    record_ids,
                )
            })
            .collect()
    } else {
        index
            .into_iter()
            .map(|(signature, record_ids)| {
                (
                    BloomKey::from_signature(&signature, bf_len, num_hash_functions),
                    record_ids,
                )
            })
            .collect()
    };

    let mut encoded = EncodedIndex::with_capacity(pairs.len());
    for (key, record_ids) in pairs {
        encoded
            .entry(key)
            .or_insert_with(Vec::new)
            .extend(record_ids);
    }
    encoded
}

/// Number of bit positions left unset across all keys of the encoded
/// index. A fill-ratio diagnostic, not a correctness signal.
#[must_use]
pub fn unset_bit_count(encoded: &EncodedIndex, bf_len: usize) -> usize {
    let set: AHashSet<u32> = encoded
        .keys()
        .flat_map(|key| key.positions().iter().copied())
        .collect();
    bf_len.saturating_sub(set.len())
}
