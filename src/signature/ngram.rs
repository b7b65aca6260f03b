//! N-gram extraction for blocking signatures
//!
//! Slides a fixed-length character window across a string; every window
//! becomes a separate signature. No padding is applied: a string shorter
//! than the window contributes nothing.

use ahash::AHashSet;

/// Extract all contiguous n-character substrings of `s`, in order.
///
/// Returns an empty vec when `n` is 0 or the string is shorter than `n`.
#[must_use]
pub fn extract_ngrams(s: &str, n: usize) -> Vec<String> {
    if n == 0 {
        return vec![];
    }

    let chars: Vec<char> = s.chars().collect();

    if chars.len() < n {
        return vec![];
    }

    chars.windows(n).map(|w| w.iter().collect()).collect()
}

/// Extract n-grams as a set, for deduplicated signature emission.
#[must_use]
pub fn extract_ngram_set(s: &str, n: usize) -> AHashSet<String> {
    extract_ngrams(s, n).into_iter().collect()
}
