//! Signature strategy engine
//!
//! Pure per-record signature generation: a resolved strategy spec plus
//! one record yields a set of signature strings. Strategies run
//! independently; each spec (inner list of `signatureSpecs`) contributes
//! one combined signature set, in spec order, for keyed accumulation by
//! the reversed index builder.

pub mod ngram;
pub mod soundex;

pub use ngram::{extract_ngram_set, extract_ngrams};
pub use soundex::soundex;

use ahash::AHashSet;

use crate::config::{ColumnRef, SignatureStrategy};
use crate::BlockingError;

/// Resolve column references to positional indices.
///
/// Name references require a header; a missing header or an unmatched
/// name is a fatal configuration error.
pub fn resolve_columns(
    columns: &[ColumnRef],
    header: Option<&[String]>,
) -> Result<Vec<usize>, BlockingError> {
    columns.iter().map(|c| resolve_column(c, header)).collect()
}

/// Resolve a single column reference.
pub fn resolve_column(
    column: &ColumnRef,
    header: Option<&[String]>,
) -> Result<usize, BlockingError> {
    match column {
        ColumnRef::Index(index) => Ok(*index),
        ColumnRef::Name(name) => header
            .and_then(|h| h.iter().position(|col| col == name))
            .ok_or_else(|| BlockingError::UnresolvedColumnReference(name.clone())),
    }
}

/// A strategy with its columns resolved to positional indices, ready to
/// run against records. Resolution happens once per batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedStrategy {
    FeatureValue {
        columns: Vec<usize>,
        /// `[start]` or `[start, end]` slices over the concatenated
        /// column values; `None` emits the whole concatenation
        substrings: Option<Vec<Vec<usize>>>,
    },
    Soundex {
        columns: Vec<usize>,
    },
    NGram {
        columns: Vec<usize>,
        n: usize,
    },
}

impl ResolvedStrategy {
    /// Resolve a configured strategy against the batch header.
    pub fn resolve(
        strategy: &SignatureStrategy,
        header: Option<&[String]>,
    ) -> Result<Self, BlockingError> {
        match strategy {
            SignatureStrategy::FeatureValue { columns, config } => {
                Ok(ResolvedStrategy::FeatureValue {
                    columns: resolve_columns(columns, header)?,
                    substrings: config.list_substrings_indices.clone(),
                })
            }
            SignatureStrategy::Soundex { columns } => Ok(ResolvedStrategy::Soundex {
                columns: resolve_columns(columns, header)?,
            }),
            SignatureStrategy::NGram { columns, config } => Ok(ResolvedStrategy::NGram {
                columns: resolve_columns(columns, header)?,
                n: config.n,
            }),
        }
    }

    /// Append this strategy's signatures for `record` to `out`.
    pub fn append_signatures(&self, record: &[String], out: &mut AHashSet<String>) {
        match self {
            ResolvedStrategy::FeatureValue {
                columns,
                substrings,
            } => {
                let concatenated = concat_columns(record, columns);
                match substrings {
                    None => {
                        out.insert(concatenated);
                    }
                    Some(pairs) => {
                        for pair in pairs {
                            out.insert(slice_chars(&concatenated, pair));
                        }
                    }
                }
            }
            ResolvedStrategy::Soundex { columns } => {
                // One phonetic code per column, not concatenated
                for &column in columns {
                    out.insert(soundex(column_value(record, column)));
                }
            }
            ResolvedStrategy::NGram { columns, n } => {
                let concatenated = concat_columns(record, columns);
                out.extend(extract_ngrams(&concatenated, *n));
            }
        }
    }
}

/// Generate one signature set per strategy spec, in spec order.
///
/// Strategies within one spec contribute to the same set; a record may
/// yield multiple signatures from one strategy (e.g. n-gram).
#[must_use]
pub fn generate_signatures(
    specs: &[Vec<ResolvedStrategy>],
    record: &[String],
) -> Vec<AHashSet<String>> {
    specs
        .iter()
        .map(|spec| {
            let mut signatures = AHashSet::new();
            for strategy in spec {
                strategy.append_signatures(record, &mut signatures);
            }
            signatures
        })
        .collect()
}

/// Value of `record[column]`, or the empty string for a ragged row that
/// is narrower than the configured column.
fn column_value(record: &[String], column: usize) -> &str {
    record.get(column).map(String::as_str).unwrap_or("")
}

fn concat_columns(record: &[String], columns: &[usize]) -> String {
    columns
        .iter()
        .map(|&column| column_value(record, column))
        .collect()
}

/// Character-based `[start, end)` slice with Python-style clamping;
/// a one-element pair slices to the end of the string.
fn slice_chars(s: &str, pair: &[usize]) -> String {
    let chars: Vec<char> = s.chars().collect();
    let start = pair.first().copied().unwrap_or(0).min(chars.len());
    let end = pair.get(1).copied().unwrap_or(chars.len()).min(chars.len());
    if start >= end {
        return String::new();
    }
    chars[start..end].iter().collect()
}
