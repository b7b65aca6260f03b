//! BlockRust - Privacy-preserving blocking for record linkage
//!
//! Implements the probability-signature ("P-Sig") blocking technique:
//! each record is reduced to a set of blocking signatures, signatures are
//! accumulated into an inverted index, blocks with poor discriminative
//! power are pruned, and the surviving signatures are re-encoded as
//! Bloom-filter bit patterns so two parties can compare block keys
//! without exchanging plaintext values.
//!
//! # Features
//! - Multiple signature strategies (feature-value, Soundex, n-gram)
//! - Ratio- and count-based block filtering
//! - Deterministic Bloom-filter block keys
//! - Parallel batch processing
//!
//! # Example
//!
//! ```rust
//! use blockrust::{PSigConfig, PSigIndex};
//!
//! let config: PSigConfig = serde_json::from_str(r#"{
//!     "blocking-features": [0],
//!     "signatureSpecs": [[{"type": "feature-value", "columns": [0]}]],
//!     "filter": {"type": "count", "min": 0, "max": 100},
//!     "blocking-filter": {"type": "bloom filter", "number-hash-functions": 4, "bf-len": 2048}
//! }"#).unwrap();
//!
//! let records = vec![
//!     vec!["Joyce".to_string(), "Wang".to_string()],
//!     vec!["Joyce".to_string(), "Hsu".to_string()],
//! ];
//!
//! let index = PSigIndex::new(config).unwrap();
//! let result = index.build_reversed_index(&records, None).unwrap();
//! assert_eq!(result.coverage, 100.0);
//! ```

pub mod config;
pub mod index;
pub mod signature;
pub mod stats;

use thiserror::Error;

// Re-exports for the common pipeline surface (explicit to keep the public
// API stable while module internals move around)
pub use config::{
    BlockingFilterConfig, ColumnRef, FilterConfig, FilterMode, PSigConfig, SignatureStrategy,
};
pub use index::bloom::{BloomKey, EncodedIndex};
pub use index::psig::{BlockingResult, PSigIndex};
pub use index::reversed::ReversedIndex;
pub use index::RecordId;
pub use stats::{BlockingStats, StrategyStats};

/// Errors raised by the blocking pipeline.
///
/// Every variant is fatal for the current invocation: the caller must
/// adjust the configuration and re-invoke. Low coverage is the one
/// advisory condition and is surfaced on [`BlockingResult`] instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BlockingError {
    /// `filter.type` is not one of the supported kinds
    #[error("unsupported filter type: {0}")]
    UnsupportedFilterKind(String),

    /// `blocking-filter.type` is not one of the supported kinds
    #[error("unsupported blocking filter type: {0}")]
    UnsupportedBlockingFilterKind(String),

    /// Filtering removed every block from the merged index
    #[error("all records are filtered out; relax the filter bounds or add signature strategies")]
    AllRecordsFilteredOut,

    /// A configured column name has no match in the supplied header
    #[error("column '{0}' not found in header")]
    UnresolvedColumnReference(String),

    /// Structurally invalid configuration value
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Minimum input size for parallel processing.
///
/// For batches smaller than this threshold, sequential processing is
/// faster due to the overhead of thread pool coordination.
pub(crate) const PARALLEL_THRESHOLD: usize = 100;
