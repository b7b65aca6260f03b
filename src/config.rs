//! Typed configuration for the P-Sig blocking pipeline
//!
//! The configuration follows the conventional P-Sig JSON shape
//! (`blocking-features`, `signatureSpecs`, `filter`, `blocking-filter`),
//! deserialized into closed Rust types. Unknown
//! strategy tags are rejected at deserialization; filter kinds are
//! validated when an index is constructed, before any record is
//! processed.

use serde::{Deserialize, Serialize};

use crate::BlockingError;

/// A column identifier: either a 0-based positional index or a name
/// resolved against the batch header.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnRef {
    /// 0-based positional index into the record
    Index(usize),
    /// Column name, resolved through the optional header
    Name(String),
}

impl From<usize> for ColumnRef {
    fn from(index: usize) -> Self {
        ColumnRef::Index(index)
    }
}

impl From<&str> for ColumnRef {
    fn from(name: &str) -> Self {
        ColumnRef::Name(name.to_string())
    }
}

/// One signature strategy: a tagged variant selecting how signatures are
/// derived from a record.
///
/// Strategies within one spec (inner list of `signatureSpecs`) contribute
/// to the same signature set; separate specs accumulate into separate
/// reversed indexes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SignatureStrategy {
    /// Concatenates the configured column values, optionally sliced by
    /// substring index pairs (each pair emits a separate signature)
    #[serde(rename = "feature-value")]
    FeatureValue {
        columns: Vec<ColumnRef>,
        #[serde(default)]
        config: FeatureValueConfig,
    },

    /// American Soundex code per configured column, one signature each
    #[serde(rename = "soundex")]
    Soundex { columns: Vec<ColumnRef> },

    /// Every contiguous n-character window over the concatenated column
    /// values, one signature per window
    #[serde(rename = "n-gram")]
    NGram {
        columns: Vec<ColumnRef>,
        config: NGramConfig,
    },
}

/// Strategy-specific configuration for [`SignatureStrategy::FeatureValue`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureValueConfig {
    /// Substring slices over the concatenated column values. Each entry is
    /// `[start, end]` (exclusive end) or `[start]` for an open-ended
    /// slice. Absent: the whole concatenation is the single signature.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_substrings_indices: Option<Vec<Vec<usize>>>,
}

/// Strategy-specific configuration for [`SignatureStrategy::NGram`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NGramConfig {
    /// Window length in characters (typically 2 or 3)
    pub n: usize,
}

/// Block filter configuration (`filter` key).
///
/// The `type` tag stays a free-form string here so that an unrecognized
/// kind surfaces as [`BlockingError::UnsupportedFilterKind`] during index
/// construction rather than as an opaque parse error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Filter kind: `"ratio"` or `"count"`
    #[serde(rename = "type")]
    pub kind: String,
    /// Exclusive lower bound (ratio of batch size, or absolute count)
    pub min: f64,
    /// Exclusive upper bound (ratio of batch size, or absolute count)
    pub max: f64,
}

/// Blocking filter configuration (`blocking-filter` key).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockingFilterConfig {
    /// Filter family; only `"bloom filter"` is supported
    #[serde(rename = "type")]
    pub kind: String,
    /// Number of hash functions (bits set per signature)
    #[serde(rename = "number-hash-functions")]
    pub num_hash_functions: usize,
    /// Bloom filter length in bits
    #[serde(rename = "bf-len")]
    pub bf_len: usize,
}

/// Complete P-Sig configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PSigConfig {
    /// Columns participating in blocking; resolved against the header
    /// before any strategy runs
    #[serde(rename = "blocking-features")]
    pub blocking_features: Vec<ColumnRef>,

    /// Column holding external record ids; absent means records are
    /// identified by their 0-based position in the batch
    #[serde(rename = "record-id-col", default, skip_serializing_if = "Option::is_none")]
    pub record_id_col: Option<ColumnRef>,

    /// Ordered strategy specs; each inner list feeds one reversed index
    #[serde(rename = "signatureSpecs")]
    pub signature_specs: Vec<Vec<SignatureStrategy>>,

    /// Block-size pruning rule
    pub filter: FilterConfig,

    /// Signature-to-bit-pattern encoding parameters
    #[serde(rename = "blocking-filter")]
    pub blocking_filter: BlockingFilterConfig,
}

/// Validated filter mode, resolved from [`FilterConfig`] at construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterMode {
    /// Bounds are fractions of the batch size
    Ratio { min: f64, max: f64 },
    /// Bounds are absolute occurrence counts
    Count { min: f64, max: f64 },
}

impl FilterMode {
    /// Resolve the raw filter configuration into a closed mode.
    pub fn from_config(config: &FilterConfig) -> Result<Self, BlockingError> {
        if !config.min.is_finite() || !config.max.is_finite() {
            return Err(BlockingError::InvalidConfig(format!(
                "filter bounds must be finite, got min={} max={}",
                config.min, config.max
            )));
        }
        match config.kind.as_str() {
            "ratio" => Ok(FilterMode::Ratio {
                min: config.min,
                max: config.max,
            }),
            "count" => Ok(FilterMode::Count {
                min: config.min,
                max: config.max,
            }),
            other => Err(BlockingError::UnsupportedFilterKind(other.to_string())),
        }
    }

    /// Exclusive `(lower, upper)` bounds for a batch of `batch_size`
    /// records. A block survives iff `lower < size < upper`.
    #[must_use]
    pub fn bounds(&self, batch_size: usize) -> (f64, f64) {
        match *self {
            FilterMode::Ratio { min, max } => {
                let n = batch_size as f64;
                (n * min, n * max)
            }
            FilterMode::Count { min, max } => (min, max),
        }
    }
}

impl BlockingFilterConfig {
    /// Validate the blocking-filter section.
    pub fn validate(&self) -> Result<(), BlockingError> {
        if self.kind != "bloom filter" {
            return Err(BlockingError::UnsupportedBlockingFilterKind(
                self.kind.clone(),
            ));
        }
        if self.bf_len == 0 {
            return Err(BlockingError::InvalidConfig(
                "bf-len must be at least 1".to_string(),
            ));
        }
        if self.num_hash_functions == 0 {
            return Err(BlockingError::InvalidConfig(
                "number-hash-functions must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl PSigConfig {
    /// Structural validation, run before any record is processed.
    pub fn validate(&self) -> Result<(), BlockingError> {
        if self.signature_specs.is_empty() {
            return Err(BlockingError::InvalidConfig(
                "signatureSpecs must contain at least one strategy list".to_string(),
            ));
        }
        for (spec_idx, spec) in self.signature_specs.iter().enumerate() {
            if spec.is_empty() {
                return Err(BlockingError::InvalidConfig(format!(
                    "signature spec {} is empty",
                    spec_idx
                )));
            }
            for strategy in spec {
                strategy.validate(spec_idx)?;
            }
        }
        self.blocking_filter.validate()?;
        // Surfaces UnsupportedFilterKind ahead of build time
        FilterMode::from_config(&self.filter)?;
        Ok(())
    }
}

impl SignatureStrategy {
    fn validate(&self, spec_idx: usize) -> Result<(), BlockingError> {
        match self {
            SignatureStrategy::FeatureValue { columns, config } => {
                if columns.is_empty() {
                    return Err(BlockingError::InvalidConfig(format!(
                        "feature-value strategy in spec {} has no columns",
                        spec_idx
                    )));
                }
                if let Some(pairs) = &config.list_substrings_indices {
                    for pair in pairs {
                        if pair.is_empty() || pair.len() > 2 {
                            return Err(BlockingError::InvalidConfig(format!(
                                "substring index pair {:?} in spec {} must be [start] or [start, end]",
                                pair, spec_idx
                            )));
                        }
                    }
                }
            }
            SignatureStrategy::Soundex { columns } => {
                if columns.is_empty() {
                    return Err(BlockingError::InvalidConfig(format!(
                        "soundex strategy in spec {} has no columns",
                        spec_idx
                    )));
                }
            }
            SignatureStrategy::NGram { columns, config } => {
                if columns.is_empty() {
                    return Err(BlockingError::InvalidConfig(format!(
                        "n-gram strategy in spec {} has no columns",
                        spec_idx
                    )));
                }
                if config.n == 0 {
                    return Err(BlockingError::InvalidConfig(format!(
                        "n-gram strategy in spec {} has n = 0",
                        spec_idx
                    )));
                }
            }
        }
        Ok(())
    }

    /// Strategy name for diagnostics/logging.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            SignatureStrategy::FeatureValue { .. } => "feature-value",
            SignatureStrategy::Soundex { .. } => "soundex",
            SignatureStrategy::NGram { .. } => "n-gram",
        }
    }
}
