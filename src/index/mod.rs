//! Index structures for the P-Sig pipeline
//!
//! - Reversed index: signature -> record ids, one per strategy spec
//! - Bloom encoder: signature -> canonical fixed-length bit pattern
//! - P-Sig index: top-level orchestration of the full pipeline

pub mod bloom;
pub mod psig;
pub mod reversed;

pub use bloom::*;
pub use psig::*;
pub use reversed::*;

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of one record within a batch.
///
/// Records carry an external id when the configuration names an id
/// column; otherwise they are identified by their 0-based position in
/// the input batch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RecordId {
    /// 0-based position in the input batch
    Position(usize),
    /// Value taken from the configured record-id column
    External(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Position(position) => write!(f, "{}", position),
            RecordId::External(id) => f.write_str(id),
        }
    }
}

impl From<usize> for RecordId {
    fn from(position: usize) -> Self {
        RecordId::Position(position)
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        RecordId::External(id.to_string())
    }
}
