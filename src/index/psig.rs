//! P-Sig pipeline orchestration
//!
//! Ties the stages together: column resolution, per-record signature
//! generation, reversed-index accumulation, block filtering, merging
//! with coverage, and Bloom encoding. The pipeline is all-or-nothing:
//! either the full encoded index is produced or one fatal error aborts
//! the invocation. Nothing persists across invocations; the returned
//! stats are rebuilt each call.

use std::time::Instant;

use tracing::{debug, warn};

use crate::config::{FilterMode, PSigConfig};
use crate::index::bloom::{encode_reversed_index, unset_bit_count, EncodedIndex};
use crate::index::reversed::{
    build_reversed_indexes, coverage, filter_reversed_index, merge_reversed_indexes,
};
use crate::index::RecordId;
use crate::signature::{resolve_column, resolve_columns, ResolvedStrategy};
use crate::stats::{reversed_index_stats, BlockingStats};
use crate::BlockingError;

/// A validated P-Sig blocking index builder.
///
/// Construction validates the configuration; [`PSigIndex::build_reversed_index`]
/// runs the full pipeline over one batch of records.
#[derive(Debug, Clone)]
pub struct PSigIndex {
    config: PSigConfig,
    filter_mode: FilterMode,
}

/// Outcome of one successful pipeline invocation.
#[derive(Debug, Clone)]
pub struct BlockingResult {
    /// Canonical Bloom key -> record ids (duplicates preserved)
    pub blocks: EncodedIndex,
    /// Percentage of input records present in at least one block,
    /// rounded to two decimals. Below 100 is advisory, not an error.
    pub coverage: f64,
    /// Diagnostics; never affects the data contract
    pub stats: BlockingStats,
}

impl PSigIndex {
    /// Validate the configuration and create an index builder.
    ///
    /// Fails before any record is processed: unknown filter kinds,
    /// unsupported blocking-filter families and structurally invalid
    /// strategy parameters are all rejected here.
    pub fn new(config: PSigConfig) -> Result<Self, BlockingError> {
        config.validate()?;
        let filter_mode = FilterMode::from_config(&config.filter)?;
        Ok(Self {
            config,
            filter_mode,
        })
    }

    /// The validated configuration.
    #[must_use]
    pub fn config(&self) -> &PSigConfig {
        &self.config
    }

    /// Run the full blocking pipeline over one batch.
    ///
    /// `header` enables name-based column resolution; without it every
    /// column reference must be positional.
    pub fn build_reversed_index(
        &self,
        records: &[Vec<String>],
        header: Option<&[String]>,
    ) -> Result<BlockingResult, BlockingError> {
        let start = Instant::now();

        // Blocking features are resolved before any strategy: a stale
        // column name fails here, not mid-pipeline
        resolve_columns(&self.config.blocking_features, header)?;

        let specs: Vec<Vec<ResolvedStrategy>> = self
            .config
            .signature_specs
            .iter()
            .map(|spec| {
                spec.iter()
                    .map(|strategy| ResolvedStrategy::resolve(strategy, header))
                    .collect()
            })
            .collect::<Result<_, _>>()?;

        let record_ids = self.record_ids(records, header)?;

        let per_strategy = build_reversed_indexes(&specs, records, &record_ids);
        let per_strategy: Vec<_> = per_strategy
            .into_iter()
            .map(|index| filter_reversed_index(index, records.len(), &self.filter_mode))
            .collect();

        let strategy_stats = reversed_index_stats(&per_strategy, records.len());
        for stats in &strategy_stats {
            debug!("{}", stats.summary());
        }

        let merged = merge_reversed_indexes(per_strategy)?;

        let coverage = coverage(&merged, records.len());
        if coverage < 100.0 {
            warn!(
                coverage,
                "only part of the records are covered in blocks; consider improving signatures"
            );
        }

        let bf = &self.config.blocking_filter;
        let blocks = encode_reversed_index(merged, bf.bf_len, bf.num_hash_functions);
        let unset_bits = unset_bit_count(&blocks, bf.bf_len);

        let stats = BlockingStats {
            strategies: strategy_stats,
            num_blocks: blocks.len(),
            unset_bits,
            elapsed: start.elapsed(),
        };
        debug!(
            num_blocks = stats.num_blocks,
            unset_bits = stats.unset_bits,
            coverage,
            "blocking index built"
        );

        Ok(BlockingResult {
            blocks,
            coverage,
            stats,
        })
    }

    /// Record ids for the batch: values of the configured id column, or
    /// 0-based positions when no id column is configured.
    fn record_ids(
        &self,
        records: &[Vec<String>],
        header: Option<&[String]>,
    ) -> Result<Vec<RecordId>, BlockingError> {
        match &self.config.record_id_col {
            None => Ok((0..records.len()).map(RecordId::Position).collect()),
            Some(column) => {
                let index = resolve_column(column, header)?;
                Ok(records
                    .iter()
                    .map(|record| {
                        RecordId::External(record.get(index).cloned().unwrap_or_default())
                    })
                    .collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::bloom::BloomKey;

    fn six_records() -> Vec<Vec<String>> {
        [
            ["id1", "Joyce", "Wang", "Ashfield"],
            ["id2", "Joyce", "Hsu", "Burwood"],
            ["id3", "Joyce", "Shan", "Lewishm"],
            ["id4", "Fred", "Yu", "Strathfield"],
            ["id5", "Fred", "Zhang", "Chippendale"],
            ["id6", "Lindsay", "Jone", "Narwee"],
        ]
        .iter()
        .map(|row| row.iter().map(|s| s.to_string()).collect())
        .collect()
    }

    fn base_config() -> PSigConfig {
        serde_json::from_value(serde_json::json!({
            "blocking-features": [1],
            "record-id-col": 0,
            "signatureSpecs": [
                [{"type": "feature-value", "columns": [1]}]
            ],
            "filter": {"type": "ratio", "min": 0.2, "max": 0.5},
            "blocking-filter": {
                "type": "bloom filter",
                "number-hash-functions": 4,
                "bf-len": 2048
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_end_to_end_single_surviving_block() {
        // Over six records with ratio bounds (1.2, 3.0), only "Fred"
        // (count 2) survives: "Joyce" (3) hits the upper bound exactly
        // and "Lindsay" (1) falls below the lower one
        let index = PSigIndex::new(base_config()).unwrap();
        let result = index.build_reversed_index(&six_records(), None).unwrap();

        assert_eq!(result.blocks.len(), 1);
        let key = BloomKey::from_signature("Fred", 2048, 4);
        assert_eq!(
            result.blocks[&key],
            vec![RecordId::from("id4"), RecordId::from("id5")]
        );
        assert_eq!(result.coverage, 33.33);
        assert_eq!(result.stats.num_blocks, 1);
        assert_eq!(result.stats.strategies.len(), 1);
        assert_eq!(result.stats.strategies[0].num_record_refs, 2);
    }

    #[test]
    fn test_positional_ids_without_id_column() {
        let mut config = base_config();
        config.record_id_col = None;
        let index = PSigIndex::new(config).unwrap();
        let result = index.build_reversed_index(&six_records(), None).unwrap();

        let key = BloomKey::from_signature("Fred", 2048, 4);
        assert_eq!(
            result.blocks[&key],
            vec![RecordId::Position(3), RecordId::Position(4)]
        );
    }

    #[test]
    fn test_all_records_filtered_out() {
        let mut config = base_config();
        // Count bounds (5, 6) exclude every block in the batch
        config.filter.kind = "count".to_string();
        config.filter.min = 5.0;
        config.filter.max = 6.0;
        let index = PSigIndex::new(config).unwrap();
        assert_eq!(
            index.build_reversed_index(&six_records(), None).err(),
            Some(BlockingError::AllRecordsFilteredOut)
        );
    }

    #[test]
    fn test_unsupported_filter_kind_at_construction() {
        let mut config = base_config();
        config.filter.kind = "quantile".to_string();
        assert_eq!(
            PSigIndex::new(config).err(),
            Some(BlockingError::UnsupportedFilterKind("quantile".to_string()))
        );
    }

    #[test]
    fn test_unsupported_blocking_filter_kind_at_construction() {
        let mut config = base_config();
        config.blocking_filter.kind = "counting filter".to_string();
        assert_eq!(
            PSigIndex::new(config).err(),
            Some(BlockingError::UnsupportedBlockingFilterKind(
                "counting filter".to_string()
            ))
        );
    }

    #[test]
    fn test_named_columns_resolved_through_header() {
        let config: PSigConfig = serde_json::from_value(serde_json::json!({
            "blocking-features": ["firstname"],
            "record-id-col": "rec_id",
            "signatureSpecs": [
                [{"type": "feature-value", "columns": ["firstname"]}]
            ],
            "filter": {"type": "ratio", "min": 0.2, "max": 0.5},
            "blocking-filter": {
                "type": "bloom filter",
                "number-hash-functions": 4,
                "bf-len": 2048
            }
        }))
        .unwrap();
        let header: Vec<String> = ["rec_id", "firstname", "lastname", "suburb"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let index = PSigIndex::new(config).unwrap();
        let result = index
            .build_reversed_index(&six_records(), Some(&header))
            .unwrap();
        let key = BloomKey::from_signature("Fred", 2048, 4);
        assert_eq!(
            result.blocks[&key],
            vec![RecordId::from("id4"), RecordId::from("id5")]
        );
    }

    #[test]
    fn test_unresolved_blocking_feature_fails_before_pipeline() {
        let config: PSigConfig = serde_json::from_value(serde_json::json!({
            "blocking-features": ["postcode"],
            "signatureSpecs": [
                [{"type": "feature-value", "columns": [1]}]
            ],
            "filter": {"type": "ratio", "min": 0.2, "max": 0.5},
            "blocking-filter": {
                "type": "bloom filter",
                "number-hash-functions": 4,
                "bf-len": 2048
            }
        }))
        .unwrap();
        let header: Vec<String> = ["rec_id", "firstname"].iter().map(|s| s.to_string()).collect();

        let index = PSigIndex::new(config).unwrap();
        assert_eq!(
            index.build_reversed_index(&six_records(), Some(&header)).err(),
            Some(BlockingError::UnresolvedColumnReference(
                "postcode".to_string()
            ))
        );
    }

    #[test]
    fn test_shared_signature_across_specs_concatenates() {
        // Two identical specs: each surviving signature appears in both,
        // so the merged lists are concatenated and the encoded block
        // carries every reference
        let mut config = base_config();
        config.signature_specs = vec![
            config.signature_specs[0].clone(),
            config.signature_specs[0].clone(),
        ];
        let index = PSigIndex::new(config).unwrap();
        let result = index.build_reversed_index(&six_records(), None).unwrap();

        let key = BloomKey::from_signature("Fred", 2048, 4);
        assert_eq!(result.blocks[&key].len(), 4);
        assert_eq!(result.coverage, 33.33);
    }

    #[test]
    fn test_determinism_across_invocations() {
        let index = PSigIndex::new(base_config()).unwrap();
        let first = index.build_reversed_index(&six_records(), None).unwrap();
        let second = index.build_reversed_index(&six_records(), None).unwrap();
        assert_eq!(first.blocks, second.blocks);
        assert_eq!(first.coverage, second.coverage);
    }

    #[test]
    fn test_full_coverage_with_open_bounds() {
        let mut config = base_config();
        config.filter.kind = "count".to_string();
        config.filter.min = 0.0;
        config.filter.max = 100.0;
        let index = PSigIndex::new(config).unwrap();
        let result = index.build_reversed_index(&six_records(), None).unwrap();
        assert_eq!(result.coverage, 100.0);
        // Three distinct last names, no Bloom collisions expected at
        // this filter length
        assert_eq!(result.blocks.len(), 3);
    }
}
