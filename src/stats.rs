//! Diagnostic statistics for the blocking pipeline.
//!
//! Per-strategy block-size distributions and overall pipeline counters.
//! Purely observational: nothing here ever affects control flow.

use std::time::Duration;

use crate::index::reversed::{coverage, ReversedIndex};

/// Block-size distribution of one strategy's filtered reversed index,
/// computed before merging.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyStats {
    /// Position of the strategy spec in `signatureSpecs`
    pub strategy_idx: usize,
    /// Smallest surviving block
    pub min_size: usize,
    /// Largest surviving block
    pub max_size: usize,
    /// Arithmetic mean of block sizes
    pub avg_size: f64,
    /// Median block size (midpoint average for even counts)
    pub med_size: f64,
    /// Population standard deviation of block sizes
    pub std_size: f64,
    /// Number of surviving blocks
    pub num_blocks: usize,
    /// Record references retained after filtering (sum of block sizes)
    pub num_record_refs: usize,
    /// This strategy's coverage contribution, percent rounded to two
    /// decimals
    pub coverage: f64,
}

/// Aggregate diagnostics for one pipeline invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockingStats {
    /// Per-strategy distributions (post-filter, pre-merge)
    pub strategies: Vec<StrategyStats>,
    /// Blocks in the final encoded index
    pub num_blocks: usize,
    /// Bit positions never set across the encoded keys (fill-ratio
    /// diagnostic)
    pub unset_bits: usize,
    /// Wall-clock time of the invocation
    pub elapsed: Duration,
}

/// Compute per-strategy statistics over the filtered reversed indexes.
#[must_use]
pub fn reversed_index_stats(
    per_strategy: &[ReversedIndex],
    total_records: usize,
) -> Vec<StrategyStats> {
    per_strategy
        .iter()
        .enumerate()
        .map(|(strategy_idx, index)| strategy_stats(strategy_idx, index, total_records))
        .collect()
}

fn strategy_stats(strategy_idx: usize, index: &ReversedIndex, total_records: usize) -> StrategyStats {
    let mut sizes: Vec<usize> = index.values().map(Vec::len).collect();
    sizes.sort_unstable();

    if sizes.is_empty() {
        return StrategyStats {
            strategy_idx,
            min_size: 0,
            max_size: 0,
            avg_size: 0.0,
            med_size: 0.0,
            std_size: 0.0,
            num_blocks: 0,
            num_record_refs: 0,
            coverage: 0.0,
        };
    }

    let num_blocks = sizes.len();
    let num_record_refs: usize = sizes.iter().sum();
    let mean = num_record_refs as f64 / num_blocks as f64;

    let variance = sizes
        .iter()
        .map(|&size| {
            let diff = size as f64 - mean;
            diff * diff
        })
        .sum::<f64>()
        / num_blocks as f64;

    let median = if num_blocks % 2 == 1 {
        sizes[num_blocks / 2] as f64
    } else {
        (sizes[num_blocks / 2 - 1] + sizes[num_blocks / 2]) as f64 / 2.0
    };

    StrategyStats {
        strategy_idx,
        min_size: sizes[0],
        max_size: sizes[num_blocks - 1],
        avg_size: mean,
        med_size: median,
        std_size: variance.sqrt(),
        num_blocks,
        num_record_refs,
        coverage: coverage(index, total_records),
    }
}

impl StrategyStats {
    /// One-line human-readable summary, for callers that log diagnostics.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "strategy {}: block size {} min, {} max, {:.2} avg, {} median, {:.2} std; \
             {} blocks, {} record refs, {:.2}% coverage",
            self.strategy_idx,
            self.min_size,
            self.max_size,
            self.avg_size,
            self.med_size,
            self.std_size,
            self.num_blocks,
            self.num_record_refs,
            self.coverage
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RecordId;

    fn index_with_sizes(sizes: &[usize]) -> ReversedIndex {
        let mut index = ReversedIndex::new();
        let mut next_id = 0usize;
        for (block, &size) in sizes.iter().enumerate() {
            let ids: Vec<RecordId> = (0..size)
                .map(|_| {
                    next_id += 1;
                    RecordId::Position(next_id - 1)
                })
                .collect();
            index.insert(format!("sig{}", block), ids);
        }
        index
    }

    #[test]
    fn test_stats_distribution() {
        // Block sizes 1, 2, 3 over 6 distinct records
        let index = index_with_sizes(&[1, 2, 3]);
        let stats = strategy_stats(0, &index, 6);

        assert_eq!(stats.min_size, 1);
        assert_eq!(stats.max_size, 3);
        assert_eq!(stats.avg_size, 2.0);
        assert_eq!(stats.med_size, 2.0);
        assert!((stats.std_size - (2.0f64 / 3.0).sqrt()).abs() < 1e-12);
        assert_eq!(stats.num_blocks, 3);
        assert_eq!(stats.num_record_refs, 6);
        assert_eq!(stats.coverage, 100.0);
    }

    #[test]
    fn test_stats_even_count_median() {
        let index = index_with_sizes(&[1, 2, 3, 10]);
        let stats = strategy_stats(0, &index, 16);
        assert_eq!(stats.med_size, 2.5);
    }

    #[test]
    fn test_stats_empty_index() {
        let stats = strategy_stats(2, &ReversedIndex::new(), 10);
        assert_eq!(stats.strategy_idx, 2);
        assert_eq!(stats.num_blocks, 0);
        assert_eq!(stats.num_record_refs, 0);
        assert_eq!(stats.coverage, 0.0);
    }

    #[test]
    fn test_stats_partial_coverage() {
        let index = index_with_sizes(&[2]);
        let stats = strategy_stats(0, &index, 6);
        assert_eq!(stats.coverage, 33.33);
    }

    #[test]
    fn test_summary_mentions_counts() {
        let index = index_with_sizes(&[2, 2]);
        let stats = strategy_stats(1, &index, 4);
        let line = stats.summary();
        assert!(line.contains("strategy 1"));
        assert!(line.contains("2 blocks"));
        assert!(line.contains("100.00% coverage"));
    }

    #[test]
    fn test_per_strategy_indexing() {
        let indexes = vec![index_with_sizes(&[1]), index_with_sizes(&[2, 2])];
        let stats = reversed_index_stats(&indexes, 5);
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].strategy_idx, 0);
        assert_eq!(stats[1].strategy_idx, 1);
        assert_eq!(stats[1].num_record_refs, 4);
    }
}
