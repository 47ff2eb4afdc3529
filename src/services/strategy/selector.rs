//! Strategy Selector
//!
//! Chooses how many LLM calls an analysis needs from the number of related
//! logs alone. Pure and deterministic; no I/O.
//!
//! | related logs              | strategy   |
//! |---------------------------|------------|
//! | `n <= 1`                  | SINGLE     |
//! | `1 < n <= threshold`      | DIRECT     |
//! | `n > threshold`           | MAP_REDUCE |

use serde::{Deserialize, Serialize};

/// Analysis strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Strategy {
    /// One log, one call
    Single,
    /// All related logs in one call
    Direct,
    /// Chunk summaries (Map) folded by one final call (Reduce)
    MapReduce,
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strategy::Single => write!(f, "SINGLE"),
            Strategy::Direct => write!(f, "DIRECT"),
            Strategy::MapReduce => write!(f, "MAP_REDUCE"),
        }
    }
}

/// Chosen strategy plus the Map chunk size (only meaningful for MAP_REDUCE).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyDecision {
    pub strategy: Strategy,
    pub chunk_size: usize,
    pub related_log_count: usize,
}

impl StrategyDecision {
    /// Number of Map chunks this decision produces.
    pub fn chunk_count(&self) -> usize {
        match self.strategy {
            Strategy::MapReduce => self.related_log_count.div_ceil(self.chunk_size.max(1)),
            _ => 0,
        }
    }
}

/// Strategy selector configured with the Map-Reduce threshold and chunking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrategySelector {
    map_reduce_threshold: usize,
    chunk_size: usize,
    max_map_chunks: usize,
}

impl StrategySelector {
    pub fn new(map_reduce_threshold: usize, chunk_size: usize, max_map_chunks: usize) -> Self {
        Self {
            map_reduce_threshold: map_reduce_threshold.max(1),
            chunk_size: chunk_size.max(1),
            max_map_chunks: max_map_chunks.max(1),
        }
    }

    /// Select a strategy for `related_log_count` logs (the center log included).
    pub fn select(&self, related_log_count: usize) -> StrategyDecision {
        let strategy = if related_log_count <= 1 {
            Strategy::Single
        } else if related_log_count <= self.map_reduce_threshold {
            Strategy::Direct
        } else {
            Strategy::MapReduce
        };

        let chunk_size = match strategy {
            Strategy::MapReduce => self
                .chunk_size
                .max(related_log_count.div_ceil(self.max_map_chunks)),
            _ => self.chunk_size,
        };

        StrategyDecision {
            strategy,
            chunk_size,
            related_log_count,
        }
    }
}
