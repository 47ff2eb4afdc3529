//! Cache Tiers
//!
//! Three independent lookups that can answer a request without calling the
//! LLM, tried strictly in order:
//! 1. Direct - the log's own analysis
//! 2. Trace - an analysis on another log of the same trace
//! 3. Similarity - an analysis on a different log with a near-identical message
//!
//! The first hit ends resolution.

pub mod direct;
pub mod similarity;
pub mod trace;

use async_trait::async_trait;
use log_triage_core::{CacheHit, CacheTier, CoreResult, LogEntry};

pub use direct::DirectCache;
pub use similarity::SimilarityCache;
pub use trace::TraceCache;

/// One cache tier.
///
/// `Ok(None)` is a miss. Backend failures surface as `TransientIo`.
#[async_trait]
pub trait CacheLookup: Send + Sync {
    /// Tier this lookup implements
    fn tier(&self) -> CacheTier;

    /// Look up a reusable analysis for `log`
    async fn lookup(&self, log: &LogEntry) -> CoreResult<Option<CacheHit>>;
}

/// Ordered chain of cache tiers.
pub struct CacheResolver {
    tiers: Vec<Box<dyn CacheLookup>>,
}

impl CacheResolver {
    /// Chain over explicit tiers (order is preserved).
    pub fn new(tiers: Vec<Box<dyn CacheLookup>>) -> Self {
        Self { tiers }
    }

    /// Tiers in lookup order
    pub fn tiers(&self) -> Vec<CacheTier> {
        self.tiers.iter().map(|t| t.tier()).collect()
    }

    /// First hit across the tiers, or `None` when every tier misses.
    pub async fn resolve(&self, log: &LogEntry) -> CoreResult<Option<CacheHit>> {
        for tier in &self.tiers {
            if let Some(hit) = tier.lookup(log).await? {
                tracing::info!(
                    log_id = %log.id,
                    tier = %hit.tier,
                    source = %hit.source_log_id,
                    score = hit.score,
                    "cache: hit"
                );
                return Ok(Some(hit));
            }
            tracing::debug!(log_id = %log.id, tier = %tier.tier(), "cache: miss");
        }
        Ok(None)
    }
}
