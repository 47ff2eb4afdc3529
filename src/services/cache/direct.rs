//! Direct cache: the requesting log's own analysis.

use async_trait::async_trait;
use log_triage_core::{CacheHit, CacheTier, CoreResult, LogEntry};

use super::CacheLookup;

/// Reuses an analysis already attached to the same log.
///
/// The entry was just fetched, so this tier needs no backend call.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectCache;

impl DirectCache {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CacheLookup for DirectCache {
    fn tier(&self) -> CacheTier {
        CacheTier::Direct
    }

    async fn lookup(&self, log: &LogEntry) -> CoreResult<Option<CacheHit>> {
        Ok(log.analysis.as_ref().map(|analysis| CacheHit {
            tier: CacheTier::Direct,
            result: analysis.clone(),
            source_log_id: log.id.clone(),
            score: 1.0,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::cache::trace::tests::sample_analysis;
    use log_triage_core::LogLevel;

    #[tokio::test]
    async fn test_direct_hit_and_miss() {
        let log = LogEntry::new("L1", "p", "svc", LogLevel::Error, "boom");
        assert!(DirectCache::new().lookup(&log).await.unwrap().is_none());

        let analyzed = log.with_analysis(sample_analysis());
        let hit = DirectCache::new().lookup(&analyzed).await.unwrap().unwrap();
        assert_eq!(hit.tier, CacheTier::Direct);
        assert_eq!(hit.source_log_id, "L1");
        assert_eq!(hit.score, 1.0);
    }
}
