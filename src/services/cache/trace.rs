//! Trace cache: an analysis on another member of the same trace.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use log_triage_core::{CacheHit, CacheTier, CoreResult, LogEntry, LogStore};

use super::CacheLookup;

/// Reuses the analysis of a sibling log sharing the requester's `trace_id`.
pub struct TraceCache {
    store: Arc<dyn LogStore>,
    window: Duration,
    max_siblings: usize,
}

impl TraceCache {
    /// * `window` - half-width of the sibling window around the requester
    /// * `max_siblings` - bound on the siblings fetched
    pub fn new(store: Arc<dyn LogStore>, window: Duration, max_siblings: usize) -> Self {
        Self {
            store,
            window,
            max_siblings,
        }
    }
}

#[async_trait]
impl CacheLookup for TraceCache {
    fn tier(&self) -> CacheTier {
        CacheTier::Trace
    }

    async fn lookup(&self, log: &LogEntry) -> CoreResult<Option<CacheHit>> {
        // No trace, no siblings: skip the backend entirely.
        let Some(trace_id) = log.trace() else {
            return Ok(None);
        };

        let siblings = self
            .store
            .find_by_trace(
                &log.project_id,
                trace_id,
                log.timestamp,
                self.window,
                self.max_siblings,
            )
            .await?;

        Ok(siblings
            .into_iter()
            .filter(|sibling| sibling.id != log.id)
            .find_map(|sibling| {
                let result = sibling.analysis?;
                Some(CacheHit {
                    tier: CacheTier::Trace,
                    result,
                    source_log_id: sibling.id,
                    score: 1.0,
                })
            }))
    }
}
