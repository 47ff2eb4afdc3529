//! Collaborator Traits
//!
//! Contracts for the storage/search backend and the vector index. The
//! orchestrator receives these as `Arc<dyn ...>` handles at construction time,
//! so tests can substitute in-memory fakes and production can plug in any
//! backend that supports per-project filtering.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreResult;
use crate::models::{AnalysisResult, LogEntry, LogLevel};

/// Storage/search backend holding log documents.
///
/// Implementations must scope every operation to `project_id`.
#[async_trait]
pub trait LogStore: Send + Sync {
    /// Load one entry. Missing entries are `CoreError::NotFound`.
    async fn get(&self, project_id: &str, log_id: &str) -> CoreResult<LogEntry>;

    /// Entries sharing `trace_id` whose timestamp lies within
    /// `center ± window`, ordered by timestamp, at most `max_count`.
    async fn find_by_trace(
        &self,
        project_id: &str,
        trace_id: &str,
        center: DateTime<Utc>,
        window: Duration,
        max_count: usize,
    ) -> CoreResult<Vec<LogEntry>>;

    /// Attach (or replace) the analysis of one entry.
    async fn patch_analysis(
        &self,
        project_id: &str,
        log_id: &str,
        analysis: &AnalysisResult,
    ) -> CoreResult<()>;

    /// Remember a computed embedding so later lookups need not re-embed.
    async fn store_embedding(
        &self,
        project_id: &str,
        log_id: &str,
        vector: &[f32],
    ) -> CoreResult<()>;

    /// Insert or replace an entry (ingestion).
    async fn upsert(&self, entry: &LogEntry) -> CoreResult<()>;
}

/// Metadata constraints applied to nearest-neighbor candidates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NeighborFilter {
    /// Tenant scope (always required by implementations)
    pub project_id: String,
    /// Required level, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<LogLevel>,
    /// Required service, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    /// Required source type, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_type: Option<String>,
    /// Only return entries that already carry an analysis
    #[serde(default)]
    pub require_analysis: bool,
    /// Only return entries whose analysis was produced at or after this instant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analyzed_after: Option<DateTime<Utc>>,
}

impl NeighborFilter {
    /// Filter matching the metadata of `entry`, restricted to analyzed entries.
    pub fn for_entry(entry: &LogEntry) -> Self {
        Self {
            project_id: entry.project_id.clone(),
            level: Some(entry.level),
            service: Some(entry.service.clone()),
            source_type: entry.source_type.clone(),
            require_analysis: true,
            analyzed_after: None,
        }
    }

    /// Restrict to analyses produced at or after `cutoff`.
    ///
    /// The cutoff must be applied before ranking so expired entries cannot
    /// crowd fresh ones out of the top `k`.
    pub fn with_analyzed_after(mut self, cutoff: Option<DateTime<Utc>>) -> Self {
        self.analyzed_after = cutoff;
        self
    }

    /// Whether `candidate` satisfies every constraint of this filter.
    pub fn matches(&self, candidate: &LogEntry) -> bool {
        if candidate.project_id != self.project_id {
            return false;
        }
        if let Some(level) = self.level {
            if candidate.level != level {
                return false;
            }
        }
        if let Some(ref service) = self.service {
            if &candidate.service != service {
                return false;
            }
        }
        if let Some(ref source_type) = self.source_type {
            if candidate.source_type.as_ref() != Some(source_type) {
                return false;
            }
        }
        if let Some(cutoff) = self.analyzed_after {
            match candidate.analysis.as_ref() {
                Some(analysis) if analysis.analyzed_at >= cutoff => {}
                _ => return false,
            }
        }
        !(self.require_analysis && candidate.analysis.is_none())
    }
}

/// Nearest-neighbor search over stored log embeddings.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Up to `k` entries matching `filter`, ordered by descending cosine
    /// similarity to `vector`.
    async fn nearest(
        &self,
        vector: &[f32],
        k: usize,
        filter: &NeighborFilter,
    ) -> CoreResult<Vec<(LogEntry, f32)>>;
}
