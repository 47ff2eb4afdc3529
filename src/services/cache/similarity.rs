//! Similarity cache: an analysis on a different log with a near-identical
//! message.
//!
//! The requester's embedding is taken from the entry when present, otherwise
//! computed from `message` plus the first stack-trace line and written back
//! to the store so the log becomes searchable once it is analyzed. Candidates
//! must share the requester's project, level, service and source type, carry
//! an analysis younger than the TTL, and must not be the requester itself.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use log_triage_core::{
    CacheHit, CacheTier, CoreError, CoreResult, LogEntry, LogStore, NeighborFilter, VectorIndex,
};

use super::CacheLookup;
use crate::services::embedding::EmbeddingService;

/// Tuning of the similarity tier
#[derive(Debug, Clone, Copy)]
pub struct SimilarityOptions {
    /// Minimum cosine score for a hit
    pub threshold: f32,
    /// Candidates requested from the index
    pub top_k: usize,
    /// Maximum age of a reusable analysis
    pub ttl: Duration,
}

/// Reuses the analysis of the most similar analyzed log.
pub struct SimilarityCache {
    embeddings: Arc<EmbeddingService>,
    index: Arc<dyn VectorIndex>,
    store: Arc<dyn LogStore>,
    options: SimilarityOptions,
}

impl SimilarityCache {
    pub fn new(
        embeddings: Arc<EmbeddingService>,
        index: Arc<dyn VectorIndex>,
        store: Arc<dyn LogStore>,
        options: SimilarityOptions,
    ) -> Self {
        Self {
            embeddings,
            index,
            store,
            options,
        }
    }

    async fn vector_for(&self, log: &LogEntry) -> CoreResult<Vec<f32>> {
        if let Some(vector) = log.embedding_vector.as_ref().filter(|v| !v.is_empty()) {
            return Ok(vector.clone());
        }

        let vector = self
            .embeddings
            .embed(&log.embedding_text())
            .await
            .map_err(CoreError::from)?;

        if let Err(e) = self
            .store
            .store_embedding(&log.project_id, &log.id, &vector)
            .await
        {
            tracing::warn!(log_id = %log.id, error = %e, "cache: failed to store embedding");
        }
        Ok(vector)
    }
}

#[async_trait]
impl CacheLookup for SimilarityCache {
    fn tier(&self) -> CacheTier {
        CacheTier::Similarity
    }

    async fn lookup(&self, log: &LogEntry) -> CoreResult<Option<CacheHit>> {
        let vector = self.vector_for(log).await?;
        // A TTL too large to subtract from now means nothing expires.
        let cutoff = Utc::now().checked_sub_signed(self.options.ttl);
        let filter = NeighborFilter::for_entry(log).with_analyzed_after(cutoff);
        // One extra candidate so dropping the requester still leaves top_k.
        let candidates = self
            .index
            .nearest(&vector, self.options.top_k + 1, &filter)
            .await?;

        let best = candidates
            .into_iter()
            .filter(|(candidate, _)| candidate.id != log.id)
            .filter_map(|(candidate, score)| {
                let result = candidate.analysis?;
                Some((candidate.id, result, score))
            })
            .max_by(|a, b| a.2.total_cmp(&b.2));

        match best {
            Some((source_log_id, result, score)) if score >= self.options.threshold => {
                Ok(Some(CacheHit {
                    tier: CacheTier::Similarity,
                    result,
                    source_log_id,
                    score,
                }))
            }
            Some((source_log_id, _, score)) => {
                tracing::debug!(
                    log_id = %log.id,
                    nearest = %source_log_id,
                    score,
                    threshold = self.options.threshold,
                    "cache: nearest neighbor below threshold"
                );
                Ok(None)
            }
            None => Ok(None),
        }
    }
}
