//! Analysis Outcome
//!
//! The structured response of one `analyze` request. Callers always receive
//! an outcome; failures are an `error` string next to a `None` result.

use log_triage_core::{AnalysisResult, CacheHit, CacheTier, CoreError};
use log_triage_validation::AggregatedVerdict;
use serde::{Deserialize, Serialize};

use crate::services::strategy::Strategy;

/// Re-analyses performed, per cause
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryCounts {
    /// Retries caused by the target-language check
    pub language: u32,
    /// Retries caused by any other validation failure
    pub validation: u32,
}

impl RetryCounts {
    pub fn total(&self) -> u32 {
        self.language + self.validation
    }
}

/// Wall-clock milliseconds spent per phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseTimings {
    pub fetch_ms: u64,
    pub cache_ms: u64,
    pub collect_ms: u64,
    pub analysis_ms: u64,
    pub validation_ms: u64,
    pub save_ms: u64,
    pub total_ms: u64,
    /// LLM attempts made (Map-Reduce counts as one)
    pub attempts: u32,
}

/// Result of one `analyze` request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOutcome {
    pub project_id: String,
    pub log_id: String,
    /// The saved analysis; `None` when the session ended in an error
    pub result: Option<AnalysisResult>,
    pub from_cache: bool,
    pub cache_tier: Option<CacheTier>,
    /// Log whose analysis was reused by the similarity tier
    pub similar_log_id: Option<String>,
    pub similarity_score: Option<f32>,
    /// `None` on cache hits and on failures before strategy selection
    pub strategy_used: Option<Strategy>,
    pub related_log_count: usize,
    pub retries: RetryCounts,
    pub error: Option<String>,
    /// Set when retries were exhausted and the best effort was saved
    pub warning: Option<String>,
    /// Verdict of the last validated draft
    pub verdict: Option<AggregatedVerdict>,
    /// Related logs that received the new analysis
    pub propagated_to: Vec<String>,
    pub timings: PhaseTimings,
}

impl AnalysisOutcome {
    /// Empty outcome for a request
    pub fn new(project_id: &str, log_id: &str) -> Self {
        Self {
            project_id: project_id.to_string(),
            log_id: log_id.to_string(),
            result: None,
            from_cache: false,
            cache_tier: None,
            similar_log_id: None,
            similarity_score: None,
            strategy_used: None,
            related_log_count: 0,
            retries: RetryCounts::default(),
            error: None,
            warning: None,
            verdict: None,
            propagated_to: Vec::new(),
            timings: PhaseTimings::default(),
        }
    }

    /// Record a cache hit as the outcome's result
    pub fn with_cache_hit(mut self, hit: CacheHit) -> Self {
        self.from_cache = true;
        self.cache_tier = Some(hit.tier);
        if hit.tier == CacheTier::Similarity {
            self.similar_log_id = Some(hit.source_log_id);
            self.similarity_score = Some(hit.score);
        }
        self.result = Some(hit.result);
        self
    }

    /// End the outcome with an error; any result is dropped
    pub fn with_error(mut self, err: &CoreError) -> Self {
        self.result = None;
        self.error = Some(err.to_string());
        self
    }

    /// Whether the request produced a saved analysis
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.result.is_some()
    }
}
