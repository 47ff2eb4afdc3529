//! Analysis Session
//!
//! Per-request mutable state of the orchestrator and the retry router that
//! decides, after each validated draft, whether to save or re-analyze.
//! Created when a request starts and dropped when it ends; never persisted.

use std::time::Instant;

use log_triage_core::LogEntry;
use log_triage_validation::AggregatedVerdict;

use super::outcome::{PhaseTimings, RetryCounts};
use crate::services::strategy::StrategyDecision;

/// Retry budgets, one per failure cause
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryLimits {
    pub max_language_retries: u32,
    pub max_validation_retries: u32,
}

/// What the router decided for a validated draft
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// The draft passed validation
    Save,
    /// A budget is spent; save the draft anyway with this warning
    SaveBestEffort(String),
    /// Re-analyze, charging the flagged counters
    Retry { language: bool, validation: bool },
}

/// Route a verdict.
///
/// Budgets are checked before charging: once either counter reaches its
/// maximum the current draft is kept. A verdict that fails both the language
/// check and another check charges both counters.
pub fn route(verdict: &AggregatedVerdict, retries: RetryCounts, limits: RetryLimits) -> RetryDecision {
    if verdict.passed {
        return RetryDecision::Save;
    }

    if retries.language >= limits.max_language_retries
        || retries.validation >= limits.max_validation_retries
    {
        return RetryDecision::SaveBestEffort(format!(
            "validation did not pass after {} language and {} validation retries (score {:.2}); saved best effort",
            retries.language, retries.validation, verdict.overall_score
        ));
    }

    let language = verdict.language_failed();
    let validation = verdict.quality_failed();
    RetryDecision::Retry {
        language,
        // A failed verdict always charges something, so the loop is bounded.
        validation: validation || !language,
    }
}

/// Mutable state of one request
#[derive(Debug)]
pub struct AnalysisSession {
    pub started: Instant,
    pub related: Vec<LogEntry>,
    pub decision: Option<StrategyDecision>,
    pub retries: RetryCounts,
    pub verdict: Option<AggregatedVerdict>,
    pub feedback: Vec<String>,
    pub warning: Option<String>,
    pub timings: PhaseTimings,
}

impl AnalysisSession {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            related: Vec::new(),
            decision: None,
            retries: RetryCounts::default(),
            verdict: None,
            feedback: Vec::new(),
            warning: None,
            timings: PhaseTimings::default(),
        }
    }

    /// Charge the counters flagged by a `Retry` decision and keep the
    /// verdict's suggestions as feedback for the next attempt.
    pub fn charge_retry(&mut self, language: bool, validation: bool, verdict: &AggregatedVerdict) {
        if language {
            self.retries.language += 1;
        }
        if validation {
            self.retries.validation += 1;
        }
        self.feedback = verdict.suggestions.clone();
    }
}

impl Default for AnalysisSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Milliseconds since `since`, saturating
pub fn elapsed_ms(since: Instant) -> u64 {
    since.elapsed().as_millis().min(u64::MAX as u128) as u64
}
