//! Structured LLM Output Types
//!
//! The shapes the model is asked to produce. Each derives `JsonSchema` so the
//! schema sent with the request and the type the response is parsed into can
//! never drift apart.

use std::collections::BTreeSet;

use chrono::Utc;
use log_triage_core::{AnalysisResult, AnalysisType, TargetType};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Root-cause analysis produced by the Single, Direct, and Reduce calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnalysisDraft {
    /// One-sentence summary of what went wrong
    pub summary: String,
    /// Root cause, citing concrete facts from the log
    pub error_cause: String,
    /// Remediation with "Immediate actions" and "Prevention" sections
    pub solution: String,
    /// Classification (USER_ERROR or SYSTEM_ERROR), severity, and topic tags
    #[serde(default)]
    pub tags: Vec<String>,
}

impl AnalysisDraft {
    /// Convert into an `AnalysisResult` stamped now.
    ///
    /// Tags are trimmed, de-duplicated, and empty tags dropped.
    pub fn into_result(self, analysis_type: AnalysisType, target_type: TargetType) -> AnalysisResult {
        let tags: BTreeSet<String> = self
            .tags
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();

        AnalysisResult {
            summary: self.summary.trim().to_string(),
            error_cause: self.error_cause.trim().to_string(),
            solution: self.solution.trim().to_string(),
            tags,
            analysis_type,
            target_type,
            analyzed_at: Utc::now(),
            validation_score: None,
            accepted_with_warnings: false,
        }
    }
}

/// Condensed view of one Map chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ChunkDigest {
    /// What happened in this slice of the trace
    pub summary: String,
    /// Most significant error lines, verbatim where possible
    #[serde(default)]
    pub key_errors: Vec<String>,
    /// Services that appear in the chunk
    #[serde(default)]
    pub services: Vec<String>,
}
