//! Analysis Executor
//!
//! Runs one analysis attempt for a chosen strategy:
//! - SINGLE: one call over the center log
//! - DIRECT: one call over every related log, center marked
//! - MAP_REDUCE: one light call per chunk (concurrent), then one Reduce call
//!   over the chunk digests
//!
//! A Map chunk that fails degrades to a raw excerpt of its logs. Any failure
//! of a Single, Direct, or Reduce call is an `AnalysisFailure`.

use std::sync::Arc;

use futures_util::stream::{self, StreamExt};
use log_triage_core::{AnalysisResult, AnalysisType, CoreResult, LogEntry, TargetType};
use log_triage_llm::{complete_structured, LlmProvider};
use log_triage_validation::TargetLanguage;

use super::draft::{AnalysisDraft, ChunkDigest};
use super::prompts;
use crate::services::strategy::{Strategy, StrategyDecision};

/// Characters of raw log text kept when a Map chunk falls back.
const RAW_EXCERPT_CHARS: usize = 1200;

/// Inputs of one analysis attempt.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisRequest<'a> {
    /// The log being analyzed
    pub center: &'a LogEntry,
    /// Related logs in time order (the center included when it has a trace)
    pub related: &'a [LogEntry],
    /// Strategy and chunking
    pub decision: StrategyDecision,
    /// Suggestions from the previous attempt's verdict
    pub feedback: &'a [String],
}

/// Executes analysis attempts against an LLM provider.
pub struct AnalysisExecutor {
    llm: Arc<dyn LlmProvider>,
    language: TargetLanguage,
    map_concurrency: usize,
}

impl AnalysisExecutor {
    pub fn new(llm: Arc<dyn LlmProvider>, language: TargetLanguage, map_concurrency: usize) -> Self {
        Self {
            llm,
            language,
            map_concurrency: map_concurrency.max(1),
        }
    }

    /// Run one attempt and return the draft result.
    pub async fn execute(&self, request: AnalysisRequest<'_>) -> CoreResult<AnalysisResult> {
        match request.decision.strategy {
            Strategy::Single => self.single(request.center, request.feedback).await,
            Strategy::Direct => {
                self.direct(request.center, request.related, request.feedback)
                    .await
            }
            Strategy::MapReduce => self.map_reduce(request).await,
        }
    }

    async fn single(&self, log: &LogEntry, feedback: &[String]) -> CoreResult<AnalysisResult> {
        let system = prompts::analysis_system_prompt(self.language);
        let prompt = prompts::single_prompt(log, feedback);
        let draft: AnalysisDraft =
            complete_structured(self.llm.as_ref(), &system, &prompt, "analysis_draft", "single")
                .await?;
        Ok(draft.into_result(AnalysisType::Single, TargetType::Log))
    }

    async fn direct(
        &self,
        center: &LogEntry,
        related: &[LogEntry],
        feedback: &[String],
    ) -> CoreResult<AnalysisResult> {
        let system = prompts::analysis_system_prompt(self.language);
        let prompt = prompts::direct_prompt(center, related, feedback);
        let draft: AnalysisDraft =
            complete_structured(self.llm.as_ref(), &system, &prompt, "analysis_draft", "direct")
                .await?;
        Ok(draft.into_result(AnalysisType::TraceBased, TargetType::Trace))
    }

    async fn map_reduce(&self, request: AnalysisRequest<'_>) -> CoreResult<AnalysisResult> {
        let chunk_size = request.decision.chunk_size.max(1);
        let chunks: Vec<&[LogEntry]> = request.related.chunks(chunk_size).collect();
        let total = chunks.len();

        tracing::info!(
            log_id = %request.center.id,
            chunks = total,
            chunk_size,
            "analysis: map phase started"
        );

        let digests: Vec<ChunkDigest> = stream::iter(chunks.into_iter().enumerate())
            .map(|(index, chunk)| self.map_chunk(chunk, index, total))
            .buffered(self.map_concurrency)
            .collect()
            .await;

        let system = prompts::analysis_system_prompt(self.language);
        let prompt = prompts::reduce_prompt(request.center, &digests, request.feedback);
        let draft: AnalysisDraft =
            complete_structured(self.llm.as_ref(), &system, &prompt, "analysis_draft", "reduce")
                .await?;
        Ok(draft.into_result(AnalysisType::TraceBased, TargetType::Trace))
    }

    /// Summarize one chunk; never fails.
    async fn map_chunk(&self, chunk: &[LogEntry], index: usize, total: usize) -> ChunkDigest {
        let system = prompts::map_system_prompt();
        let prompt = prompts::map_prompt(chunk, index, total);
        match complete_structured::<ChunkDigest>(
            self.llm.as_ref(),
            &system,
            &prompt,
            "chunk_digest",
            "map",
        )
        .await
        {
            Ok(digest) => digest,
            Err(e) => {
                tracing::warn!(chunk = index, error = %e, "analysis: map chunk failed, using raw excerpt");
                raw_excerpt(chunk)
            }
        }
    }
}

/// Fallback digest built from the chunk's own log lines.
pub fn raw_excerpt(chunk: &[LogEntry]) -> ChunkDigest {
    let mut summary = String::new();
    for entry in chunk {
        let line = format!("[{}] {} {}: {}\n", entry.level, entry.id, entry.service, entry.message);
        summary.push_str(&line);
    }
    if summary.chars().count() > RAW_EXCERPT_CHARS {
        summary = summary.chars().take(RAW_EXCERPT_CHARS).collect();
        summary.push_str("...");
    }

    let mut services: Vec<String> = chunk.iter().map(|e| e.service.clone()).collect();
    services.sort();
    services.dedup();

    let key_errors = chunk
        .iter()
        .filter(|e| e.level.is_error())
        .take(5)
        .map(|e| e.message.chars().take(200).collect())
        .collect();

    ChunkDigest {
        summary: format!("(raw excerpt)\n{}", summary.trim_end()),
        key_errors,
        services,
    }
}
