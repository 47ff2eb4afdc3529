//! Orchestrator Service
//!
//! Drives one analysis request end to end:
//!
//! ```text
//! Fetch -> CheckDirectCache -> CheckTraceCache -> CheckSimilarityCache
//!       -> CollectRelatedLogs -> SelectStrategy -> Analyze -> Validate
//!       -> { Analyze (retry) | SaveResult } -> End
//! ```
//!
//! Everything up to the final draft runs under the caller's deadline; saving
//! runs after it, so a timed-out request persists nothing. The retry router is
//! the only loop and is bounded by the two retry budgets.

use std::sync::Arc;
use std::time::{Duration, Instant};

use log_triage_core::{
    AnalysisResult, CacheHit, CacheTier, CoreError, CoreResult, LogEntry, LogStore, VectorIndex,
};
use log_triage_llm::LlmProvider;
use log_triage_validation::ValidationPipeline;

use super::inflight::{request_key, InFlightGuard, InFlightLocks};
use super::outcome::AnalysisOutcome;
use super::session::{elapsed_ms, route, AnalysisSession, RetryDecision, RetryLimits};
use crate::models::settings::AnalyzerSettings;
use crate::services::analysis::{AnalysisExecutor, AnalysisRequest};
use crate::services::cache::similarity::SimilarityOptions;
use crate::services::cache::{
    CacheLookup, CacheResolver, DirectCache, SimilarityCache, TraceCache,
};
use crate::services::embedding::EmbeddingService;
use crate::services::strategy::StrategySelector;

/// How the final analysis was obtained
enum Resolution {
    Cached(CacheHit),
    Analyzed(AnalysisResult),
}

/// State carried from the deadline-bound phase into SaveResult
struct Prepared {
    log: LogEntry,
    resolution: Resolution,
    _guard: Option<InFlightGuard>,
}

/// Cache-first log analysis orchestrator.
///
/// All collaborators are injected at construction; the orchestrator holds no
/// global state and can be shared behind an `Arc`.
pub struct LogAnalysisOrchestrator {
    settings: AnalyzerSettings,
    store: Arc<dyn LogStore>,
    cache: CacheResolver,
    selector: StrategySelector,
    executor: AnalysisExecutor,
    pipeline: ValidationPipeline,
    locks: Option<InFlightLocks>,
}

impl LogAnalysisOrchestrator {
    pub fn new(
        settings: AnalyzerSettings,
        store: Arc<dyn LogStore>,
        index: Arc<dyn VectorIndex>,
        embeddings: Arc<EmbeddingService>,
        llm: Arc<dyn LlmProvider>,
    ) -> Self {
        let mut tiers: Vec<Box<dyn CacheLookup>> = vec![
            Box::new(DirectCache::new()),
            Box::new(TraceCache::new(
                store.clone(),
                settings.trace_cache_window(),
                settings.max_related_logs,
            )),
        ];
        if settings.similarity_enabled {
            tiers.push(Box::new(SimilarityCache::new(
                embeddings,
                index,
                store.clone(),
                SimilarityOptions {
                    threshold: settings.similarity_threshold,
                    top_k: settings.similarity_top_k,
                    ttl: settings.similarity_ttl(),
                },
            )));
        }

        let selector = StrategySelector::new(
            settings.map_reduce_threshold,
            settings.chunk_size,
            settings.max_map_chunks,
        );
        let executor = AnalysisExecutor::new(
            llm,
            settings.validation.target_language,
            settings.map_concurrency,
        );
        let pipeline = ValidationPipeline::new(&settings.validation);
        let locks = settings.dedupe_in_flight.then(InFlightLocks::new);

        Self {
            settings,
            store,
            cache: CacheResolver::new(tiers),
            selector,
            executor,
            pipeline,
            locks,
        }
    }

    pub fn settings(&self) -> &AnalyzerSettings {
        &self.settings
    }

    /// Cache tiers in lookup order
    pub fn cache_tiers(&self) -> Vec<CacheTier> {
        self.cache.tiers()
    }

    fn limits(&self) -> RetryLimits {
        RetryLimits {
            max_language_retries: self.settings.max_language_retries,
            max_validation_retries: self.settings.max_validation_retries,
        }
    }

    /// Analyze a log under the configured default deadline.
    pub async fn analyze(&self, project_id: &str, log_id: &str) -> AnalysisOutcome {
        let timeout = Duration::from_secs(self.settings.request_timeout_secs);
        self.analyze_with_timeout(project_id, log_id, timeout).await
    }

    /// Analyze a log, abandoning the session without persistence when
    /// `timeout` elapses before a final draft exists.
    pub async fn analyze_with_timeout(
        &self,
        project_id: &str,
        log_id: &str,
        timeout: Duration,
    ) -> AnalysisOutcome {
        tracing::info!(project_id, log_id, "orchestrator: analysis requested");

        let mut session = AnalysisSession::new();
        let outcome = AnalysisOutcome::new(project_id, log_id);

        let prepared =
            match tokio::time::timeout(timeout, self.prepare(project_id, log_id, &mut session))
                .await
            {
                Ok(Ok(prepared)) => prepared,
                Ok(Err(e)) => {
                    tracing::warn!(project_id, log_id, error = %e, "orchestrator: session failed");
                    return finish(outcome.with_error(&e), session);
                }
                Err(_) => {
                    let e = CoreError::timeout(format!(
                        "analysis of {} exceeded {} ms",
                        log_id,
                        timeout.as_millis()
                    ));
                    tracing::warn!(project_id, log_id, "orchestrator: session timed out");
                    return finish(outcome.with_error(&e), session);
                }
            };

        let save_started = Instant::now();
        let outcome = self.save(prepared, outcome, &session).await;
        session.timings.save_ms = elapsed_ms(save_started);
        finish(outcome, session)
    }

    /// Fetch through the retry router; everything that may be abandoned.
    async fn prepare(
        &self,
        project_id: &str,
        log_id: &str,
        session: &mut AnalysisSession,
    ) -> CoreResult<Prepared> {
        // Fetch
        let started = Instant::now();
        let mut log = self.store.get(project_id, log_id).await?;
        session.timings.fetch_ms = elapsed_ms(started);

        let guard = match &self.locks {
            Some(locks) => {
                let key = request_key(project_id, &log.id, log.trace());
                let guard = locks.acquire(&key).await;
                if guard.waited() {
                    // The request we waited on may have saved an analysis.
                    log = self.store.get(project_id, log_id).await?;
                }
                Some(guard)
            }
            None => None,
        };

        // CheckDirectCache / CheckTraceCache / CheckSimilarityCache
        let started = Instant::now();
        let hit = self.cache.resolve(&log).await?;
        session.timings.cache_ms = elapsed_ms(started);
        if let Some(hit) = hit {
            return Ok(Prepared {
                log,
                resolution: Resolution::Cached(hit),
                _guard: guard,
            });
        }

        // CollectRelatedLogs
        let started = Instant::now();
        session.related = self.collect_related(&log).await?;
        session.timings.collect_ms = elapsed_ms(started);

        // SelectStrategy
        let decision = self.selector.select(session.related.len());
        session.decision = Some(decision);
        tracing::info!(
            log_id = %log.id,
            strategy = %decision.strategy,
            related = decision.related_log_count,
            chunks = decision.chunk_count(),
            "orchestrator: strategy selected"
        );

        // Analyze -> Validate -> route
        let limits = self.limits();
        let result = loop {
            session.timings.attempts += 1;

            let started = Instant::now();
            let mut draft = self
                .executor
                .execute(AnalysisRequest {
                    center: &log,
                    related: &session.related,
                    decision,
                    feedback: &session.feedback,
                })
                .await?;
            session.timings.analysis_ms += elapsed_ms(started);

            let started = Instant::now();
            let verdict = self.pipeline.validate(&draft, &log);
            session.timings.validation_ms += elapsed_ms(started);
            draft.validation_score = Some(verdict.overall_score);

            match route(&verdict, session.retries, limits) {
                RetryDecision::Save => {
                    session.verdict = Some(verdict);
                    break draft;
                }
                RetryDecision::SaveBestEffort(warning) => {
                    tracing::warn!(log_id = %log.id, %warning, "orchestrator: retries exhausted");
                    draft.accepted_with_warnings = true;
                    session.warning = Some(warning);
                    session.verdict = Some(verdict);
                    break draft;
                }
                RetryDecision::Retry {
                    language,
                    validation,
                } => {
                    session.charge_retry(language, validation, &verdict);
                    tracing::info!(
                        log_id = %log.id,
                        language_retries = session.retries.language,
                        validation_retries = session.retries.validation,
                        score = verdict.overall_score,
                        "orchestrator: draft rejected, retrying"
                    );
                    session.verdict = Some(verdict);
                }
            }
        };

        Ok(Prepared {
            log,
            resolution: Resolution::Analyzed(result),
            _guard: guard,
        })
    }

    /// Trace siblings around the log, the log itself included.
    async fn collect_related(&self, log: &LogEntry) -> CoreResult<Vec<LogEntry>> {
        let Some(trace_id) = log.trace() else {
            return Ok(vec![log.clone()]);
        };

        let max = self.settings.max_related_logs;
        let mut related = self
            .store
            .find_by_trace(
                &log.project_id,
                trace_id,
                log.timestamp,
                self.settings.related_window(),
                max,
            )
            .await?;

        if !related.iter().any(|entry| entry.id == log.id) {
            if related.len() >= max {
                related.truncate(max.saturating_sub(1));
            }
            related.push(log.clone());
            related.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));
        }
        Ok(related)
    }

    /// SaveResult: persist onto the source log and propagate new results.
    async fn save(
        &self,
        prepared: Prepared,
        outcome: AnalysisOutcome,
        session: &AnalysisSession,
    ) -> AnalysisOutcome {
        let Prepared {
            log, resolution, ..
        } = prepared;

        match resolution {
            Resolution::Cached(hit) => {
                // Persisting Trace/Similarity hits makes the next request a Direct hit.
                if hit.tier != CacheTier::Direct {
                    if let Err(e) = self
                        .store
                        .patch_analysis(&log.project_id, &log.id, &hit.result)
                        .await
                    {
                        return outcome.with_error(&e);
                    }
                }
                outcome.with_cache_hit(hit)
            }
            Resolution::Analyzed(result) => {
                if let Err(e) = self
                    .store
                    .patch_analysis(&log.project_id, &log.id, &result)
                    .await
                {
                    return outcome.with_error(&e);
                }

                let mut outcome = outcome;
                for sibling in session
                    .related
                    .iter()
                    .filter(|s| s.id != log.id && s.analysis.is_none())
                {
                    match self
                        .store
                        .patch_analysis(&sibling.project_id, &sibling.id, &result)
                        .await
                    {
                        Ok(()) => outcome.propagated_to.push(sibling.id.clone()),
                        Err(e) => tracing::warn!(
                            log_id = %sibling.id,
                            error = %e,
                            "orchestrator: propagation failed"
                        ),
                    }
                }

                tracing::info!(
                    log_id = %log.id,
                    propagated = outcome.propagated_to.len(),
                    accepted_with_warnings = result.accepted_with_warnings,
                    "orchestrator: analysis saved"
                );
                outcome.result = Some(result);
                outcome
            }
        }
    }
}

/// Copy session metadata onto the outcome.
fn finish(mut outcome: AnalysisOutcome, session: AnalysisSession) -> AnalysisOutcome {
    outcome.strategy_used = session.decision.map(|d| d.strategy);
    outcome.related_log_count = session
        .decision
        .map(|d| d.related_log_count)
        .unwrap_or(0);
    outcome.retries = session.retries;
    outcome.verdict = session.verdict;
    if outcome.error.is_none() {
        outcome.warning = session.warning;
    }
    outcome.timings = session.timings;
    outcome.timings.total_ms = elapsed_ms(session.started);
    outcome
}
