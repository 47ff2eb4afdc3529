//! Orchestrator session tests

use std::sync::Arc;
use std::time::Duration;

use log_triage::models::settings::AnalyzerSettings;
use log_triage::{RetryCounts, Strategy};
use log_triage_core::{AnalysisResult, AnalysisType, CacheTier, LogStore, TargetType};

use crate::support::{error_entry, Harness, Reply, ScriptedLlm, NPE_MESSAGE, PROJECT};

const BUSINESS_MESSAGE: &str = "com.shop.BusinessException: coupon SPRING24 already redeemed";

// ============================================================================
// Happy paths
// ============================================================================

#[tokio::test]
async fn test_single_log_without_trace() {
    let log = error_entry("L1", NPE_MESSAGE, None, 0);
    let llm = Arc::new(ScriptedLlm::passing(&log));
    let h = Harness::new(AnalyzerSettings::default(), llm.clone());
    h.insert(&[log]).await;

    let outcome = h.orchestrator.analyze(PROJECT, "L1").await;

    assert!(outcome.is_success(), "{:?}", outcome.error);
    assert!(!outcome.from_cache);
    assert_eq!(outcome.strategy_used, Some(Strategy::Single));
    assert_eq!(outcome.related_log_count, 1);
    assert_eq!(outcome.retries, RetryCounts::default());
    assert_eq!(llm.calls(), 1);
    assert_eq!(llm.phases(), vec!["single"]);

    let result = outcome.result.unwrap();
    assert_eq!(result.analysis_type, AnalysisType::Single);
    assert_eq!(result.target_type, TargetType::Log);
    assert!(!result.accepted_with_warnings);
    assert!(result.validation_score.unwrap() >= 0.7);
    assert!(outcome.verdict.unwrap().passed);

    let stored = h.stored("L1").await;
    assert_eq!(stored.analysis.unwrap().summary, result.summary);
}

#[tokio::test]
async fn test_direct_strategy_propagates_to_trace() {
    let logs = vec![
        error_entry("T1", NPE_MESSAGE, Some("trace-d"), 0),
        error_entry("T2", "order aborted", Some("trace-d"), 800),
        error_entry("T3", "checkout rolled back", Some("trace-d"), 1600),
    ];
    let llm = Arc::new(ScriptedLlm::passing(&logs[0]));
    let h = Harness::new(AnalyzerSettings::default(), llm.clone());
    h.insert(&logs).await;

    let outcome = h.orchestrator.analyze(PROJECT, "T1").await;

    assert!(outcome.is_success(), "{:?}", outcome.error);
    assert_eq!(outcome.strategy_used, Some(Strategy::Direct));
    assert_eq!(outcome.related_log_count, 3);
    assert_eq!(llm.phases(), vec!["direct"]);
    assert_eq!(outcome.propagated_to, vec!["T2".to_string(), "T3".to_string()]);

    let result = outcome.result.unwrap();
    assert_eq!(result.analysis_type, AnalysisType::TraceBased);
    assert_eq!(result.target_type, TargetType::Trace);

    // Every log in the trace holds the same analysis, timestamp included.
    for id in ["T1", "T2", "T3"] {
        let stored = h.stored(id).await.analysis.unwrap();
        assert_eq!(stored.analyzed_at, result.analyzed_at, "log {}", id);
        assert_eq!(stored.summary, result.summary);
    }
}

#[tokio::test]
async fn test_second_request_is_direct_hit() {
    let log = error_entry("L1", NPE_MESSAGE, None, 0);
    let llm = Arc::new(ScriptedLlm::passing(&log));
    let h = Harness::new(AnalyzerSettings::default(), llm.clone());
    h.insert(&[log]).await;

    let first = h.orchestrator.analyze(PROJECT, "L1").await;
    let second = h.orchestrator.analyze(PROJECT, "L1").await;

    assert!(second.is_success());
    assert!(second.from_cache);
    assert_eq!(second.cache_tier, Some(CacheTier::Direct));
    assert_eq!(second.strategy_used, None);
    let (first, second) = (first.result.unwrap(), second.result.unwrap());
    assert_eq!(second.summary, first.summary);
    assert_eq!(second.analyzed_at, first.analyzed_at);
    assert_eq!(llm.calls(), 1);
}

#[tokio::test]
async fn test_existing_analysis_on_siblings_is_not_overwritten() {
    let logs = vec![
        error_entry("T1", NPE_MESSAGE, Some("trace-k"), 0),
        error_entry("T2", "order aborted", Some("trace-k"), 500),
    ];
    let llm = Arc::new(ScriptedLlm::passing(&logs[0]));
    let mut settings = AnalyzerSettings::default();
    // Keep the trace tier from answering with T2's analysis.
    settings.trace_cache_window_secs = 0;
    let h = Harness::new(settings, llm.clone());
    h.insert(&logs).await;

    let earlier = earlier_result("Earlier analysis of the aborted order");
    h.db.patch_analysis(PROJECT, "T2", &earlier).await.unwrap();

    let outcome = h.orchestrator.analyze(PROJECT, "T1").await;

    assert!(outcome.is_success(), "{:?}", outcome.error);
    assert!(outcome.propagated_to.is_empty());
    assert_eq!(h.stored("T2").await.analysis.unwrap().summary, earlier.summary);
}

fn earlier_result(summary: &str) -> AnalysisResult {
    AnalysisResult {
        summary: summary.to_string(),
        error_cause: "Recorded by an earlier run of the analyzer.".to_string(),
        solution: "- nothing to do".to_string(),
        tags: ["LOW".to_string()].into_iter().collect(),
        analysis_type: AnalysisType::Single,
        target_type: TargetType::Log,
        analyzed_at: chrono::Utc::now(),
        validation_score: Some(0.9),
        accepted_with_warnings: false,
    }
}

// ============================================================================
// Retry routing
// ============================================================================

#[tokio::test]
async fn test_classification_mismatch_exhausts_validation_retries() {
    let log = error_entry("U1", BUSINESS_MESSAGE, None, 0);
    let llm = Arc::new(ScriptedLlm::passing(&log));
    let mut settings = AnalyzerSettings::default();
    settings.max_validation_retries = 1;
    let h = Harness::new(settings, llm.clone());
    h.insert(&[log]).await;

    let outcome = h.orchestrator.analyze(PROJECT, "U1").await;

    assert!(outcome.is_success(), "{:?}", outcome.error);
    assert_eq!(llm.analysis_calls(), 2);
    assert_eq!(outcome.retries, RetryCounts { language: 0, validation: 1 });
    assert!(outcome.warning.is_some());

    let result = outcome.result.unwrap();
    assert!(result.accepted_with_warnings);
    let verdict = outcome.verdict.unwrap();
    assert!(!verdict.passed);
    assert_eq!(verdict.verdict("classification").map(|v| v.score), Some(0.0));

    // Best effort is still persisted.
    assert!(h.stored("U1").await.analysis.unwrap().accepted_with_warnings);
}

#[tokio::test]
async fn test_language_retry_then_pass() {
    let log = error_entry("L1", NPE_MESSAGE, None, 0);
    let llm = Arc::new(ScriptedLlm::new(&log, vec![Reply::Korean], Reply::Passing));
    let h = Harness::new(AnalyzerSettings::default(), llm.clone());
    h.insert(&[log]).await;

    let outcome = h.orchestrator.analyze(PROJECT, "L1").await;

    assert!(outcome.is_success(), "{:?}", outcome.error);
    assert_eq!(llm.analysis_calls(), 2);
    assert_eq!(outcome.retries, RetryCounts { language: 1, validation: 0 });
    assert!(outcome.warning.is_none());
    assert!(!outcome.result.unwrap().accepted_with_warnings);
    assert_eq!(outcome.timings.attempts, 2);
}

#[tokio::test]
async fn test_retries_terminate_with_best_effort() {
    let log = error_entry("L1", NPE_MESSAGE, None, 0);
    let script = vec![
        Reply::Korean,
        Reply::Vague,
        Reply::Korean,
        Reply::Vague,
        Reply::Korean,
        Reply::Vague,
    ];
    let llm = Arc::new(ScriptedLlm::new(&log, script, Reply::Vague));
    let settings = AnalyzerSettings::default();
    let bound = (settings.max_language_retries + settings.max_validation_retries + 1) as usize;
    let h = Harness::new(settings, llm.clone());
    h.insert(&[log]).await;

    let outcome = h.orchestrator.analyze(PROJECT, "L1").await;

    assert!(outcome.is_success(), "{:?}", outcome.error);
    assert!(llm.analysis_calls() <= bound, "{} calls", llm.analysis_calls());
    assert!(outcome.warning.is_some());
    assert!(outcome.result.unwrap().accepted_with_warnings);
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_unknown_log_is_not_found() {
    let log = error_entry("L1", NPE_MESSAGE, None, 0);
    let llm = Arc::new(ScriptedLlm::passing(&log));
    let h = Harness::new(AnalyzerSettings::default(), llm.clone());

    let outcome = h.orchestrator.analyze(PROJECT, "missing").await;

    assert!(!outcome.is_success());
    assert!(outcome.result.is_none());
    assert!(outcome.error.unwrap().starts_with("Not found"));
    assert_eq!(llm.calls(), 0);
}

#[tokio::test]
async fn test_llm_failure_persists_nothing() {
    let log = error_entry("L1", NPE_MESSAGE, None, 0);
    let llm = Arc::new(ScriptedLlm::new(&log, vec![], Reply::Fail));
    let h = Harness::new(AnalyzerSettings::default(), llm.clone());
    h.insert(&[log]).await;

    let outcome = h.orchestrator.analyze(PROJECT, "L1").await;

    assert!(outcome.result.is_none());
    assert!(outcome.error.unwrap().starts_with("Analysis failure"));
    assert_eq!(outcome.strategy_used, Some(Strategy::Single));
    assert!(h.stored("L1").await.analysis.is_none());
}

#[tokio::test]
async fn test_timeout_persists_nothing() {
    let log = error_entry("L1", NPE_MESSAGE, Some("trace-slow"), 0);
    let sibling = error_entry("L2", "order aborted", Some("trace-slow"), 300);
    let llm = Arc::new(ScriptedLlm::passing(&log).with_delay(Duration::from_millis(500)));
    let h = Harness::new(AnalyzerSettings::default(), llm.clone());
    h.insert(&[log, sibling]).await;

    let outcome = h
        .orchestrator
        .analyze_with_timeout(PROJECT, "L1", Duration::from_millis(50))
        .await;

    assert!(outcome.result.is_none());
    assert!(outcome.error.unwrap().starts_with("Timed out"));
    assert!(outcome.warning.is_none());
    assert!(h.stored("L1").await.analysis.is_none());
    assert!(h.stored("L2").await.analysis.is_none());
}

#[tokio::test]
async fn test_oversized_durations_do_not_abort_the_session() {
    let logs = vec![
        error_entry("T1", NPE_MESSAGE, Some("trace-wide"), 0),
        error_entry("T2", "order aborted", Some("trace-wide"), 900),
    ];
    let llm = Arc::new(ScriptedLlm::passing(&logs[0]));
    let mut settings = AnalyzerSettings::default();
    settings.similarity_ttl_secs = 10_000_000_000_000;
    settings.trace_cache_window_secs = u64::MAX;
    settings.related_window_secs = u64::MAX;
    assert!(settings.validate().is_err());
    let h = Harness::new(settings, llm.clone());
    h.insert(&logs).await;

    let outcome = h.orchestrator.analyze(PROJECT, "T1").await;

    assert!(outcome.is_success(), "{:?}", outcome.error);
    assert_eq!(outcome.related_log_count, 2);
    assert_eq!(outcome.propagated_to, vec!["T2".to_string()]);
}

// ============================================================================
// Concurrency
// ============================================================================

#[tokio::test]
async fn test_concurrent_requests_for_one_trace_share_an_analysis() {
    let logs = vec![
        error_entry("T1", NPE_MESSAGE, Some("trace-c"), 0),
        error_entry("T2", "order aborted", Some("trace-c"), 400),
    ];
    let llm = Arc::new(ScriptedLlm::passing(&logs[0]).with_delay(Duration::from_millis(20)));
    let h = Harness::new(AnalyzerSettings::default(), llm.clone());
    h.insert(&logs).await;

    let (a, b) = tokio::join!(
        h.orchestrator.analyze(PROJECT, "T1"),
        h.orchestrator.analyze(PROJECT, "T2")
    );

    assert!(a.is_success(), "{:?}", a.error);
    assert!(b.is_success(), "{:?}", b.error);
    assert_eq!(llm.analysis_calls(), 1);
    assert_eq!([a.from_cache, b.from_cache].iter().filter(|c| **c).count(), 1);
    assert_eq!(a.result.unwrap().analyzed_at, b.result.unwrap().analyzed_at);
}
