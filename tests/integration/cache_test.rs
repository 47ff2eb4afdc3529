//! Cache tier tests through the orchestrator

use std::sync::Arc;

use chrono::Utc;
use log_triage::models::settings::AnalyzerSettings;
use log_triage_core::{AnalysisResult, AnalysisType, CacheTier, LogLevel, LogStore, TargetType};

use crate::support::{error_entry, Harness, ScriptedLlm, NPE_MESSAGE, PROJECT};

// ============================================================================
// Trace tier
// ============================================================================

#[tokio::test]
async fn test_trace_sibling_answers_without_llm() {
    let first = error_entry("L1", NPE_MESSAGE, Some("trace-t"), 0);
    let second = error_entry("L2", "payment step skipped", Some("trace-t"), 10_000);
    let llm = Arc::new(ScriptedLlm::passing(&first));
    let mut settings = AnalyzerSettings::default();
    // L2 sits outside the related window so L1's analysis is not propagated.
    settings.related_window_secs = 1;
    let h = Harness::new(settings, llm.clone());
    h.insert(&[first, second]).await;

    let analyzed = h.orchestrator.analyze(PROJECT, "L1").await;
    assert!(analyzed.propagated_to.is_empty());
    assert_eq!(llm.calls(), 1);

    let outcome = h.orchestrator.analyze(PROJECT, "L2").await;

    assert!(outcome.is_success(), "{:?}", outcome.error);
    assert!(outcome.from_cache);
    assert_eq!(outcome.cache_tier, Some(CacheTier::Trace));
    assert_eq!(llm.calls(), 1);

    // The hit is written onto L2, so the next request stops at the direct tier.
    let stored = h.stored("L2").await.analysis.unwrap();
    assert_eq!(stored.summary, analyzed.result.unwrap().summary);
    let again = h.orchestrator.analyze(PROJECT, "L2").await;
    assert_eq!(again.cache_tier, Some(CacheTier::Direct));
}

// ============================================================================
// Similarity tier
// ============================================================================

#[tokio::test]
async fn test_similar_message_reuses_analysis() {
    let first = error_entry("S1", NPE_MESSAGE, None, 0);
    let second = error_entry("S2", NPE_MESSAGE, None, 60_000);
    let llm = Arc::new(ScriptedLlm::passing(&first));
    let h = Harness::new(AnalyzerSettings::default(), llm.clone());
    h.insert(&[first, second]).await;

    h.orchestrator.analyze(PROJECT, "S1").await;
    let outcome = h.orchestrator.analyze(PROJECT, "S2").await;

    assert!(outcome.is_success(), "{:?}", outcome.error);
    assert_eq!(outcome.cache_tier, Some(CacheTier::Similarity));
    assert_eq!(outcome.similar_log_id.as_deref(), Some("S1"));
    assert!(outcome.similarity_score.unwrap() >= 0.92);
    assert_eq!(llm.calls(), 1);
    assert!(h.stored("S2").await.analysis.is_some());
}

#[tokio::test]
async fn test_expired_repeats_do_not_mask_fresh_analysis() {
    let requester = error_entry("R1", NPE_MESSAGE, None, 120_000);
    let llm = Arc::new(ScriptedLlm::passing(&requester));
    let settings = AnalyzerSettings::default();
    let stale_count = settings.similarity_top_k + 1;
    let h = Harness::new(settings, llm.clone());

    let vector = h.embeddings.embed(NPE_MESSAGE).await.unwrap();
    let mut stale = recorded_analysis();
    stale.analyzed_at = Utc::now() - chrono::Duration::days(30);
    for i in 0..stale_count {
        let entry = error_entry(&format!("A{}", i), NPE_MESSAGE, None, i as i64 * 1000)
            .with_embedding(vector.clone())
            .with_analysis(stale.clone());
        h.insert(&[entry]).await;
    }
    let fresh = error_entry("Z9", NPE_MESSAGE, None, 60_000)
        .with_embedding(vector.clone())
        .with_analysis(recorded_analysis());
    h.insert(&[fresh, requester]).await;

    let outcome = h.orchestrator.analyze(PROJECT, "R1").await;

    assert!(outcome.is_success(), "{:?}", outcome.error);
    assert_eq!(outcome.cache_tier, Some(CacheTier::Similarity));
    assert_eq!(outcome.similar_log_id.as_deref(), Some("Z9"));
    assert_eq!(llm.calls(), 0);
}

fn recorded_analysis() -> AnalysisResult {
    AnalysisResult {
        summary: "Null dereference in order-service while placing an order".to_string(),
        error_cause: "The order handler dereferenced a missing customer record.".to_string(),
        solution: "- Add a null check in `OrderService.place`".to_string(),
        tags: ["SYSTEM_ERROR".to_string(), "HIGH".to_string()].into_iter().collect(),
        analysis_type: AnalysisType::Single,
        target_type: TargetType::Log,
        analyzed_at: Utc::now(),
        validation_score: Some(0.9),
        accepted_with_warnings: false,
    }
}

#[tokio::test]
async fn test_log_never_matches_itself() {
    let log = error_entry("S1", NPE_MESSAGE, None, 0);
    let llm = Arc::new(ScriptedLlm::passing(&log));
    let h = Harness::new(AnalyzerSettings::default(), llm.clone());
    let embedded = log.clone().with_embedding(h.embeddings.embed(NPE_MESSAGE).await.unwrap());
    h.insert(&[embedded]).await;

    let outcome = h.orchestrator.analyze(PROJECT, "S1").await;

    assert!(!outcome.from_cache);
    assert_eq!(llm.calls(), 1);
}

#[tokio::test]
async fn test_different_level_is_not_similar() {
    let first = error_entry("S1", NPE_MESSAGE, None, 0);
    let mut second = error_entry("S2", NPE_MESSAGE, None, 60_000);
    second.level = LogLevel::Warn;
    let llm = Arc::new(ScriptedLlm::passing(&first));
    let h = Harness::new(AnalyzerSettings::default(), llm.clone());
    h.insert(&[first, second]).await;

    h.orchestrator.analyze(PROJECT, "S1").await;
    let outcome = h.orchestrator.analyze(PROJECT, "S2").await;

    assert!(!outcome.from_cache);
    assert_eq!(llm.analysis_calls(), 2);
}

#[tokio::test]
async fn test_similarity_disabled() {
    let first = error_entry("S1", NPE_MESSAGE, None, 0);
    let second = error_entry("S2", NPE_MESSAGE, None, 60_000);
    let llm = Arc::new(ScriptedLlm::passing(&first));
    let mut settings = AnalyzerSettings::default();
    settings.similarity_enabled = false;
    let h = Harness::new(settings, llm.clone());
    h.insert(&[first, second]).await;

    assert_eq!(
        h.orchestrator.cache_tiers(),
        vec![CacheTier::Direct, CacheTier::Trace]
    );

    h.orchestrator.analyze(PROJECT, "S1").await;
    let outcome = h.orchestrator.analyze(PROJECT, "S2").await;

    assert!(!outcome.from_cache);
    assert_eq!(llm.calls(), 2);
    // Without the tier nothing embeds the logs.
    assert!(h.db.get(PROJECT, "S1").await.unwrap().embedding_vector.is_none());
}
