//! Strategy selection tests

use std::sync::Arc;

use log_triage::models::settings::AnalyzerSettings;
use log_triage::services::strategy::StrategySelector;
use log_triage::Strategy;
use log_triage_core::{AnalysisType, LogEntry};

use crate::support::{error_entry, Harness, ScriptedLlm, NPE_MESSAGE, PROJECT};

fn trace_of(count: usize, trace: &str) -> Vec<LogEntry> {
    (0..count)
        .map(|i| {
            let message = if i == 0 { NPE_MESSAGE } else { "order step failed" };
            // Spread across +-4.5s around the first entry.
            let millis = (i as i64 % 2 * 2 - 1) * (i as i64 * 100);
            error_entry(&format!("M{:02}", i), message, Some(trace), millis)
        })
        .collect()
}

// ============================================================================
// Selector boundaries
// ============================================================================

#[test]
fn test_selector_boundaries() {
    let selector = StrategySelector::new(30, 25, 8);
    assert_eq!(selector.select(0).strategy, Strategy::Single);
    assert_eq!(selector.select(1).strategy, Strategy::Single);
    assert_eq!(selector.select(2).strategy, Strategy::Direct);
    assert_eq!(selector.select(30).strategy, Strategy::Direct);
    assert_eq!(selector.select(31).strategy, Strategy::MapReduce);
}

#[test]
fn test_chunk_count_respects_cap() {
    let selector = StrategySelector::new(30, 25, 8);
    assert_eq!(selector.select(45).chunk_count(), 2);
    let huge = selector.select(1000);
    assert!(huge.chunk_count() <= 8);
    assert!(huge.chunk_size * huge.chunk_count() >= 1000);
}

// ============================================================================
// Map-Reduce end to end
// ============================================================================

#[tokio::test]
async fn test_large_trace_uses_map_reduce() {
    let logs = trace_of(45, "trace-big");
    let llm = Arc::new(ScriptedLlm::passing(&logs[0]));
    let h = Harness::new(AnalyzerSettings::default(), llm.clone());
    h.insert(&logs).await;

    let outcome = h.orchestrator.analyze(PROJECT, "M00").await;

    assert!(outcome.is_success(), "{:?}", outcome.error);
    assert_eq!(outcome.strategy_used, Some(Strategy::MapReduce));
    assert_eq!(outcome.related_log_count, 45);
    assert_eq!(llm.calls(), 3);
    let phases = llm.phases();
    assert_eq!(phases.iter().filter(|p| p.as_str() == "map").count(), 2);
    assert_eq!(phases.last().map(String::as_str), Some("reduce"));

    assert_eq!(outcome.propagated_to.len(), 44);
    let result = outcome.result.unwrap();
    assert_eq!(result.analysis_type, AnalysisType::TraceBased);
    for log in &logs {
        let stored = h.stored(&log.id).await.analysis.unwrap();
        assert_eq!(stored.analyzed_at, result.analyzed_at);
    }
}

#[tokio::test]
async fn test_threshold_boundary_stays_direct() {
    let logs = trace_of(30, "trace-edge");
    let llm = Arc::new(ScriptedLlm::passing(&logs[0]));
    let h = Harness::new(AnalyzerSettings::default(), llm.clone());
    h.insert(&logs).await;

    let outcome = h.orchestrator.analyze(PROJECT, "M00").await;

    assert_eq!(outcome.strategy_used, Some(Strategy::Direct));
    assert_eq!(llm.phases(), vec!["direct"]);
}
