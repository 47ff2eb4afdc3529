//! Ingestion tests

use std::io::Cursor;
use std::sync::Arc;

use log_triage::services::ingest::{ingest, parse_jsonl};
use log_triage::storage::Database;
use log_triage::{AppConfig, AppState};
use log_triage_core::LogStore;

use crate::support::{error_entry, ScriptedLlm, NPE_MESSAGE, PROJECT};

#[tokio::test]
async fn test_ingested_file_can_be_analyzed() {
    let entries = vec![
        error_entry("I1", NPE_MESSAGE, Some("trace-i"), 0),
        error_entry("I2", "order aborted", Some("trace-i"), 700),
    ];
    let mut jsonl = String::new();
    for entry in &entries {
        jsonl.push_str(&serde_json::to_string(entry).unwrap());
        jsonl.push_str("\n\n");
    }

    let parsed = parse_jsonl(Cursor::new(jsonl)).unwrap();
    assert_eq!(parsed.len(), 2);

    let llm = Arc::new(ScriptedLlm::passing(&entries[1]));
    let database = Arc::new(Database::new_in_memory().unwrap());
    let state = AppState::with_collaborators(AppConfig::default(), database, llm.clone()).unwrap();

    let report = ingest(state.database().as_ref(), Some(state.embeddings().as_ref()), parsed)
        .await
        .unwrap();
    assert_eq!(report.stored, 2);
    assert_eq!(report.embedded, 2);

    let stored = state.database().get(PROJECT, "I1").await.unwrap();
    assert!(stored.embedding_vector.is_some());

    let outcome = state.orchestrator().analyze(PROJECT, "I2").await;
    assert!(outcome.is_success(), "{:?}", outcome.error);
    assert_eq!(outcome.propagated_to, vec!["I1".to_string()]);
    assert_eq!(llm.calls(), 1);
}

#[test]
fn test_bad_line_is_reported_by_number() {
    let input = "{\"id\":\"a\"}\n";
    let err = parse_jsonl(Cursor::new(input)).unwrap_err();
    assert!(err.to_string().contains("line 1"));
}
