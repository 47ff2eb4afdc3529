//! Log Ingestion
//!
//! Loads JSON-lines log files into the store. Each line is one `LogEntry`;
//! entries without an embedding are embedded on the way in so the
//! similarity tier can find them once they are analyzed.

use std::io::BufRead;

use log_triage_core::{CoreError, CoreResult, LogEntry, LogStore};

use crate::services::embedding::EmbeddingService;
use crate::utils::error::{AppError, AppResult};

/// Counts reported after an ingestion run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct IngestReport {
    pub stored: usize,
    pub embedded: usize,
}

/// Parse JSON-lines input, skipping blank lines.
///
/// Errors name the offending 1-based line number.
pub fn parse_jsonl<R: BufRead>(reader: R) -> AppResult<Vec<LogEntry>> {
    let mut entries = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let entry: LogEntry = serde_json::from_str(&line)
            .map_err(|e| AppError::validation(format!("line {}: {}", index + 1, e)))?;
        if entry.id.trim().is_empty() || entry.project_id.trim().is_empty() {
            return Err(AppError::validation(format!(
                "line {}: id and project_id are required",
                index + 1
            )));
        }
        entries.push(entry);
    }
    Ok(entries)
}

/// Store `entries`, embedding those that carry no vector.
pub async fn ingest(
    store: &dyn LogStore,
    embeddings: Option<&EmbeddingService>,
    entries: Vec<LogEntry>,
) -> CoreResult<IngestReport> {
    let mut report = IngestReport::default();

    for mut entry in entries {
        if entry.embedding_vector.is_none() {
            if let Some(service) = embeddings {
                let vector = service
                    .embed(&entry.embedding_text())
                    .await
                    .map_err(CoreError::from)?;
                entry.embedding_vector = Some(vector);
                report.embedded += 1;
            }
        }
        store.upsert(&entry).await?;
        report.stored += 1;
    }

    tracing::info!(
        stored = report.stored,
        embedded = report.embedded,
        "ingest: entries stored"
    );
    Ok(report)
}
