//! SQLite Database
//!
//! Embedded log store using rusqlite with r2d2 connection pooling. Implements
//! both `LogStore` and `VectorIndex`: analyses and embeddings live as JSON
//! columns on the `logs` table, and nearest-neighbor search is a brute-force
//! cosine scan over the project's embedded rows.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use log_triage_core::{
    AnalysisResult, CoreError, CoreResult, LogEntry, LogLevel, LogStore, NeighborFilter,
    VectorIndex,
};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;

use crate::services::embedding::cosine_similarity;
use crate::utils::error::{AppError, AppResult};
use crate::utils::paths::ensure_dir;

const LOG_COLUMNS: &str = "id, project_id, trace_id, timestamp, message, stack_trace, \
                           service, level, source_type, embedding, analysis";

/// Raw log row from the database
#[derive(Debug, Clone)]
pub struct LogRow {
    pub id: String,
    pub project_id: String,
    pub trace_id: Option<String>,
    pub timestamp: String,
    pub message: String,
    pub stack_trace: Option<String>,
    pub service: String,
    pub level: String,
    pub source_type: Option<String>,
    pub embedding: Option<String>,
    pub analysis: Option<String>,
}

impl LogRow {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            project_id: row.get(1)?,
            trace_id: row.get(2)?,
            timestamp: row.get(3)?,
            message: row.get(4)?,
            stack_trace: row.get(5)?,
            service: row.get(6)?,
            level: row.get(7)?,
            source_type: row.get(8)?,
            embedding: row.get(9)?,
            analysis: row.get(10)?,
        })
    }

    /// Decode the text columns into a `LogEntry`
    pub fn into_entry(self) -> AppResult<LogEntry> {
        let timestamp = DateTime::parse_from_rfc3339(&self.timestamp)
            .map_err(|e| AppError::database(format!("log {}: bad timestamp: {}", self.id, e)))?
            .with_timezone(&Utc);
        let level = LogLevel::parse(&self.level)
            .ok_or_else(|| AppError::database(format!("log {}: bad level '{}'", self.id, self.level)))?;
        let embedding_vector = match self.embedding {
            Some(json) => Some(serde_json::from_str::<Vec<f32>>(&json)?),
            None => None,
        };
        let analysis = match self.analysis {
            Some(json) => Some(serde_json::from_str::<AnalysisResult>(&json)?),
            None => None,
        };

        Ok(LogEntry {
            id: self.id,
            project_id: self.project_id,
            trace_id: self.trace_id,
            timestamp,
            message: self.message,
            stack_trace: self.stack_trace,
            service: self.service,
            level,
            source_type: self.source_type,
            embedding_vector,
            analysis,
        })
    }
}

/// Fixed-width UTC form so text ordering matches time ordering.
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Type alias for the connection pool
pub type DbPool = Pool<SqliteConnectionManager>;

/// Database service for managing SQLite operations
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
}

impl Database {
    /// Create an in-memory database.
    ///
    /// The pool holds a single connection so every handle sees the same
    /// in-memory database.
    pub fn new_in_memory() -> AppResult<Self> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e| AppError::database(format!("Failed to create connection pool: {}", e)))?;

        let db = Self { pool };
        db.init_schema()?;
        Ok(db)
    }

    /// Open (or create) a database file with connection pooling
    pub fn open(db_path: &Path) -> AppResult<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                ensure_dir(parent)?;
            }
        }

        let manager = SqliteConnectionManager::file(db_path)
            .with_init(|conn| conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA busy_timeout=5000;"));
        let pool = Pool::builder()
            .max_size(10)
            .build(manager)
            .map_err(|e| AppError::database(format!("Failed to create connection pool: {}", e)))?;

        let db = Self { pool };
        db.init_schema()?;

        tracing::info!(path = %db_path.display(), "storage: database opened");
        Ok(db)
    }

    /// Initialize the database schema
    fn init_schema(&self) -> AppResult<()> {
        let conn = self.get_connection()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS logs (
                project_id TEXT NOT NULL,
                id TEXT NOT NULL,
                trace_id TEXT,
                timestamp TEXT NOT NULL,
                message TEXT NOT NULL,
                stack_trace TEXT,
                service TEXT NOT NULL,
                level TEXT NOT NULL,
                source_type TEXT,
                embedding TEXT,
                analysis TEXT,
                updated_at TEXT DEFAULT CURRENT_TIMESTAMP,
                PRIMARY KEY (project_id, id)
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_logs_trace ON logs(project_id, trace_id, timestamp)",
            [],
        )?;

        Ok(())
    }

    /// Get a connection from the pool
    pub fn get_connection(&self) -> AppResult<r2d2::PooledConnection<SqliteConnectionManager>> {
        self.pool
            .get()
            .map_err(|e| AppError::database(format!("Failed to get connection: {}", e)))
    }

    /// Check if the database is healthy
    pub fn is_healthy(&self) -> bool {
        if let Ok(conn) = self.pool.get() {
            conn.query_row("SELECT 1", [], |_| Ok(())).is_ok()
        } else {
            false
        }
    }

    /// Insert or replace a log entry
    pub fn upsert_log(&self, entry: &LogEntry) -> AppResult<()> {
        let embedding = entry
            .embedding_vector
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let analysis = entry.analysis.as_ref().map(serde_json::to_string).transpose()?;

        let conn = self.get_connection()?;
        conn.execute(
            "INSERT INTO logs (project_id, id, trace_id, timestamp, message, stack_trace,
                               service, level, source_type, embedding, analysis, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, CURRENT_TIMESTAMP)
             ON CONFLICT(project_id, id) DO UPDATE SET
                trace_id = ?3, timestamp = ?4, message = ?5, stack_trace = ?6,
                service = ?7, level = ?8, source_type = ?9, embedding = ?10,
                analysis = ?11, updated_at = CURRENT_TIMESTAMP",
            params![
                entry.project_id,
                entry.id,
                entry.trace_id,
                format_timestamp(&entry.timestamp),
                entry.message,
                entry.stack_trace,
                entry.service,
                entry.level.to_string(),
                entry.source_type,
                embedding,
                analysis,
            ],
        )?;
        Ok(())
    }

    /// Get a log entry by project and id
    pub fn get_log(&self, project_id: &str, log_id: &str) -> AppResult<Option<LogEntry>> {
        let conn = self.get_connection()?;
        let result = conn.query_row(
            &format!("SELECT {} FROM logs WHERE project_id = ?1 AND id = ?2", LOG_COLUMNS),
            params![project_id, log_id],
            LogRow::from_row,
        );

        match result {
            Ok(row) => Ok(Some(row.into_entry()?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(AppError::database(e.to_string())),
        }
    }

    /// Entries of one trace within `[from, to]`, oldest first
    pub fn get_trace_logs(
        &self,
        project_id: &str,
        trace_id: &str,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        limit: usize,
    ) -> AppResult<Vec<LogEntry>> {
        let conn = self.get_connection()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM logs
             WHERE project_id = ?1 AND trace_id = ?2
               AND (?3 IS NULL OR timestamp >= ?3) AND (?4 IS NULL OR timestamp <= ?4)
             ORDER BY timestamp ASC, id ASC
             LIMIT ?5",
            LOG_COLUMNS
        ))?;

        let rows = stmt
            .query_map(
                params![
                    project_id,
                    trace_id,
                    from.as_ref().map(format_timestamp),
                    to.as_ref().map(format_timestamp),
                    limit as i64
                ],
                LogRow::from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(LogRow::into_entry).collect()
    }

    /// Entries of one project that carry an embedding
    pub fn get_embedded_logs(&self, project_id: &str) -> AppResult<Vec<LogEntry>> {
        let conn = self.get_connection()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM logs WHERE project_id = ?1 AND embedding IS NOT NULL",
            LOG_COLUMNS
        ))?;

        let rows = stmt
            .query_map(params![project_id], LogRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(LogRow::into_entry).collect()
    }

    /// Set the analysis column of one entry
    pub fn set_analysis(
        &self,
        project_id: &str,
        log_id: &str,
        analysis: &AnalysisResult,
    ) -> AppResult<()> {
        let json = serde_json::to_string(analysis)?;
        let conn = self.get_connection()?;
        let updated = conn.execute(
            "UPDATE logs SET analysis = ?3, updated_at = CURRENT_TIMESTAMP
             WHERE project_id = ?1 AND id = ?2",
            params![project_id, log_id, json],
        )?;
        if updated == 0 {
            return Err(AppError::not_found(format!("log {}/{}", project_id, log_id)));
        }
        Ok(())
    }

    /// Set the embedding column of one entry
    pub fn set_embedding(&self, project_id: &str, log_id: &str, vector: &[f32]) -> AppResult<()> {
        let json = serde_json::to_string(vector)?;
        let conn = self.get_connection()?;
        let updated = conn.execute(
            "UPDATE logs SET embedding = ?3 WHERE project_id = ?1 AND id = ?2",
            params![project_id, log_id, json],
        )?;
        if updated == 0 {
            return Err(AppError::not_found(format!("log {}/{}", project_id, log_id)));
        }
        Ok(())
    }

    /// Number of entries stored for a project
    pub fn count_logs(&self, project_id: &str) -> AppResult<usize> {
        let conn = self.get_connection()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM logs WHERE project_id = ?1",
            params![project_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("pool_size", &self.pool.state().connections)
            .finish()
    }
}

// ============================================================================
// Collaborator implementations
// ============================================================================

#[async_trait]
impl LogStore for Database {
    async fn get(&self, project_id: &str, log_id: &str) -> CoreResult<LogEntry> {
        self.get_log(project_id, log_id)?
            .ok_or_else(|| CoreError::not_found(format!("log {}/{}", project_id, log_id)))
    }

    async fn find_by_trace(
        &self,
        project_id: &str,
        trace_id: &str,
        center: DateTime<Utc>,
        window: Duration,
        max_count: usize,
    ) -> CoreResult<Vec<LogEntry>> {
        // An edge past the representable range leaves that side unbounded.
        Ok(self.get_trace_logs(
            project_id,
            trace_id,
            center.checked_sub_signed(window),
            center.checked_add_signed(window),
            max_count,
        )?)
    }

    async fn patch_analysis(
        &self,
        project_id: &str,
        log_id: &str,
        analysis: &AnalysisResult,
    ) -> CoreResult<()> {
        Ok(self.set_analysis(project_id, log_id, analysis)?)
    }

    async fn store_embedding(
        &self,
        project_id: &str,
        log_id: &str,
        vector: &[f32],
    ) -> CoreResult<()> {
        Ok(self.set_embedding(project_id, log_id, vector)?)
    }

    async fn upsert(&self, entry: &LogEntry) -> CoreResult<()> {
        Ok(self.upsert_log(entry)?)
    }
}

#[async_trait]
impl VectorIndex for Database {
    async fn nearest(
        &self,
        vector: &[f32],
        k: usize,
        filter: &NeighborFilter,
    ) -> CoreResult<Vec<(LogEntry, f32)>> {
        let mut scored: Vec<(LogEntry, f32)> = self
            .get_embedded_logs(&filter.project_id)?
            .into_iter()
            .filter(|entry| filter.matches(entry))
            .filter_map(|entry| {
                let score = entry
                    .embedding_vector
                    .as_deref()
                    .map(|candidate| cosine_similarity(vector, candidate))?;
                Some((entry, score))
            })
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.id.cmp(&b.0.id)));
        scored.truncate(k);
        Ok(scored)
    }
}
