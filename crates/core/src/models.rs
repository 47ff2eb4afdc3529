//! Log Triage Models
//!
//! Data structures shared by the orchestrator and its collaborators: the
//! immutable `LogEntry` owned by the storage backend, the `AnalysisResult`
//! attached to it once analyzed, and the cache-hit record produced by the
//! cache tiers.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity level of a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl LogLevel {
    /// Whether this level denotes a failure (ERROR or FATAL)
    pub fn is_error(&self) -> bool {
        matches!(self, LogLevel::Error | LogLevel::Fatal)
    }

    /// Parse a level name, accepting common aliases
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "TRACE" => Some(LogLevel::Trace),
            "DEBUG" => Some(LogLevel::Debug),
            "INFO" => Some(LogLevel::Info),
            "WARN" | "WARNING" => Some(LogLevel::Warn),
            "ERROR" | "ERR" => Some(LogLevel::Error),
            "FATAL" | "CRITICAL" => Some(LogLevel::Fatal),
            _ => None,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "TRACE"),
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warn => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
            LogLevel::Fatal => write!(f, "FATAL"),
        }
    }
}

/// A single application log entry.
///
/// Owned by the storage backend. The orchestrator only reads it and later
/// patches the `analysis` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Identifier, unique within a project
    pub id: String,
    /// Owning project (tenant)
    pub project_id: String,
    /// Distributed-trace identifier shared by related entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    /// When the entry was emitted
    pub timestamp: DateTime<Utc>,
    /// Log message text
    pub message: String,
    /// Stack trace, if one was captured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<String>,
    /// Emitting service name
    pub service: String,
    /// Severity level
    pub level: LogLevel,
    /// Origin of the entry (e.g. "backend", "frontend", "batch")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_type: Option<String>,
    /// Message embedding, if already vectorized
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding_vector: Option<Vec<f32>>,
    /// Previously attached analysis
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<AnalysisResult>,
}

impl LogEntry {
    /// Create a new entry with required fields only
    pub fn new(
        id: impl Into<String>,
        project_id: impl Into<String>,
        service: impl Into<String>,
        level: LogLevel,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            project_id: project_id.into(),
            trace_id: None,
            timestamp: Utc::now(),
            message: message.into(),
            stack_trace: None,
            service: service.into(),
            level,
            source_type: None,
            embedding_vector: None,
            analysis: None,
        }
    }

    /// Set the trace id
    pub fn with_trace(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    /// Set the timestamp
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Set the stack trace
    pub fn with_stack_trace(mut self, stack_trace: impl Into<String>) -> Self {
        self.stack_trace = Some(stack_trace.into());
        self
    }

    /// Set the source type
    pub fn with_source_type(mut self, source_type: impl Into<String>) -> Self {
        self.source_type = Some(source_type.into());
        self
    }

    /// Set the embedding vector
    pub fn with_embedding(mut self, vector: Vec<f32>) -> Self {
        self.embedding_vector = Some(vector);
        self
    }

    /// Attach an analysis
    pub fn with_analysis(mut self, analysis: AnalysisResult) -> Self {
        self.analysis = Some(analysis);
        self
    }

    /// The trace id, treating an empty or whitespace-only id as absent
    pub fn trace(&self) -> Option<&str> {
        self.trace_id
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    /// Text used for embedding: message plus the first stack-trace line
    pub fn embedding_text(&self) -> String {
        match self
            .stack_trace
            .as_deref()
            .and_then(|st| st.lines().map(str::trim).find(|l| !l.is_empty()))
        {
            Some(first) => format!("{}\n{}", self.message, first),
            None => self.message.clone(),
        }
    }
}

/// How an analysis was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalysisType {
    /// From a single log entry
    Single,
    /// From the entries sharing a trace
    TraceBased,
}

/// What an analysis describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetType {
    Log,
    Trace,
}

/// Structured root-cause report attached to a log entry.
///
/// Immutable once saved. Trace propagation copies the whole value, so every
/// member of a trace carries the same `analyzed_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// One-line summary
    pub summary: String,
    /// Root cause explanation
    pub error_cause: String,
    /// Remediation steps
    pub solution: String,
    /// Classification, severity, and topic tags
    pub tags: BTreeSet<String>,
    /// Single-log or trace-based analysis
    pub analysis_type: AnalysisType,
    /// Log or trace target
    pub target_type: TargetType,
    /// When the analysis was produced
    pub analyzed_at: DateTime<Utc>,
    /// Overall validation score of the accepted draft
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_score: Option<f64>,
    /// Saved after retries were exhausted without a passing verdict
    #[serde(default)]
    pub accepted_with_warnings: bool,
}

impl AnalysisResult {
    /// Whether the tag set contains `tag` (case-insensitive)
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}

/// Which cache tier answered a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheTier {
    Direct,
    Trace,
    Similarity,
}

impl std::fmt::Display for CacheTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheTier::Direct => write!(f, "direct"),
            CacheTier::Trace => write!(f, "trace"),
            CacheTier::Similarity => write!(f, "similarity"),
        }
    }
}

/// A reusable analysis found by one of the cache tiers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheHit {
    /// Tier that produced the hit
    pub tier: CacheTier,
    /// The reusable result
    pub result: AnalysisResult,
    /// Log the result was found on
    pub source_log_id: String,
    /// Confidence: 1.0 for Direct/Trace, cosine similarity for Similarity
    pub score: f32,
}
