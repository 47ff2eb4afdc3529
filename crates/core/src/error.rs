//! Core Error Types
//!
//! Defines the error taxonomy shared by every crate in the Log Triage
//! workspace. Only `thiserror` + std are required, which keeps the core crate
//! lightweight.
//!
//! The orchestrator distinguishes three session-ending conditions
//! (`NotFound`, `TransientIo`, `AnalysisFailure`) plus the caller's request
//! deadline (`Timeout`). Validation failures are *not* errors; they are
//! resolved by the retry router and never surface as `CoreError`.

use thiserror::Error;

/// Core error type for the Log Triage workspace.
#[derive(Error, Debug)]
pub enum CoreError {
    /// The requested log does not exist in the given project
    #[error("Not found: {0}")]
    NotFound(String),

    /// Storage, cache, or vector backend unreachable
    #[error("Transient I/O error: {0}")]
    TransientIo(String),

    /// The language model failed or produced an unusable response
    #[error("Analysis failure: {0}")]
    AnalysisFailure(String),

    /// The request-scoped deadline elapsed
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Validation errors (invalid input, not draft quality)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for core errors
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a transient I/O error
    pub fn transient_io(msg: impl Into<String>) -> Self {
        Self::TransientIo(msg.into())
    }

    /// Create an analysis failure
    pub fn analysis_failure(msg: impl Into<String>) -> Self {
        Self::AnalysisFailure(msg.into())
    }

    /// Create a timeout error
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether the caller (transport layer) may reasonably retry the request.
    ///
    /// The orchestrator itself never retries these.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::TransientIo(_) | CoreError::Timeout(_))
    }
}

/// Convert CoreError to a string for the outcome `error` field
impl From<CoreError> for String {
    fn from(err: CoreError) -> String {
        err.to_string()
    }
}
