//! Embedding Provider Abstraction Layer
//!
//! Defines the async `EmbeddingProvider` trait and supporting types for
//! pluggable embedding backends. Embedding is kept separate from chat
//! completion (`LlmProvider`): the similarity cache only ever needs vectors.

use async_trait::async_trait;
use log_triage_core::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur during embedding operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EmbeddingError {
    /// Authentication failed (invalid or missing API key).
    AuthenticationFailed { message: String },

    /// The requested model was not found or is not available.
    ModelNotFound { model: String },

    /// The provider is not reachable or not running.
    ProviderUnavailable { message: String },

    /// The input text exceeds the provider's maximum token/character limit.
    InputTooLong { message: String },

    /// A network or connection error occurred.
    NetworkError { message: String },

    /// The provider returned an unexpected or unparseable response.
    ParseError { message: String },

    /// The provider returned an HTTP error.
    ServerError {
        message: String,
        status: Option<u16>,
    },

    /// Rate limit exceeded.
    RateLimited { message: String },

    /// Configuration is invalid or incomplete.
    InvalidConfig { message: String },
}

impl fmt::Display for EmbeddingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AuthenticationFailed { message } => {
                write!(f, "authentication failed: {}", message)
            }
            Self::ModelNotFound { model } => write!(f, "model not found: {}", model),
            Self::ProviderUnavailable { message } => {
                write!(f, "provider unavailable: {}", message)
            }
            Self::InputTooLong { message } => write!(f, "input too long: {}", message),
            Self::NetworkError { message } => write!(f, "network error: {}", message),
            Self::ParseError { message } => write!(f, "parse error: {}", message),
            Self::ServerError { message, status } => {
                if let Some(code) = status {
                    write!(f, "server error (HTTP {}): {}", code, message)
                } else {
                    write!(f, "server error: {}", message)
                }
            }
            Self::RateLimited { message } => write!(f, "rate limited: {}", message),
            Self::InvalidConfig { message } => write!(f, "invalid config: {}", message),
        }
    }
}

impl std::error::Error for EmbeddingError {}

impl EmbeddingError {
    /// Whether this error is transient and the operation could succeed later.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EmbeddingError::NetworkError { .. }
                | EmbeddingError::RateLimited { .. }
                | EmbeddingError::ServerError { .. }
                | EmbeddingError::ProviderUnavailable { .. }
        )
    }
}

/// The similarity tier treats an unreachable embedder like any other
/// unreachable backend.
impl From<EmbeddingError> for CoreError {
    fn from(err: EmbeddingError) -> Self {
        match err {
            EmbeddingError::AuthenticationFailed { .. } | EmbeddingError::InvalidConfig { .. } => {
                CoreError::config(err.to_string())
            }
            _ => CoreError::transient_io(format!("embedding: {}", err)),
        }
    }
}

/// Convenience alias for embedding operation results.
pub type EmbeddingResult<T> = Result<T, EmbeddingError>;

// ---------------------------------------------------------------------------
// Provider type enum
// ---------------------------------------------------------------------------

/// Identifies the embedding backend type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingProviderType {
    /// Local feature-hashing vectors (no network).
    Hashing,
    /// OpenAI embedding models and OpenAI-compatible servers.
    #[serde(rename = "open_ai")]
    OpenAI,
}

impl EmbeddingProviderType {
    /// Default model name for this provider type.
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::Hashing => "hashing-v1",
            Self::OpenAI => "text-embedding-3-small",
        }
    }

    /// Default vector dimension for this provider type.
    pub fn default_dimension(&self) -> usize {
        match self {
            Self::Hashing => 256,
            Self::OpenAI => 1536,
        }
    }

    /// Whether this provider type needs an API key.
    pub fn requires_api_key(&self) -> bool {
        matches!(self, Self::OpenAI)
    }
}

impl fmt::Display for EmbeddingProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hashing => write!(f, "hashing"),
            Self::OpenAI => write!(f, "openai"),
        }
    }
}

// ---------------------------------------------------------------------------
// Provider configuration
// ---------------------------------------------------------------------------

/// Configuration for an embedding provider instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingProviderConfig {
    /// The embedding backend type.
    pub provider: EmbeddingProviderType,

    /// Model identifier (e.g., "text-embedding-3-small").
    pub model: String,

    /// API key for remote providers. Not needed for local providers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL override for the provider API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Desired embedding dimension. If `None`, the provider's default is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension: Option<usize>,

    /// Request timeout for remote providers, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum number of cached vectors.
    #[serde(default = "default_cache_max_entries")]
    pub cache_max_entries: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_cache_max_entries() -> u64 {
    10_000
}

impl EmbeddingProviderConfig {
    /// Create a new configuration with defaults for the given provider type.
    pub fn new(provider: EmbeddingProviderType) -> Self {
        Self {
            provider,
            model: provider.default_model().to_string(),
            api_key: None,
            base_url: None,
            dimension: None,
            timeout_secs: default_timeout_secs(),
            cache_max_entries: default_cache_max_entries(),
        }
    }

    /// Effective vector dimension.
    pub fn effective_dimension(&self) -> usize {
        self.dimension
            .unwrap_or_else(|| self.provider.default_dimension())
    }

    /// Validate the configuration and return the first issue found.
    pub fn validate(&self) -> EmbeddingResult<()> {
        if self.provider.requires_api_key() && self.api_key.is_none() {
            return Err(EmbeddingError::InvalidConfig {
                message: format!(
                    "{} embeddings require an API key but none was provided",
                    self.provider
                ),
            });
        }
        if self.model.trim().is_empty() {
            return Err(EmbeddingError::InvalidConfig {
                message: "model name must not be empty".to_string(),
            });
        }
        if self.effective_dimension() == 0 {
            return Err(EmbeddingError::InvalidConfig {
                message: "dimension must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for EmbeddingProviderConfig {
    fn default() -> Self {
        Self::new(EmbeddingProviderType::Hashing)
    }
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Async embedding backend.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of document texts, one vector per input, same order.
    async fn embed_documents(&self, documents: &[&str]) -> EmbeddingResult<Vec<Vec<f32>>>;

    /// Embed a single text.
    ///
    /// The default implementation delegates to `embed_documents` with a
    /// single-element slice.
    async fn embed_query(&self, query: &str) -> EmbeddingResult<Vec<f32>> {
        let results = self.embed_documents(&[query]).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::ParseError {
                message: "embed_documents returned empty results for single query".to_string(),
            })
    }

    /// Dimensionality of the produced vectors.
    fn dimension(&self) -> usize;

    /// Check if the provider is healthy and reachable.
    async fn health_check(&self) -> EmbeddingResult<()>;

    /// Whether this provider runs locally without network calls.
    fn is_local(&self) -> bool;

    /// Provider type identifier.
    fn provider_type(&self) -> EmbeddingProviderType;

    /// Model name used by this instance.
    fn model(&self) -> &str;
}
