//! Settings Models
//!
//! Application configuration stored in config.json: the orchestrator's
//! analyzer tuning, the chat LLM provider, the embedding provider, and the
//! database location.

use std::path::PathBuf;

use log_triage_llm::ProviderConfig;
use log_triage_validation::ValidationSettings;
use serde::{Deserialize, Serialize};

use crate::services::embedding::EmbeddingProviderConfig;

/// Environment variable overriding `llm.api_key`
pub const LLM_API_KEY_ENV: &str = "LOG_TRIAGE_LLM_API_KEY";
/// Environment variable overriding `embedding.api_key`
pub const EMBEDDING_API_KEY_ENV: &str = "LOG_TRIAGE_EMBEDDING_API_KEY";

/// Upper bound for `similarity_ttl_secs` (100 years)
pub const MAX_SIMILARITY_TTL_SECS: u64 = 100 * 365 * 24 * 60 * 60;
/// Upper bound for the trace-cache and related-log windows (30 days)
pub const MAX_WINDOW_SECS: u64 = 30 * 24 * 60 * 60;

/// Application configuration stored in config.json
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Orchestrator tuning
    #[serde(default)]
    pub analyzer: AnalyzerSettings,
    /// Chat-completion provider used for analysis
    #[serde(default)]
    pub llm: ProviderConfig,
    /// Embedding provider used by the similarity tier
    #[serde(default)]
    pub embedding: EmbeddingProviderConfig,
    /// SQLite file; `None` uses ~/.log-triage/logs.db
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            analyzer: AnalyzerSettings::default(),
            llm: ProviderConfig::default(),
            embedding: EmbeddingProviderConfig::default(),
            database_path: None,
        }
    }
}

impl AppConfig {
    /// Fill API keys from the environment when the file leaves them unset.
    pub fn apply_env_overrides(&mut self) {
        if self.llm.api_key.is_none() {
            if let Ok(key) = std::env::var(LLM_API_KEY_ENV) {
                if !key.trim().is_empty() {
                    self.llm.api_key = Some(key);
                }
            }
        }
        if self.embedding.api_key.is_none() {
            if let Ok(key) = std::env::var(EMBEDDING_API_KEY_ENV) {
                if !key.trim().is_empty() {
                    self.embedding.api_key = Some(key);
                }
            }
        }
    }

    /// Copy with API keys blanked, for display.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.llm.api_key.is_some() {
            copy.llm.api_key = Some("***".to_string());
        }
        if copy.embedding.api_key.is_some() {
            copy.embedding.api_key = Some("***".to_string());
        }
        copy
    }

    /// Validate the configuration.
    ///
    /// API key presence is not checked here; keys may arrive from the
    /// environment after the file is loaded.
    pub fn validate(&self) -> Result<(), String> {
        self.analyzer.validate()?;
        self.llm.validate()?;
        if self.embedding.model.trim().is_empty() {
            return Err("embedding.model must not be empty".to_string());
        }
        Ok(())
    }
}

/// Orchestrator tuning knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerSettings {
    /// Related-log count above which Map-Reduce is used
    #[serde(default = "default_map_reduce_threshold")]
    pub map_reduce_threshold: usize,
    /// Logs per Map chunk
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Upper bound on Map chunks; `chunk_size` grows to respect it
    #[serde(default = "default_max_map_chunks")]
    pub max_map_chunks: usize,
    /// Concurrent Map calls
    #[serde(default = "default_map_concurrency")]
    pub map_concurrency: usize,
    /// Re-analyses allowed for target-language failures
    #[serde(default = "default_max_retries")]
    pub max_language_retries: u32,
    /// Re-analyses allowed for all other validation failures
    #[serde(default = "default_max_retries")]
    pub max_validation_retries: u32,
    /// Whether the similarity tier runs at all
    #[serde(default = "default_true")]
    pub similarity_enabled: bool,
    /// Minimum cosine score for a similarity hit
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,
    /// Candidates requested from the vector index
    #[serde(default = "default_similarity_top_k")]
    pub similarity_top_k: usize,
    /// Age after which another log's analysis is no longer reused
    #[serde(default = "default_similarity_ttl_secs")]
    pub similarity_ttl_secs: u64,
    /// Half-width of the trace-cache sibling window
    #[serde(default = "default_trace_cache_window_secs")]
    pub trace_cache_window_secs: u64,
    /// Half-width of the related-log collection window
    #[serde(default = "default_related_window_secs")]
    pub related_window_secs: u64,
    /// Maximum related logs gathered for one analysis
    #[serde(default = "default_max_related_logs")]
    pub max_related_logs: usize,
    /// Default overall deadline of one `analyze` request
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Serialize concurrent requests for the same log or trace
    #[serde(default = "default_true")]
    pub dedupe_in_flight: bool,
    /// Validator thresholds, weights, and target language
    #[serde(default)]
    pub validation: ValidationSettings,
}

fn default_map_reduce_threshold() -> usize {
    30
}

fn default_chunk_size() -> usize {
    25
}

fn default_max_map_chunks() -> usize {
    8
}

fn default_map_concurrency() -> usize {
    4
}

fn default_max_retries() -> u32 {
    2
}

fn default_true() -> bool {
    true
}

fn default_similarity_threshold() -> f32 {
    0.92
}

fn default_similarity_top_k() -> usize {
    5
}

fn default_similarity_ttl_secs() -> u64 {
    7 * 24 * 60 * 60
}

fn default_trace_cache_window_secs() -> u64 {
    60
}

fn default_related_window_secs() -> u64 {
    5
}

fn default_max_related_logs() -> usize {
    200
}

fn default_request_timeout_secs() -> u64 {
    300
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self {
            map_reduce_threshold: default_map_reduce_threshold(),
            chunk_size: default_chunk_size(),
            max_map_chunks: default_max_map_chunks(),
            map_concurrency: default_map_concurrency(),
            max_language_retries: default_max_retries(),
            max_validation_retries: default_max_retries(),
            similarity_enabled: true,
            similarity_threshold: default_similarity_threshold(),
            similarity_top_k: default_similarity_top_k(),
            similarity_ttl_secs: default_similarity_ttl_secs(),
            trace_cache_window_secs: default_trace_cache_window_secs(),
            related_window_secs: default_related_window_secs(),
            max_related_logs: default_max_related_logs(),
            request_timeout_secs: default_request_timeout_secs(),
            dedupe_in_flight: true,
            validation: ValidationSettings::default(),
        }
    }
}

/// Seconds as a `chrono::Duration`, saturating instead of panicking.
fn saturating_seconds(secs: u64) -> chrono::Duration {
    i64::try_from(secs)
        .ok()
        .and_then(chrono::Duration::try_seconds)
        .unwrap_or(chrono::Duration::MAX)
}

impl AnalyzerSettings {
    /// Half-width of the trace-cache sibling window
    pub fn trace_cache_window(&self) -> chrono::Duration {
        saturating_seconds(self.trace_cache_window_secs)
    }

    /// Half-width of the related-log collection window
    pub fn related_window(&self) -> chrono::Duration {
        saturating_seconds(self.related_window_secs)
    }

    /// Maximum age of a reusable analysis in the similarity tier
    pub fn similarity_ttl(&self) -> chrono::Duration {
        saturating_seconds(self.similarity_ttl_secs)
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<(), String> {
        if self.map_reduce_threshold < 1 {
            return Err("map_reduce_threshold must be at least 1".to_string());
        }
        if self.chunk_size < 1 {
            return Err("chunk_size must be at least 1".to_string());
        }
        if self.max_map_chunks < 1 {
            return Err("max_map_chunks must be at least 1".to_string());
        }
        if self.map_concurrency < 1 {
            return Err("map_concurrency must be at least 1".to_string());
        }
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(format!(
                "similarity_threshold must be within 0.0..=1.0, got {}",
                self.similarity_threshold
            ));
        }
        if self.similarity_top_k < 1 {
            return Err("similarity_top_k must be at least 1".to_string());
        }
        if self.max_related_logs < 1 {
            return Err("max_related_logs must be at least 1".to_string());
        }
        if self.similarity_ttl_secs > MAX_SIMILARITY_TTL_SECS {
            return Err(format!(
                "similarity_ttl_secs must be at most {}, got {}",
                MAX_SIMILARITY_TTL_SECS, self.similarity_ttl_secs
            ));
        }
        for (name, secs) in [
            ("trace_cache_window_secs", self.trace_cache_window_secs),
            ("related_window_secs", self.related_window_secs),
        ] {
            if secs > MAX_WINDOW_SECS {
                return Err(format!(
                    "{} must be at most {}, got {}",
                    name, MAX_WINDOW_SECS, secs
                ));
            }
        }
        if self.request_timeout_secs == 0 {
            return Err("request_timeout_secs must be at least 1".to_string());
        }
        self.validation
            .validate()
            .map_err(|e| format!("validation: {}", e))
    }
}
