//! OpenAI Embedding Provider
//!
//! Implements `EmbeddingProvider` for OpenAI's embedding endpoint and
//! OpenAI-compatible servers (vLLM, LiteLLM, Ollama's `/v1/embeddings`).
//!
//! - Endpoint: `POST https://api.openai.com/v1/embeddings`
//! - Auth: `Authorization: Bearer {api_key}`
//! - Body: `{ model, input: ["text1", ...], dimensions? }`
//! - Response: `{ data: [{ embedding, index }], model, usage }`

use std::time::Duration;

use async_trait::async_trait;
use log_triage_llm::build_http_client;
use serde::Deserialize;

use super::provider::{
    EmbeddingError, EmbeddingProvider, EmbeddingProviderConfig, EmbeddingProviderType,
    EmbeddingResult,
};

/// Default OpenAI embedding API endpoint.
const OPENAI_EMBEDDING_API_URL: &str = "https://api.openai.com/v1/embeddings";

/// Maximum batch size supported by OpenAI embedding API.
const MAX_BATCH_SIZE: usize = 2048;

// ---------------------------------------------------------------------------
// API response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct OpenAIEmbeddingResponse {
    data: Vec<OpenAIEmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct OpenAIEmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

#[derive(Debug, Deserialize)]
struct OpenAIErrorResponse {
    error: Option<OpenAIErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct OpenAIErrorDetail {
    message: Option<String>,
}

// ---------------------------------------------------------------------------
// Provider implementation
// ---------------------------------------------------------------------------

/// OpenAI embedding provider.
pub struct OpenAIEmbeddingProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    dimension: usize,
}

impl OpenAIEmbeddingProvider {
    /// Create a provider from an `EmbeddingProviderConfig`.
    pub fn new(config: &EmbeddingProviderConfig) -> EmbeddingResult<Self> {
        let client = build_http_client(Duration::from_secs(config.timeout_secs)).map_err(|e| {
            EmbeddingError::InvalidConfig {
                message: e.to_string(),
            }
        })?;

        let model = if config.model.trim().is_empty() {
            EmbeddingProviderType::OpenAI.default_model().to_string()
        } else {
            config.model.clone()
        };

        Ok(Self {
            client,
            api_key: config.api_key.clone().unwrap_or_default(),
            model,
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| OPENAI_EMBEDDING_API_URL.to_string()),
            dimension: config.effective_dimension(),
        })
    }

    /// Build the JSON request body for the embedding API.
    fn build_request_body(&self, input: &[&str]) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": self.model,
            "input": input,
        });

        // Only text-embedding-3-* accepts Matryoshka dimension reduction
        if self.model.contains("text-embedding-3") {
            body["dimensions"] = serde_json::json!(self.dimension);
        }

        body
    }

    async fn post_embeddings(
        &self,
        body: &serde_json::Value,
    ) -> EmbeddingResult<OpenAIEmbeddingResponse> {
        if self.api_key.is_empty() {
            return Err(EmbeddingError::AuthenticationFailed {
                message: "OpenAI embedding API key is not configured \
                          (set LOG_TRIAGE_EMBEDDING_API_KEY)"
                    .to_string(),
            });
        }

        let response = self
            .client
            .post(&self.base_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| self.map_reqwest_error(e))?;

        let status = response.status().as_u16();
        let body_text = response
            .text()
            .await
            .map_err(|e| EmbeddingError::NetworkError {
                message: format!("failed to read response body: {}", e),
            })?;

        if status != 200 {
            return Err(self.map_http_error(status, &body_text));
        }

        serde_json::from_str::<OpenAIEmbeddingResponse>(&body_text).map_err(|e| {
            EmbeddingError::ParseError {
                message: format!("failed to parse embedding response: {}", e),
            }
        })
    }

    /// Map a reqwest transport error to `EmbeddingError`.
    fn map_reqwest_error(&self, err: reqwest::Error) -> EmbeddingError {
        if err.is_connect() {
            EmbeddingError::ProviderUnavailable {
                message: format!("cannot connect to {}: {}", self.base_url, err),
            }
        } else if err.is_timeout() {
            EmbeddingError::NetworkError {
                message: format!("request to {} timed out: {}", self.base_url, err),
            }
        } else {
            EmbeddingError::NetworkError {
                message: err.to_string(),
            }
        }
    }

    /// Map an HTTP error response to `EmbeddingError`.
    fn map_http_error(&self, status: u16, body_text: &str) -> EmbeddingError {
        let detail = serde_json::from_str::<OpenAIErrorResponse>(body_text)
            .ok()
            .and_then(|r| r.error)
            .and_then(|d| d.message);
        let message = detail.as_deref().unwrap_or(body_text).to_string();

        match status {
            401 | 403 => EmbeddingError::AuthenticationFailed { message },
            429 => EmbeddingError::RateLimited { message },
            400 if message.contains("token") || message.contains("length") => {
                EmbeddingError::InputTooLong { message }
            }
            400 => EmbeddingError::InvalidConfig { message },
            404 => EmbeddingError::ModelNotFound {
                model: format!("'{}' at {}: {}", self.model, self.base_url, message),
            },
            _ => EmbeddingError::ServerError {
                message,
                status: Some(status),
            },
        }
    }

    /// Sort by `index` and check the count.
    fn extract_embeddings(
        mut response: OpenAIEmbeddingResponse,
        expected_count: usize,
    ) -> EmbeddingResult<Vec<Vec<f32>>> {
        if response.data.len() != expected_count {
            return Err(EmbeddingError::ParseError {
                message: format!(
                    "expected {} embeddings but the API returned {}",
                    expected_count,
                    response.data.len()
                ),
            });
        }
        response.data.sort_by_key(|d| d.index);
        Ok(response.data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIEmbeddingProvider {
    async fn embed_documents(&self, documents: &[&str]) -> EmbeddingResult<Vec<Vec<f32>>> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        let mut vectors = Vec::with_capacity(documents.len());
        for batch in documents.chunks(MAX_BATCH_SIZE) {
            let body = self.build_request_body(batch);
            let response = self.post_embeddings(&body).await?;
            vectors.extend(Self::extract_embeddings(response, batch.len())?);
        }
        Ok(vectors)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn health_check(&self) -> EmbeddingResult<()> {
        self.embed_query("health check").await.map(|_| ())
    }

    fn is_local(&self) -> bool {
        false
    }

    fn provider_type(&self) -> EmbeddingProviderType {
        EmbeddingProviderType::OpenAI
    }

    fn model(&self) -> &str {
        &self.model
    }
}
