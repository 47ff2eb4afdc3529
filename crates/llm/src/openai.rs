//! OpenAI Provider
//!
//! Implementation of the LlmProvider trait for OpenAI's chat-completions API
//! and OpenAI-compatible servers (Ollama, vLLM, LiteLLM) via `base_url`.
//! Supports JSON-schema constrained output through `response_format`.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::provider::{missing_api_key_error, parse_http_error, LlmProvider};
use super::types::{
    LlmError, LlmRequestOptions, LlmResponse, LlmResult, Message, MessageRole, ProviderConfig,
    ProviderType, ResponseFormat, StopReason, UsageStats,
};
use crate::http_client::build_http_client;

/// Default OpenAI API endpoint
const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Default Ollama OpenAI-compatible endpoint
const OLLAMA_API_URL: &str = "http://localhost:11434/v1/chat/completions";

/// OpenAI provider
pub struct OpenAIProvider {
    config: ProviderConfig,
    client: reqwest::Client,
}

impl OpenAIProvider {
    /// Create a new OpenAI provider with the given configuration
    pub fn new(config: ProviderConfig) -> LlmResult<Self> {
        let client = build_http_client(Duration::from_secs(config.timeout_secs))?;
        Ok(Self { config, client })
    }

    /// Get the API base URL
    fn base_url(&self) -> &str {
        match (&self.config.base_url, self.config.provider) {
            (Some(url), _) => url.as_str(),
            (None, ProviderType::Ollama) => OLLAMA_API_URL,
            (None, ProviderType::OpenAI) => OPENAI_API_URL,
        }
    }

    /// Ollama does not check keys; everything else needs one.
    fn api_key(&self) -> LlmResult<Option<&str>> {
        match (self.config.api_key.as_deref(), self.config.provider) {
            (Some(key), _) => Ok(Some(key)),
            (None, ProviderType::Ollama) => Ok(None),
            (None, ProviderType::OpenAI) => Err(missing_api_key_error("openai")),
        }
    }

    /// Build the request body for the API
    fn build_request_body(
        &self,
        messages: &[Message],
        system: Option<&str>,
        request_options: &LlmRequestOptions,
    ) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": self.config.model,
            "max_tokens": request_options
                .max_tokens_override
                .unwrap_or(self.config.max_tokens),
            "temperature": request_options
                .temperature_override
                .unwrap_or(self.config.temperature),
            "stream": false,
        });

        let mut openai_messages: Vec<serde_json::Value> = Vec::new();

        if let Some(sys) = system {
            openai_messages.push(serde_json::json!({
                "role": "system",
                "content": sys
            }));
        }

        for msg in messages {
            let role = match msg.role {
                MessageRole::User => "user",
                MessageRole::Assistant => "assistant",
                MessageRole::System => "system",
            };
            openai_messages.push(serde_json::json!({
                "role": role,
                "content": msg.content
            }));
        }

        body["messages"] = serde_json::json!(openai_messages);

        if let ResponseFormat::JsonSchema { name, schema } = &request_options.response_format {
            body["response_format"] = serde_json::json!({
                "type": "json_schema",
                "json_schema": {
                    "name": name,
                    "schema": schema,
                    "strict": false
                }
            });
        }

        body
    }

    /// Map a reqwest transport error to `LlmError`.
    fn map_reqwest_error(&self, err: reqwest::Error) -> LlmError {
        if err.is_timeout() {
            LlmError::Timeout {
                seconds: self.config.timeout_secs,
            }
        } else if err.is_connect() {
            LlmError::ProviderUnavailable {
                message: format!("cannot connect to {}: {}", self.base_url(), err),
            }
        } else {
            LlmError::NetworkError {
                message: err.to_string(),
            }
        }
    }

    /// Parse a response from OpenAI API
    fn parse_response(&self, response: &OpenAIResponse) -> LlmResponse {
        let choice = response.choices.first();

        let content = choice
            .and_then(|c| c.message.as_ref())
            .and_then(|m| m.content.clone());

        let stop_reason = choice
            .and_then(|c| c.finish_reason.as_ref())
            .map(|r| StopReason::from(r.as_str()))
            .unwrap_or(StopReason::EndTurn);

        let usage = response
            .usage
            .as_ref()
            .map(|u| UsageStats {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        LlmResponse {
            content,
            stop_reason,
            usage,
            model: response.model.clone(),
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAIProvider {
    fn name(&self) -> &'static str {
        match self.config.provider {
            ProviderType::OpenAI => "openai",
            ProviderType::Ollama => "ollama",
        }
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    fn supports_json_schema(&self) -> bool {
        self.config.provider == ProviderType::OpenAI
    }

    async fn send_message(
        &self,
        messages: Vec<Message>,
        system: Option<String>,
        request_options: LlmRequestOptions,
    ) -> LlmResult<LlmResponse> {
        let api_key = self.api_key()?;
        let body = self.build_request_body(&messages, system.as_deref(), &request_options);

        let mut request = self
            .client
            .post(self.base_url())
            .header("Content-Type", "application/json")
            .json(&body);
        if let Some(key) = api_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.map_reqwest_error(e))?;

        let status = response.status().as_u16();
        let body_text = response
            .text()
            .await
            .map_err(|e| self.map_reqwest_error(e))?;

        if status != 200 {
            return Err(parse_http_error(status, &body_text, self.name()));
        }

        let openai_response: OpenAIResponse =
            serde_json::from_str(&body_text).map_err(|e| LlmError::ParseError {
                message: format!("Failed to parse response: {}", e),
            })?;

        Ok(self.parse_response(&openai_response))
    }

    async fn health_check(&self) -> LlmResult<()> {
        let ping = vec![Message::user("ping")];
        let options = LlmRequestOptions {
            max_tokens_override: Some(1),
            ..Default::default()
        };
        self.send_message(ping, None, options).await.map(|_| ())
    }

    fn config(&self) -> &ProviderConfig {
        &self.config
    }
}

/// OpenAI API response format
#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    model: String,
    choices: Vec<Choice>,
    usage: Option<ResponseUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(provider: ProviderType) -> OpenAIProvider {
        let config = ProviderConfig {
            provider,
            api_key: Some("test-key".to_string()),
            model: "gpt-4o-mini".to_string(),
            ..Default::default()
        };
        OpenAIProvider::new(config).unwrap()
    }

    #[test]
    fn test_build_request_body_with_schema() {
        let p = provider(ProviderType::OpenAI);
        let options = LlmRequestOptions {
            response_format: ResponseFormat::JsonSchema {
                name: "analysis_draft".into(),
                schema: serde_json::json!({"type": "object"}),
            },
            ..Default::default()
        };
        let body = p.build_request_body(&[Message::user("hello")], Some("sys"), &options);

        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "hello");
        assert_eq!(body["response_format"]["type"], "json_schema");
        assert_eq!(
            body["response_format"]["json_schema"]["name"],
            "analysis_draft"
        );
    }

    #[test]
    fn test_build_request_body_text_has_no_response_format() {
        let p = provider(ProviderType::OpenAI);
        let body = p.build_request_body(&[Message::user("hi")], None, &Default::default());
        assert!(body.get("response_format").is_none());
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_parse_response() {
        let p = provider(ProviderType::OpenAI);
        let raw = r#"{
            "model": "gpt-4o-mini",
            "choices": [{"message": {"content": "{\"a\":1}"}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 12, "completion_tokens": 3}
        }"#;
        let parsed: OpenAIResponse = serde_json::from_str(raw).unwrap();
        let response = p.parse_response(&parsed);
        assert_eq!(response.content.as_deref(), Some("{\"a\":1}"));
        assert_eq!(response.stop_reason, StopReason::EndTurn);
        assert_eq!(response.usage.total_tokens(), 15);
    }

    #[test]
    fn test_base_url_defaults() {
        assert_eq!(provider(ProviderType::OpenAI).base_url(), OPENAI_API_URL);
        assert_eq!(provider(ProviderType::Ollama).base_url(), OLLAMA_API_URL);
    }

    #[test]
    fn test_ollama_needs_no_key() {
        let config = ProviderConfig {
            provider: ProviderType::Ollama,
            api_key: None,
            model: "llama3".into(),
            ..Default::default()
        };
        let p = OpenAIProvider::new(config).unwrap();
        assert!(p.api_key().unwrap().is_none());
    }
}
