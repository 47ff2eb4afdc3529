//! Structured Completion
//!
//! Typed boundary between business logic and the language model. A caller
//! names the Rust type it expects; the helper derives a JSON schema for it,
//! asks the provider for schema-constrained output, and deserializes the
//! answer. Anything that does not parse into the requested type is rejected
//! here as `LlmError::ParseError` instead of leaking loosely typed JSON into
//! the orchestrator.

use std::time::Duration;

use schemars::JsonSchema;
use serde::de::DeserializeOwned;

use crate::provider::LlmProvider;
use crate::types::{LlmError, LlmRequestOptions, LlmResult, Message, ResponseFormat};

/// JSON schema for `T` as a plain JSON value.
pub fn schema_value<T: JsonSchema>() -> serde_json::Value {
    schemars::schema_for!(T).as_value().clone()
}

/// Ask `provider` for a response shaped like `T`.
///
/// * `schema_name` - identifier sent with the schema (e.g. `"analysis_draft"`)
/// * `phase` - free-form label recorded in logs and request options
///
/// The call is bounded by the provider's configured `timeout_secs` even when
/// the provider itself does not enforce one.
pub async fn complete_structured<T>(
    provider: &dyn LlmProvider,
    system: &str,
    prompt: &str,
    schema_name: &str,
    phase: &str,
) -> LlmResult<T>
where
    T: DeserializeOwned + JsonSchema,
{
    let schema = schema_value::<T>();
    let timeout_secs = provider.config().timeout_secs;

    let system = if provider.supports_json_schema() {
        system.to_string()
    } else {
        format!(
            "{}\n\nRespond with a single JSON object matching this JSON schema and nothing else:\n{}",
            system, schema
        )
    };

    let options = LlmRequestOptions {
        response_format: ResponseFormat::JsonSchema {
            name: schema_name.to_string(),
            schema,
        },
        analysis_phase: Some(phase.to_string()),
        ..Default::default()
    };

    let call = provider.send_message(vec![Message::user(prompt)], Some(system), options);
    let response = match tokio::time::timeout(Duration::from_secs(timeout_secs), call).await {
        Ok(result) => result?,
        Err(_) => {
            tracing::warn!(phase, timeout_secs, "llm: structured completion timed out");
            return Err(LlmError::Timeout {
                seconds: timeout_secs,
            });
        }
    };

    let text = response.content.ok_or_else(|| LlmError::ParseError {
        message: format!("{} returned an empty response", provider.name()),
    })?;

    tracing::debug!(
        phase,
        model = %response.model,
        tokens = response.usage.total_tokens(),
        "llm: structured completion received"
    );

    parse_structured(&text)
}

/// Deserialize `T` from raw model output.
///
/// Accepts a bare JSON object, a fenced ```json block, or JSON surrounded by
/// prose (first `{` to last `}`).
pub fn parse_structured<T: DeserializeOwned>(response: &str) -> LlmResult<T> {
    let trimmed = response.trim();

    if let Ok(value) = serde_json::from_str::<T>(trimmed) {
        return Ok(value);
    }

    let candidate = match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if end > start => &trimmed[start..=end],
        _ => {
            return Err(LlmError::ParseError {
                message: "response contains no JSON object".to_string(),
            })
        }
    };

    serde_json::from_str::<T>(candidate).map_err(|e| LlmError::ParseError {
        message: format!("response does not match the expected shape: {}", e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LlmResponse, ProviderConfig};
    use async_trait::async_trait;
    use serde::Deserialize;
    use std::sync::Mutex;

    #[derive(Debug, Deserialize, JsonSchema, PartialEq)]
    struct Sample {
        title: String,
        count: u32,
    }

    struct ScriptedProvider {
        config: ProviderConfig,
        reply: Option<String>,
        systems: Mutex<Vec<String>>,
        delay: Option<Duration>,
    }

    impl ScriptedProvider {
        fn new(reply: Option<&str>) -> Self {
            Self {
                config: ProviderConfig::default(),
                reply: reply.map(str::to_string),
                systems: Mutex::new(Vec::new()),
                delay: None,
            }
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        fn name(&self) -> &'static str {
            "scripted"
        }

        fn model(&self) -> &str {
            "scripted-model"
        }

        async fn send_message(
            &self,
            _messages: Vec<Message>,
            system: Option<String>,
            _request_options: LlmRequestOptions,
        ) -> LlmResult<LlmResponse> {
            self.systems.lock().unwrap().push(system.unwrap_or_default());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            Ok(LlmResponse {
                content: self.reply.clone(),
                ..LlmResponse::from_text("scripted-model", "")
            })
        }

        async fn health_check(&self) -> LlmResult<()> {
            Ok(())
        }

        fn config(&self) -> &ProviderConfig {
            &self.config
        }
    }

    #[test]
    fn test_parse_structured_bare_json() {
        let parsed: Sample = parse_structured(r#"{"title": "x", "count": 2}"#).unwrap();
        assert_eq!(parsed, Sample { title: "x".into(), count: 2 });
    }

    #[test]
    fn test_parse_structured_fenced_json() {
        let raw = "Here you go:\n```json\n{\"title\": \"y\", \"count\": 5}\n```\n";
        let parsed: Sample = parse_structured(raw).unwrap();
        assert_eq!(parsed.count, 5);
    }

    #[test]
    fn test_parse_structured_rejects_wrong_shape() {
        let err = parse_structured::<Sample>(r#"{"title": "x"}"#).unwrap_err();
        assert!(err.is_malformed_response());

        let err = parse_structured::<Sample>("no json here").unwrap_err();
        assert!(err.is_malformed_response());
    }

    #[test]
    fn test_schema_value_names_fields() {
        let schema = schema_value::<Sample>();
        let text = schema.to_string();
        assert!(text.contains("title"));
        assert!(text.contains("count"));
    }

    #[tokio::test]
    async fn test_complete_structured_embeds_schema_for_plain_providers() {
        let provider = ScriptedProvider::new(Some(r#"{"title": "t", "count": 1}"#));
        let parsed: Sample = complete_structured(&provider, "You are terse.", "go", "sample", "test")
            .await
            .unwrap();
        assert_eq!(parsed.title, "t");

        let systems = provider.systems.lock().unwrap();
        assert!(systems[0].starts_with("You are terse."));
        assert!(systems[0].contains("JSON schema"));
    }

    #[tokio::test]
    async fn test_complete_structured_empty_response_is_malformed() {
        let provider = ScriptedProvider::new(None);
        let err = complete_structured::<Sample>(&provider, "sys", "go", "sample", "test")
            .await
            .unwrap_err();
        assert!(err.is_malformed_response());
    }

    #[tokio::test]
    async fn test_complete_structured_times_out() {
        let mut provider = ScriptedProvider::new(Some(r#"{"title": "t", "count": 1}"#));
        provider.config.timeout_secs = 1;
        provider.delay = Some(Duration::from_secs(5));

        let err = complete_structured::<Sample>(&provider, "sys", "go", "sample", "test")
            .await
            .unwrap_err();
        assert_eq!(err, LlmError::Timeout { seconds: 1 });
    }
}
