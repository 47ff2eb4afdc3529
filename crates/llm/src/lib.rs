//! Log Triage LLM
//!
//! Provides a unified interface for interacting with chat-completion LLM
//! providers:
//! - OpenAI (and OpenAI-compatible servers via `base_url`)
//! - Ollama (through its OpenAI-compatible endpoint)
//!
//! Also includes the typed structured-completion helper used by the analysis
//! executor and the HTTP client factory.

pub mod http_client;
pub mod openai;
pub mod provider;
pub mod structured;
pub mod types;

// Re-export main types
pub use http_client::build_http_client;
pub use openai::OpenAIProvider;
pub use provider::LlmProvider;
pub use structured::{complete_structured, parse_structured, schema_value};
pub use types::*;
