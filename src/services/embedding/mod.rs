//! Embedding
//!
//! Vector embeddings for the similarity cache tier: the provider trait, an
//! OpenAI-compatible HTTP provider, a local hashing provider, and the cached
//! `EmbeddingService` front-end.

pub mod provider;
pub mod provider_hashing;
pub mod provider_openai;
pub mod service;

pub use provider::{
    EmbeddingError, EmbeddingProvider, EmbeddingProviderConfig, EmbeddingProviderType,
    EmbeddingResult,
};
pub use provider_hashing::HashingEmbeddingProvider;
pub use provider_openai::OpenAIEmbeddingProvider;
pub use service::{build_provider, cosine_similarity, EmbeddingService};
