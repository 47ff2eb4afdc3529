//! Embedding Service
//!
//! Single dispatch point for embedding log text. Wraps one provider with a
//! content-level cache keyed by provider/model/dimension/sha256(text), so
//! re-analyzing the same message never re-embeds it.
//!
//! The cache is a `mini_moka::sync::Cache`, which is thread-safe with no
//! external locking.

use std::sync::Arc;
use std::time::Duration;

use mini_moka::sync::Cache;
use sha2::{Digest, Sha256};

use super::provider::{
    EmbeddingProvider, EmbeddingProviderConfig, EmbeddingProviderType, EmbeddingResult,
};
use super::provider_hashing::HashingEmbeddingProvider;
use super::provider_openai::OpenAIEmbeddingProvider;

/// Time-to-live of cached vectors.
const CACHE_TTL: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    provider: EmbeddingProviderType,
    model: String,
    dimension: usize,
    text_hash: [u8; 32],
}

impl CacheKey {
    fn new(provider: &dyn EmbeddingProvider, text: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        Self {
            provider: provider.provider_type(),
            model: provider.model().to_string(),
            dimension: provider.dimension(),
            text_hash: hasher.finalize().into(),
        }
    }
}

/// Build a provider instance from configuration.
pub fn build_provider(config: &EmbeddingProviderConfig) -> EmbeddingResult<Arc<dyn EmbeddingProvider>> {
    config.validate()?;
    match config.provider {
        EmbeddingProviderType::Hashing => Ok(Arc::new(HashingEmbeddingProvider::new(config)?)),
        EmbeddingProviderType::OpenAI => Ok(Arc::new(OpenAIEmbeddingProvider::new(config)?)),
    }
}

/// Cached embedding front-end shared via `Arc<EmbeddingService>`.
pub struct EmbeddingService {
    provider: Arc<dyn EmbeddingProvider>,
    cache: Cache<CacheKey, Vec<f32>>,
}

impl EmbeddingService {
    /// Wrap `provider` with a cache of at most `max_entries` vectors.
    pub fn new(provider: Arc<dyn EmbeddingProvider>, max_entries: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(CACHE_TTL)
            .build();
        Self { provider, cache }
    }

    /// Build the provider named by `config` and wrap it.
    pub fn from_config(config: &EmbeddingProviderConfig) -> EmbeddingResult<Self> {
        let provider = build_provider(config)?;
        Ok(Self::new(provider, config.cache_max_entries))
    }

    /// Embed `text`, serving repeated texts from the cache.
    pub async fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        let key = CacheKey::new(self.provider.as_ref(), text);
        if let Some(vector) = self.cache.get(&key) {
            tracing::debug!("embedding: cache hit");
            return Ok(vector);
        }

        let vector = self.provider.embed_query(text).await?;
        self.cache.insert(key, vector.clone());
        Ok(vector)
    }

    /// Underlying provider
    pub fn provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.provider
    }
}

/// Cosine similarity of two vectors.
///
/// Returns 0.0 for vectors of different length, empty vectors, or a zero
/// vector on either side.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut mag_a = 0.0f32;
    let mut mag_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        mag_a += x * x;
        mag_b += y * y;
    }

    let denom = mag_a.sqrt() * mag_b.sqrt();
    if denom == 0.0 {
        0.0
    } else {
        dot / denom
    }
}
