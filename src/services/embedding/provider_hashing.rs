//! Hashing Embedding Provider
//!
//! Local, deterministic embeddings built with the hashing trick: every token
//! and adjacent-token bigram is hashed into a fixed number of signed buckets,
//! then the vector is L2-normalized. No vocabulary, no network.
//!
//! Digit runs are folded to a single placeholder so that two occurrences of
//! the same error with different ids, ports, or durations land close together.

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use super::provider::{
    EmbeddingError, EmbeddingProvider, EmbeddingProviderConfig, EmbeddingProviderType,
    EmbeddingResult,
};

/// Weight of a bigram relative to a unigram.
const BIGRAM_WEIGHT: f32 = 0.5;

/// Feature-hashing embedding provider.
#[derive(Debug, Clone)]
pub struct HashingEmbeddingProvider {
    dimension: usize,
    model: String,
}

impl HashingEmbeddingProvider {
    pub fn new(config: &EmbeddingProviderConfig) -> EmbeddingResult<Self> {
        let dimension = config.effective_dimension();
        if dimension == 0 {
            return Err(EmbeddingError::InvalidConfig {
                message: "hashing dimension must be at least 1".to_string(),
            });
        }
        Ok(Self {
            dimension,
            model: config.model.clone(),
        })
    }

    /// Provider with the given dimension and the default model name.
    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
            model: EmbeddingProviderType::Hashing.default_model().to_string(),
        }
    }

    /// Embed one text synchronously.
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let tokens = tokenize(text);
        let mut vector = vec![0.0f32; self.dimension];

        for token in &tokens {
            self.add_feature(&mut vector, token, 1.0);
        }
        for pair in tokens.windows(2) {
            let bigram = format!("{} {}", pair[0], pair[1]);
            self.add_feature(&mut vector, &bigram, BIGRAM_WEIGHT);
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in vector.iter_mut() {
                *x /= norm;
            }
        }
        vector
    }

    fn add_feature(&self, vector: &mut [f32], feature: &str, weight: f32) {
        let digest = Sha256::digest(feature.as_bytes());
        let mut bucket_bytes = [0u8; 8];
        bucket_bytes.copy_from_slice(&digest[..8]);
        let bucket = (u64::from_le_bytes(bucket_bytes) % self.dimension as u64) as usize;
        let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
        vector[bucket] += sign * weight;
    }
}

/// Lowercased alphanumeric tokens with digit runs folded to `#`.
fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|t| !t.is_empty())
        .map(|t| {
            let mut out = String::with_capacity(t.len());
            let mut in_digits = false;
            for c in t.chars() {
                if c.is_ascii_digit() {
                    if !in_digits {
                        out.push('#');
                    }
                    in_digits = true;
                } else {
                    out.extend(c.to_lowercase());
                    in_digits = false;
                }
            }
            out
        })
        .collect()
}

#[async_trait]
impl EmbeddingProvider for HashingEmbeddingProvider {
    async fn embed_documents(&self, documents: &[&str]) -> EmbeddingResult<Vec<Vec<f32>>> {
        Ok(documents.iter().map(|d| self.embed_text(d)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn health_check(&self) -> EmbeddingResult<()> {
        Ok(())
    }

    fn is_local(&self) -> bool {
        true
    }

    fn provider_type(&self) -> EmbeddingProviderType {
        EmbeddingProviderType::Hashing
    }

    fn model(&self) -> &str {
        &self.model
    }
}
