//! Embedding provider trait and the built-in offline provider

use crate::config::{EmbedConfig, ProviderKind};
use crate::error::{EmbedError, Result};
use fnv::FnvHasher;
use half::f16;
use std::hash::Hasher;
use std::sync::Arc;

/// Result of embedding generation
#[derive(Debug, Clone)]
pub struct EmbeddingResult {
    /// The generated embeddings, one per input text
    pub embeddings: Vec<Vec<f16>>,
    /// The dimension of each embedding vector
    pub dimension: usize,
}

impl EmbeddingResult {
    /// Create a new embedding result from a vector of f16 embeddings.
    ///
    /// The dimension is inferred from the first embedding vector and defaults
    /// to 0 when there are none.
    pub fn new(embeddings: Vec<Vec<f16>>) -> Self {
        let dimension = embeddings.first().map(|e| e.len()).unwrap_or(0);
        Self {
            embeddings,
            dimension,
        }
    }

    /// Returns the number of embedding vectors in this result.
    pub fn len(&self) -> usize {
        self.embeddings.len()
    }

    /// Returns `true` if this result contains no embedding vectors.
    pub fn is_empty(&self) -> bool {
        self.embeddings.is_empty()
    }
}

/// Trait for embedding providers that can generate embeddings from text.
///
/// Calls block until the provider answers. The same provider (or one with an
/// equivalent distance) must be used to build an index and to query it.
pub trait EmbeddingProvider: Send + Sync {
    /// Generate embeddings for a single text
    fn embed_text(&self, text: &str) -> Result<Vec<f16>>;

    /// Generate embeddings for multiple texts, preserving input order
    fn embed_texts(&self, texts: &[String]) -> Result<EmbeddingResult> {
        let embeddings = texts
            .iter()
            .map(|text| self.embed_text(text))
            .collect::<Result<Vec<_>>>()?;
        Ok(EmbeddingResult::new(embeddings))
    }

    /// Get the dimension of embeddings produced by this provider
    fn embedding_dimension(&self) -> usize;

    /// Get the name/identifier of this provider
    fn provider_name(&self) -> &str;

    /// Get the model identity recorded alongside a built index
    fn model_name(&self) -> &str;
}

impl<T: EmbeddingProvider + ?Sized> EmbeddingProvider for Box<T> {
    fn embed_text(&self, text: &str) -> Result<Vec<f16>> {
        (**self).embed_text(text)
    }

    fn embed_texts(&self, texts: &[String]) -> Result<EmbeddingResult> {
        (**self).embed_texts(texts)
    }

    fn embedding_dimension(&self) -> usize {
        (**self).embedding_dimension()
    }

    fn provider_name(&self) -> &str {
        (**self).provider_name()
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}

impl<T: EmbeddingProvider + ?Sized> EmbeddingProvider for Arc<T> {
    fn embed_text(&self, text: &str) -> Result<Vec<f16>> {
        (**self).embed_text(text)
    }

    fn embed_texts(&self, texts: &[String]) -> Result<EmbeddingResult> {
        (**self).embed_texts(texts)
    }

    fn embedding_dimension(&self) -> usize {
        (**self).embedding_dimension()
    }

    fn provider_name(&self) -> &str {
        (**self).provider_name()
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}

/// Scale `vector` to unit length in place. Zero vectors are left untouched.
pub fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        vector.iter_mut().for_each(|x| *x /= norm);
    }
}

/// Fail with [`EmbedError::NonFinite`] when any component is NaN or infinite.
///
/// Such a vector has no meaningful cosine similarity to anything.
pub fn ensure_finite(vector: &[f16]) -> Result<()> {
    match vector.iter().position(|x| !x.is_finite()) {
        Some(position) => Err(EmbedError::NonFinite { position }),
        None => Ok(()),
    }
}

/// Convert an f32 vector to the f16 storage representation.
pub fn to_f16(vector: &[f32]) -> Vec<f16> {
    vector.iter().map(|&x| f16::from_f32(x)).collect()
}

/// Deterministic feature-hashing embedder.
///
/// Every word token (maximal run of alphanumerics and `_`) is hashed with FNV
/// into one of `dimension` signed buckets. Identical texts always map to
/// identical vectors and texts sharing identifiers land close together,
/// which is enough for offline use and for tests. No model files or network
/// access are involved.
#[derive(Debug, Clone)]
pub struct HashingProvider {
    dimension: usize,
    normalize: bool,
    model_name: String,
}

impl HashingProvider {
    pub fn new(dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(EmbedError::invalid_config(
                "hashing provider requires dimension > 0",
            ));
        }
        Ok(Self {
            dimension,
            normalize: true,
            model_name: format!("feature-hash-{dimension}"),
        })
    }

    /// Set whether to normalize embeddings (builder style)
    pub fn with_normalize(self, normalize: bool) -> Self {
        Self { normalize, ..self }
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        let tokens = text
            .split(|c: char| !(c.is_alphanumeric() || c == '_'))
            .filter(|token| !token.is_empty());

        for token in tokens {
            let mut hasher = FnvHasher::default();
            hasher.write(token.as_bytes());
            let hash = hasher.finish();
            let bucket = (hash % self.dimension as u64) as usize;
            let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        if self.normalize {
            l2_normalize(&mut vector);
        }
        vector
    }
}

impl EmbeddingProvider for HashingProvider {
    fn embed_text(&self, text: &str) -> Result<Vec<f16>> {
        Ok(to_f16(&self.vectorize(text)))
    }

    fn embedding_dimension(&self) -> usize {
        self.dimension
    }

    fn provider_name(&self) -> &str {
        "hashing"
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

/// Construct the provider described by `config`.
///
/// Remote providers are created without contacting the service; the first
/// embedding call performs the first request.
pub fn provider_from_config(config: &EmbedConfig) -> Result<Box<dyn EmbeddingProvider>> {
    config.validate()?;

    let provider: Box<dyn EmbeddingProvider> = match config.provider {
        ProviderKind::Hashing => {
            let dimension = config.dimension.unwrap_or(0);
            Box::new(HashingProvider::new(dimension)?.with_normalize(config.normalize))
        }
        ProviderKind::OpenAi | ProviderKind::DashScope => {
            Box::new(crate::remote::OpenAiCompatibleProvider::new(config)?)
        }
        #[cfg(feature = "fastembed")]
        ProviderKind::FastEmbed => Box::new(crate::local::FastEmbedProvider::try_new(config)?),
        #[cfg(not(feature = "fastembed"))]
        ProviderKind::FastEmbed => {
            return Err(EmbedError::invalid_config(
                "fastembed provider requires building with the `fastembed` feature",
            ));
        }
    };

    tracing::info!(
        "Created {} embedding provider (model: {}, dimension: {})",
        provider.provider_name(),
        provider.model_name(),
        provider.embedding_dimension()
    );
    Ok(provider)
}
