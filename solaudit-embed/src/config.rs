//! Configuration for embedding providers

use crate::error::{EmbedError, Result};
use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Base URL of DashScope's OpenAI-compatible API.
pub const DASHSCOPE_BASE_URL: &str = "https://dashscope.aliyuncs.com/compatible-mode/v1";

/// Base URL of the OpenAI API.
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Dimension used by the offline hashing provider when none is configured.
pub const DEFAULT_HASHING_DIMENSION: usize = 256;

/// Which backend produces the embedding vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Deterministic feature hashing, no network or model files
    #[default]
    Hashing,
    /// Any OpenAI-compatible `/embeddings` endpoint
    OpenAi,
    /// DashScope's compatible-mode endpoint
    DashScope,
    /// Local ONNX models through fastembed (requires the `fastembed` feature)
    FastEmbed,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Hashing => "hashing",
            ProviderKind::OpenAi => "openai",
            ProviderKind::DashScope => "dashscope",
            ProviderKind::FastEmbed => "fastembed",
        }
    }

    /// Whether this backend talks to a remote HTTP service.
    pub fn is_remote(&self) -> bool {
        matches!(self, ProviderKind::OpenAi | ProviderKind::DashScope)
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for an embedding provider.
///
/// The API key is carried as an explicit value; nothing in this crate reads
/// the process environment.
#[derive(Clone, Builder, Serialize)]
#[builder(setter(into))]
pub struct EmbedConfig {
    /// Backend to use
    #[builder(default)]
    pub provider: ProviderKind,
    /// Name of the embedding model to use
    #[builder(default = r#""feature-hash".to_string()"#)]
    pub model_name: String,
    /// Base URL of a remote embedding service
    #[builder(setter(into, strip_option), default)]
    pub base_url: Option<String>,
    /// Bearer token for a remote embedding service
    #[serde(skip)]
    #[builder(setter(into, strip_option), default)]
    pub api_key: Option<String>,
    /// Expected vector dimension
    #[builder(setter(strip_option), default)]
    pub dimension: Option<usize>,
    /// Maximum batch size for embedding generation
    #[builder(default = "32")]
    pub batch_size: usize,
    /// Whether to L2-normalize embeddings
    #[builder(default = "true")]
    pub normalize: bool,
    /// HTTP timeout for remote providers
    #[builder(default = "30")]
    pub timeout_secs: u64,
    /// Attempts for retryable HTTP failures (429 and 5xx)
    #[builder(default = "3")]
    pub max_retries: usize,
}

impl std::fmt::Debug for EmbedConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbedConfig")
            .field("provider", &self.provider)
            .field("model_name", &self.model_name)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("dimension", &self.dimension)
            .field("batch_size", &self.batch_size)
            .field("normalize", &self.normalize)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl EmbedConfig {
    /// Create a new embedding configuration using the builder
    pub fn builder() -> EmbedConfigBuilder {
        EmbedConfigBuilder::default()
    }

    /// Offline feature-hashing configuration with the given dimension
    pub fn hashing(dimension: usize) -> Self {
        Self {
            provider: ProviderKind::Hashing,
            model_name: "feature-hash".to_string(),
            base_url: None,
            api_key: None,
            dimension: Some(dimension),
            batch_size: 32,
            normalize: true,
            timeout_secs: 30,
            max_retries: 3,
        }
    }

    /// Configuration for any OpenAI-compatible `/embeddings` endpoint
    pub fn openai_compatible(
        base_url: impl Into<String>,
        model_name: impl Into<String>,
        dimension: usize,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            provider: ProviderKind::OpenAi,
            model_name: model_name.into(),
            base_url: Some(base_url.into()),
            api_key: Some(api_key.into()),
            dimension: Some(dimension),
            ..Self::hashing(dimension)
        }
    }

    /// DashScope `text-embedding-v1` through its compatible-mode endpoint
    pub fn dashscope(api_key: impl Into<String>) -> Self {
        Self {
            provider: ProviderKind::DashScope,
            model_name: "text-embedding-v1".to_string(),
            base_url: Some(DASHSCOPE_BASE_URL.to_string()),
            api_key: Some(api_key.into()),
            dimension: Some(1536),
            batch_size: 25,
            ..Self::hashing(1536)
        }
    }

    /// Local fastembed model; the dimension is discovered when the model loads
    pub fn fastembed(model_name: impl Into<String>) -> Self {
        Self {
            provider: ProviderKind::FastEmbed,
            model_name: model_name.into(),
            dimension: None,
            ..Self::hashing(0)
        }
    }

    /// Set the batch size for embedding generation (builder style)
    pub fn with_batch_size(self, batch_size: usize) -> Self {
        Self { batch_size, ..self }
    }

    /// Set whether to normalize embeddings (builder style)
    pub fn with_normalize(self, normalize: bool) -> Self {
        Self { normalize, ..self }
    }

    /// Get the model name
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Validate the configuration before constructing a provider
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(EmbedError::invalid_config("batch_size must be > 0"));
        }
        if self.model_name.trim().is_empty() {
            return Err(EmbedError::invalid_config("model name must not be empty"));
        }

        match self.provider {
            ProviderKind::Hashing => {
                if self.dimension.unwrap_or(0) == 0 {
                    return Err(EmbedError::invalid_config(
                        "hashing provider requires dimension > 0",
                    ));
                }
            }
            ProviderKind::OpenAi | ProviderKind::DashScope => {
                if self.dimension.unwrap_or(0) == 0 {
                    return Err(EmbedError::invalid_config(format!(
                        "{} provider requires dimension > 0",
                        self.provider
                    )));
                }
                if self.base_url.as_deref().is_none_or(|url| url.trim().is_empty()) {
                    return Err(EmbedError::invalid_config(format!(
                        "{} provider requires base_url",
                        self.provider
                    )));
                }
                if self.api_key.as_deref().is_none_or(|key| key.trim().is_empty()) {
                    return Err(EmbedError::invalid_config(format!(
                        "{} provider requires an API key",
                        self.provider
                    )));
                }
            }
            ProviderKind::FastEmbed => {
                if !cfg!(feature = "fastembed") {
                    return Err(EmbedError::invalid_config(
                        "fastembed provider requires building with the `fastembed` feature",
                    ));
                }
            }
        }

        tracing::debug!("Embedding configuration valid for: {}", self.model_name);
        Ok(())
    }
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self::hashing(DEFAULT_HASHING_DIMENSION)
    }
}
