//! `solaudit.toml` configuration for the retriever
//!
//! Every section is optional; a missing file or a missing key falls back to
//! the defaults below. Secrets never appear in the file: `api_key_env` names
//! the environment variable that holds the key, and only the binaries look
//! that variable up.

use crate::error::{Result, RetrieverError, Stage};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use solaudit_context::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE, TextSegmenter, WindowConfig};
use solaudit_embed::{
    DASHSCOPE_BASE_URL, DEFAULT_HASHING_DIMENSION, EmbedConfig, EmbedError, OPENAI_BASE_URL,
    ProviderKind,
};
use std::path::{Path, PathBuf};

/// Default file name looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "solaudit.toml";

/// Default index directory.
pub const DEFAULT_INDEX_LOCATION: &str = "solaudit_index";

/// Default number of chunks retrieved per query.
pub const DEFAULT_TOP_K: usize = 4;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrieverConfig {
    pub index: IndexSection,
    pub chunking: ChunkingSection,
    pub retrieval: RetrievalSection,
    pub embedding: EmbeddingSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSection {
    pub location: PathBuf,
}

impl Default for IndexSection {
    fn default() -> Self {
        Self {
            location: PathBuf::from(DEFAULT_INDEX_LOCATION),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSection {
    pub size: usize,
    pub overlap: usize,
}

impl Default for ChunkingSection {
    fn default() -> Self {
        Self {
            size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

impl ChunkingSection {
    /// Validated segmenter for these window settings.
    pub fn segmenter(&self) -> Result<TextSegmenter> {
        let window = WindowConfig::new(self.size, self.overlap)?;
        Ok(TextSegmenter::new(window))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSection {
    pub top_k: usize,
}

impl Default for RetrievalSection {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
        }
    }
}

impl RetrievalSection {
    pub fn validate(&self) -> Result<()> {
        if self.top_k == 0 {
            return Err(RetrieverError::config(
                Stage::Retrieve,
                "top_k must be greater than 0",
            ));
        }
        Ok(())
    }
}

/// Embedding backend settings.
///
/// Unset fields take the provider's defaults: DashScope uses
/// `text-embedding-v1` (1536 dimensions) and `DASHSCOPE_API_KEY`, OpenAI uses
/// `text-embedding-3-small` and `OPENAI_API_KEY`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSection {
    pub provider: ProviderKind,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub api_key_env: Option<String>,
    pub dimension: Option<usize>,
    pub batch_size: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub max_retries: Option<usize>,
}

impl EmbeddingSection {
    /// Environment variable holding the API key, if the provider needs one.
    pub fn api_key_var(&self) -> Option<String> {
        if let Some(var) = &self.api_key_env {
            return Some(var.clone());
        }
        match self.provider {
            ProviderKind::OpenAi => Some("OPENAI_API_KEY".to_string()),
            ProviderKind::DashScope => Some("DASHSCOPE_API_KEY".to_string()),
            ProviderKind::Hashing | ProviderKind::FastEmbed => None,
        }
    }

    /// Build the provider configuration, resolving the API key through
    /// `lookup` (the binaries pass an environment lookup).
    pub fn to_embed_config(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> std::result::Result<EmbedConfig, EmbedError> {
        let (default_model, default_base, default_dim, default_batch) = match self.provider {
            ProviderKind::Hashing => ("feature-hash", None, Some(DEFAULT_HASHING_DIMENSION), 32),
            ProviderKind::OpenAi => (
                "text-embedding-3-small",
                Some(OPENAI_BASE_URL),
                Some(1536),
                32,
            ),
            ProviderKind::DashScope => (
                "text-embedding-v1",
                Some(DASHSCOPE_BASE_URL),
                Some(1536),
                25,
            ),
            ProviderKind::FastEmbed => ("all-MiniLM-L6-v2", None, None, 32),
        };

        let mut builder = EmbedConfig::builder();
        builder
            .provider(self.provider)
            .model_name(self.model.as_deref().unwrap_or(default_model))
            .batch_size(self.batch_size.unwrap_or(default_batch));

        if let Some(base_url) = self.base_url.as_deref().or(default_base) {
            builder.base_url(base_url);
        }
        if let Some(dimension) = self.dimension.or(default_dim) {
            builder.dimension(dimension);
        }
        if let Some(timeout) = self.timeout_secs {
            builder.timeout_secs(timeout);
        }
        if let Some(retries) = self.max_retries {
            builder.max_retries(retries);
        }
        if let Some(var) = self.api_key_var() {
            match lookup(&var).filter(|key| !key.trim().is_empty()) {
                Some(key) => {
                    builder.api_key(key);
                }
                None if self.provider.is_remote() => {
                    return Err(EmbedError::MissingApiKey { var });
                }
                None => {}
            }
        }

        let config = builder
            .build()
            .map_err(|e| EmbedError::invalid_config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

impl RetrieverConfig {
    /// Load configuration from a TOML file, or defaults when it does not exist.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }
}
