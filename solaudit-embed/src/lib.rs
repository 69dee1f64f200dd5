//! # solaudit-embed
//!
//! Text embedding providers for the contract audit retriever. Every provider
//! turns text into fixed-dimension `f16` vectors through the blocking
//! [`EmbeddingProvider`] trait.
//!
//! ## Providers
//!
//! - [`HashingProvider`]: deterministic feature hashing, offline, used by default and in tests
//! - [`OpenAiCompatibleProvider`]: any OpenAI-style `/embeddings` endpoint (OpenAI, DashScope)
//! - `FastEmbedProvider`: local ONNX models, behind the `fastembed` feature
//!
//! ## Quick Start
//!
//! ```
//! use solaudit_embed::{EmbedConfig, EmbeddingProvider, provider_from_config};
//!
//! let provider = provider_from_config(&EmbedConfig::hashing(64))?;
//! let texts = vec!["function withdraw()".to_string(), "mapping balances".to_string()];
//! let result = provider.embed_texts(&texts)?;
//! assert_eq!(result.len(), 2);
//! assert_eq!(result.dimension, 64);
//! # Ok::<(), solaudit_embed::EmbedError>(())
//! ```
//!
//! ## Error Handling
//!
//! All operations return [`Result<T>`] using the crate's [`EmbedError`] type.
//! API keys are passed in through [`EmbedConfig`]; this crate never reads the
//! process environment.

pub mod config;
pub mod error;
#[cfg(feature = "fastembed")]
pub mod local;
pub mod provider;
pub mod remote;

pub use config::{
    DASHSCOPE_BASE_URL, DEFAULT_HASHING_DIMENSION, EmbedConfig, EmbedConfigBuilder,
    OPENAI_BASE_URL, ProviderKind,
};
pub use error::{EmbedError, Result};
#[cfg(feature = "fastembed")]
pub use local::FastEmbedProvider;
pub use provider::{
    EmbeddingProvider, EmbeddingResult, HashingProvider, ensure_finite, l2_normalize,
    provider_from_config, to_f16,
};
pub use remote::OpenAiCompatibleProvider;
