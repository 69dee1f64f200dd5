//! Benchmark settings, read from the same `solaudit.toml` as the retriever

use crate::answering::{ChatCompletionsConfig, DEEPSEEK_BASE_URL, DEFAULT_CHAT_MODEL};
use crate::error::{BenchError, Result};
use crate::label::{DEFAULT_POSITIVE_KEYWORD, KeywordClassifier};
use crate::predictor::DEFAULT_QUESTION;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use solaudit_retriever::Stage;
use solaudit_retriever::config::RetrieverConfig;
use std::path::Path;

/// Environment variable read for the answering API key by default.
pub const DEFAULT_ANSWERING_KEY_VAR: &str = "DEEPSEEK_API_KEY";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    #[serde(flatten)]
    pub retriever: RetrieverConfig,
    pub answering: AnsweringSection,
    pub benchmark: BenchmarkSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnsweringSection {
    pub base_url: String,
    pub model: String,
    pub api_key_env: String,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl Default for AnsweringSection {
    fn default() -> Self {
        Self {
            base_url: DEEPSEEK_BASE_URL.to_string(),
            model: DEFAULT_CHAT_MODEL.to_string(),
            api_key_env: DEFAULT_ANSWERING_KEY_VAR.to_string(),
            temperature: 0.0,
            timeout_secs: 60,
        }
    }
}

impl AnsweringSection {
    /// Resolve the API key through `lookup` and build the client settings.
    pub fn to_chat_config(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<ChatCompletionsConfig> {
        let api_key = lookup(&self.api_key_env)
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                BenchError::config(
                    Stage::Answer,
                    format!("environment variable {} is not set", self.api_key_env),
                )
            })?;
        Ok(ChatCompletionsConfig {
            base_url: self.base_url.clone(),
            model: self.model.clone(),
            api_key,
            temperature: self.temperature,
            timeout_secs: self.timeout_secs,
        })
    }
}

/// How predictions are produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Retrieve context from the index before asking
    #[default]
    Rag,
    /// Ask about the code alone
    Direct,
}

impl std::str::FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rag" => Ok(Strategy::Rag),
            "direct" => Ok(Strategy::Direct),
            _ => Err(format!("Invalid strategy: {s}. Use 'rag' or 'direct'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchmarkSection {
    pub question: String,
    pub positive_keyword: String,
    pub strategy: Strategy,
}

impl Default for BenchmarkSection {
    fn default() -> Self {
        Self {
            question: DEFAULT_QUESTION.to_string(),
            positive_keyword: DEFAULT_POSITIVE_KEYWORD.to_string(),
            strategy: Strategy::default(),
        }
    }
}

impl BenchmarkSection {
    pub fn classifier(&self) -> Result<KeywordClassifier> {
        KeywordClassifier::new(self.positive_keyword.clone())
    }
}

impl BenchConfig {
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
