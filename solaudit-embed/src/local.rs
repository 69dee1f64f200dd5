//! Local ONNX embeddings through fastembed

use crate::config::EmbedConfig;
use crate::error::{EmbedError, Result};
use crate::provider::{EmbeddingProvider, EmbeddingResult, l2_normalize, to_f16};
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use half::f16;
use std::sync::Mutex;

/// Provider backed by a fastembed model running in-process.
///
/// The model is downloaded on first use and loaded once; calls are
/// serialized through a mutex because inference needs mutable access.
pub struct FastEmbedProvider {
    model: Mutex<TextEmbedding>,
    model_name: String,
    dimension: usize,
    batch_size: usize,
    normalize: bool,
}

impl FastEmbedProvider {
    /// Load the configured model and probe its output dimension.
    pub fn try_new(config: &EmbedConfig) -> Result<Self> {
        let model_kind = fastembed_model(config.model_name())?;
        tracing::info!("Loading embedding model: {}", config.model_name());

        let init_options = InitOptions::new(model_kind).with_show_download_progress(true);
        let mut model =
            TextEmbedding::try_new(init_options).map_err(|e| EmbedError::External { source: e })?;

        let probe = model
            .embed(vec!["test".to_string()], None)
            .map_err(|e| EmbedError::External { source: e })?;
        let dimension = probe.first().map(|emb| emb.len()).unwrap_or(0);
        if let Some(expected) = config.dimension.filter(|&d| d > 0) {
            if expected != dimension {
                return Err(EmbedError::DimensionMismatch {
                    expected,
                    actual: dimension,
                });
            }
        }

        tracing::info!("Model loaded successfully. Dimension: {}", dimension);
        Ok(Self {
            model: Mutex::new(model),
            model_name: config.model_name().to_string(),
            dimension,
            batch_size: config.batch_size,
            normalize: config.normalize,
        })
    }

    fn run(&self, texts: Vec<String>) -> Result<Vec<Vec<f16>>> {
        let mut guard = self
            .model
            .lock()
            .map_err(|_| EmbedError::invalid_config("embedding model lock poisoned"))?;
        let raw = guard
            .embed(texts, None)
            .map_err(|e| EmbedError::External { source: e })?;
        Ok(raw
            .into_iter()
            .map(|mut vector| {
                if self.normalize {
                    l2_normalize(&mut vector);
                }
                to_f16(&vector)
            })
            .collect())
    }
}

impl EmbeddingProvider for FastEmbedProvider {
    fn embed_text(&self, text: &str) -> Result<Vec<f16>> {
        self.run(vec![text.to_string()])?
            .pop()
            .ok_or(EmbedError::CountMismatch {
                inputs: 1,
                outputs: 0,
            })
    }

    fn embed_texts(&self, texts: &[String]) -> Result<EmbeddingResult> {
        let mut all_embeddings = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.batch_size) {
            tracing::debug!("Processing batch of {} texts", chunk.len());
            all_embeddings.extend(self.run(chunk.to_vec())?);
        }
        Ok(EmbeddingResult::new(all_embeddings))
    }

    fn embedding_dimension(&self) -> usize {
        self.dimension
    }

    fn provider_name(&self) -> &str {
        "fastembed"
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

fn fastembed_model(name: &str) -> Result<EmbeddingModel> {
    match name.to_lowercase().as_str() {
        "all-minilm-l6-v2" => Ok(EmbeddingModel::AllMiniLML6V2),
        "bge-small-en-v1.5" => Ok(EmbeddingModel::BGESmallENV15),
        "bge-base-en-v1.5" => Ok(EmbeddingModel::BGEBaseENV15),
        "multilingual-e5-small" => Ok(EmbeddingModel::MultilingualE5Small),
        other => Err(EmbedError::invalid_config(format!(
            "unknown fastembed model '{other}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_names_resolve() {
        assert!(fastembed_model("all-MiniLM-L6-v2").is_ok());
        assert!(fastembed_model("multilingual-e5-small").is_ok());
        assert!(fastembed_model("gpt-embeddings").is_err());
    }
}
