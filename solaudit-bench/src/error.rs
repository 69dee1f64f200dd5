//! Error types for the benchmark

use solaudit_retriever::{RetrieverError, Stage};
use std::path::PathBuf;

/// Result type for benchmark operations.
pub type Result<T> = std::result::Result<T, BenchError>;

/// Error type for corpus loading, answering and benchmark runs.
///
/// Like [`RetrieverError`], every message starts with the stage it came from.
#[derive(Debug, thiserror::Error)]
pub enum BenchError {
    /// Index loading or retrieval failed
    #[error(transparent)]
    Retriever(#[from] RetrieverError),

    /// The answering collaborator failed
    #[error("[answer] answering model failed: {source}")]
    Answering {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The answering service replied with a non-success status
    #[error("[answer] answering service returned {status}: {body}")]
    AnsweringService { status: u16, body: String },

    /// The benchmark corpus could not be read
    #[error("[corpus] {}: {message}", path.display())]
    Corpus { path: PathBuf, message: String },

    /// Invalid benchmark or answering settings
    #[error("[{stage}] configuration error: {message}")]
    Configuration { stage: Stage, message: String },

    /// A prediction failed; the run was aborted at this item
    #[error("prediction for {item_id} failed: {source}")]
    Prediction {
        item_id: String,
        #[source]
        source: Box<BenchError>,
    },
}

impl BenchError {
    /// The stage this error was raised in.
    pub fn stage(&self) -> Stage {
        match self {
            BenchError::Retriever(e) => e.stage(),
            BenchError::Answering { .. } | BenchError::AnsweringService { .. } => Stage::Answer,
            BenchError::Corpus { .. } => Stage::Corpus,
            BenchError::Configuration { stage, .. } => *stage,
            BenchError::Prediction { source, .. } => source.stage(),
        }
    }

    pub fn answering<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Answering {
            source: Box::new(source),
        }
    }

    pub fn corpus(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Corpus {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn config(stage: Stage, message: impl Into<String>) -> Self {
        Self::Configuration {
            stage,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for BenchError {
    fn from(err: reqwest::Error) -> Self {
        Self::answering(err)
    }
}
