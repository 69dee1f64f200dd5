//! Error types for index building, loading and retrieval

use solaudit_context::SegmentError;
use solaudit_embed::EmbedError;
use std::path::PathBuf;

/// Result type for retriever operations.
pub type Result<T> = std::result::Result<T, RetrieverError>;

/// Pipeline step an error was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Extract,
    Segment,
    Embed,
    Build,
    Load,
    Retrieve,
    Answer,
    Classify,
    Corpus,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Extract => "extract",
            Stage::Segment => "segment",
            Stage::Embed => "embed",
            Stage::Build => "build",
            Stage::Load => "load",
            Stage::Retrieve => "retrieve",
            Stage::Answer => "answer",
            Stage::Classify => "classify",
            Stage::Corpus => "corpus",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error type for the retrieval pipeline.
///
/// Every variant carries or implies the [`Stage`] it came from, and the
/// rendered message always starts with that stage.
#[derive(Debug, thiserror::Error)]
pub enum RetrieverError {
    /// Invalid parameters such as `k == 0` or `overlap >= size`
    #[error("[{stage}] configuration error: {message}")]
    Configuration { stage: Stage, message: String },

    /// No complete index exists at the configured location
    #[error("[load] no index found at {}; build the index first", location.display())]
    IndexNotFound { location: PathBuf },

    /// The embedding collaborator failed
    #[error("[{stage}] embedding failed: {source}")]
    Embedding {
        stage: Stage,
        #[source]
        source: EmbedError,
    },

    /// Nothing to index: an empty chunk list or a document without text
    #[error("[{stage}] empty input: {document}")]
    EmptyInput { stage: Stage, document: String },

    /// The persisted artifacts disagree with their metadata
    #[error("[load] corrupt index at {}: {message}", location.display())]
    CorruptIndex { location: PathBuf, message: String },

    /// File system failure
    #[error("[{stage}] I/O error on {}: {source}", path.display())]
    Io {
        stage: Stage,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Metadata could not be encoded or decoded
    #[error("[{stage}] serialization error: {source}")]
    Serialization {
        stage: Stage,
        #[source]
        source: serde_json::Error,
    },

    /// Text could not be extracted from a document
    #[error("[extract] could not extract text from {document}: {message}")]
    Extraction { document: String, message: String },
}

impl RetrieverError {
    /// The stage this error was raised in.
    pub fn stage(&self) -> Stage {
        match self {
            RetrieverError::Configuration { stage, .. }
            | RetrieverError::Embedding { stage, .. }
            | RetrieverError::EmptyInput { stage, .. }
            | RetrieverError::Io { stage, .. }
            | RetrieverError::Serialization { stage, .. } => *stage,
            RetrieverError::IndexNotFound { .. } | RetrieverError::CorruptIndex { .. } => {
                Stage::Load
            }
            RetrieverError::Extraction { .. } => Stage::Extract,
        }
    }

    pub fn config<S: Into<String>>(stage: Stage, message: S) -> Self {
        Self::Configuration {
            stage,
            message: message.into(),
        }
    }

    pub fn io(stage: Stage, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            stage,
            path: path.into(),
            source,
        }
    }

    pub fn embedding(stage: Stage, source: EmbedError) -> Self {
        Self::Embedding { stage, source }
    }
}

impl From<SegmentError> for RetrieverError {
    fn from(err: SegmentError) -> Self {
        Self::config(Stage::Segment, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_their_stage() {
        let err = RetrieverError::config(Stage::Retrieve, "k must be greater than 0");
        assert_eq!(
            err.to_string(),
            "[retrieve] configuration error: k must be greater than 0"
        );

        let err = RetrieverError::IndexNotFound {
            location: PathBuf::from("solaudit_index"),
        };
        assert_eq!(err.stage(), Stage::Load);
        assert!(err.to_string().contains("build the index first"));
    }

    #[test]
    fn test_segment_error_maps_to_configuration() {
        let err: RetrieverError = SegmentError::ZeroSize.into();
        assert!(matches!(
            err,
            RetrieverError::Configuration {
                stage: Stage::Segment,
                ..
            }
        ));
    }
}
