//! Error types for the embedding system

/// Result type for embedding operations.
///
/// This is a convenience type alias that uses [`EmbedError`] as the error type.
pub type Result<T> = std::result::Result<T, EmbedError>;

/// Error type for all embedding operations.
///
/// Covers configuration problems detected before any text is embedded as well
/// as failures reported by a provider while embedding. Providers never retry
/// on behalf of the caller except where noted (the HTTP provider retries
/// rate-limit and server errors a bounded number of times).
///
/// # Error Categories
///
/// - **Configuration Errors**: Invalid provider settings or a missing API key
/// - **Initialization Errors**: Failures while loading a local model
/// - **Runtime Errors**: Problems during embedding generation
/// - **Shape Errors**: A provider returned vectors of an unexpected size
#[derive(Debug, thiserror::Error)]
pub enum EmbedError {
    /// Error when provider configuration is invalid
    #[error("Invalid embedding configuration: {message}")]
    InvalidConfig { message: String },

    /// The configured API key environment variable is unset or empty
    #[error("Missing API key: environment variable {var} is not set")]
    MissingApiKey { var: String },

    /// Error during model initialization
    #[error("Model initialization failed: {source}")]
    ModelInitialization {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Error during embedding generation
    #[error("Embedding generation failed: {source}")]
    EmbeddingGeneration {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The remote service answered with a non-success status
    #[error("Embedding service returned {status}: {body}")]
    Service { status: u16, body: String },

    /// A vector did not have the dimension the provider advertises
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// A vector held a NaN or infinite component
    #[error("Embedding has a non-finite value at position {position}")]
    NonFinite { position: usize },

    /// The provider returned a different number of vectors than inputs
    #[error("Embedding count mismatch: {inputs} inputs, {outputs} vectors")]
    CountMismatch { inputs: usize, outputs: usize },

    /// HTTP transport errors
    #[error("HTTP error: {source}")]
    Http {
        #[from]
        source: reqwest::Error,
    },

    /// Generic errors from other libraries
    #[error("External error: {source}")]
    External {
        #[from]
        source: anyhow::Error,
    },
}

impl EmbedError {
    /// Create a model initialization error from any error type.
    pub fn model_init<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::ModelInitialization {
            source: Box::new(source),
        }
    }

    /// Create an embedding generation error from any error type.
    ///
    /// This is a convenience constructor for wrapping errors that occur during
    /// the actual embedding generation process.
    pub fn embedding_gen<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::EmbeddingGeneration {
            source: Box::new(source),
        }
    }

    /// Create an invalid configuration error with a custom message.
    ///
    /// # Arguments
    /// * `message` - A descriptive error message explaining what's wrong with the configuration
    pub fn invalid_config<S: Into<String>>(message: S) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}
