//! Storage abstraction layer for solaudit-retriever
//!
//! An [`IndexStore`] owns exactly one persisted index at a fixed location.
//! It can report whether a complete index is present, build a fresh one from
//! chunks (replacing whatever was there), load it back into a query-ready
//! [`VectorIndex`], and remove it.
//!
//! ## Architecture
//!
//! ```text
//! TextChunk[] ── EmbeddingProvider ──▶ VectorIndex ──▶ DirectoryStore (vectors.f16 + chunks.json)
//!                                           ▲                     │
//!                                           └────── load() ───────┘
//! ```

use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use solaudit_context::TextChunk;
use solaudit_embed::EmbeddingProvider;
use std::path::{Path, PathBuf};

pub mod directory_store;
pub mod vector_index;

pub use directory_store::DirectoryStore;
pub use vector_index::{VectorIndex, cosine_similarity};

/// Version of the on-disk layout written by this crate.
pub const INDEX_FORMAT_VERSION: u32 = 1;

/// File holding the flat f16 embedding matrix.
pub const VECTORS_FILE: &str = "vectors.f16";

/// File holding index metadata and chunk texts.
pub const CHUNKS_FILE: &str = "chunks.json";

/// Similarity measure used for nearest-neighbor lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    #[default]
    Cosine,
}

/// Self-description recorded with every persisted index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexMetadata {
    pub format_version: u32,
    /// Provider that produced the vectors (`hashing`, `dashscope`, ...)
    pub provider: String,
    /// Model identity; queries should use the same one
    pub model: String,
    pub dimension: usize,
    pub metric: DistanceMetric,
    pub chunk_count: usize,
    /// Hex blake3 digest of the `vectors.f16` bytes
    pub vectors_blake3: String,
    pub built_at: DateTime<Utc>,
}

/// Contents of `chunks.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ChunksFile {
    pub metadata: IndexMetadata,
    pub chunks: Vec<TextChunk>,
}

/// What `status` reports about a persisted index.
#[derive(Debug, Clone, Serialize)]
pub struct IndexSummary {
    pub location: PathBuf,
    pub provider: String,
    pub model: String,
    pub dimension: usize,
    pub chunk_count: usize,
    pub sources: Vec<String>,
    pub vectors_bytes: u64,
    pub built_at: DateTime<Utc>,
}

/// Persistence for a single vector index. See module docs for the lifecycle.
pub trait IndexStore {
    /// Directory the index lives in.
    fn location(&self) -> &Path;

    /// True iff every required artifact is present.
    fn exists(&self) -> bool;

    /// Embed `chunks` in order, persist them, and return the query-ready index.
    ///
    /// Fully replaces any previous index. On failure the previous index, if
    /// any, is left as it was.
    fn build(&self, chunks: &[TextChunk], embedder: &dyn EmbeddingProvider)
    -> Result<VectorIndex>;

    /// Load the persisted index.
    fn load(&self) -> Result<VectorIndex>;

    /// Remove the persisted index. Succeeds when there is nothing to remove.
    fn clear(&self) -> Result<()>;

    /// Metadata of the persisted index, or `None` if there is none.
    fn summary(&self) -> Result<Option<IndexSummary>>;
}
