//! File-backed [`IndexStore`]
//!
//! An index is a directory holding two artifacts:
//!
//! - `vectors.f16`: `chunk_count × dimension` f16 values, row-major, little-endian
//! - `chunks.json`: [`IndexMetadata`] followed by the chunk list
//!
//! `build` writes both into a temporary sibling directory and renames it over
//! the target, so a reader either sees the old index, the new one, or none.

use super::{
    CHUNKS_FILE, ChunksFile, DistanceMetric, INDEX_FORMAT_VERSION, IndexMetadata, IndexStore,
    IndexSummary, VECTORS_FILE, VectorIndex,
};
use crate::error::{Result, RetrieverError, Stage};
use chrono::Utc;
use half::f16;
use solaudit_context::TextChunk;
use solaudit_embed::{EmbedError, EmbeddingProvider, ensure_finite};
use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct DirectoryStore {
    location: PathBuf,
}

impl DirectoryStore {
    pub fn new(location: impl Into<PathBuf>) -> Self {
        Self {
            location: location.into(),
        }
    }

    fn vectors_path(&self) -> PathBuf {
        self.location.join(VECTORS_FILE)
    }

    fn chunks_path(&self) -> PathBuf {
        self.location.join(CHUNKS_FILE)
    }

    /// Directory that receives the temporary build directory.
    fn parent_dir(&self) -> PathBuf {
        match self.location.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    fn read_chunks_file(&self) -> Result<ChunksFile> {
        let path = self.chunks_path();
        let content = fs::read(&path).map_err(|e| RetrieverError::io(Stage::Load, &path, e))?;
        serde_json::from_slice(&content).map_err(|e| RetrieverError::CorruptIndex {
            location: self.location.clone(),
            message: format!("{CHUNKS_FILE} is not valid: {e}"),
        })
    }

    /// Refuse to build over a directory that holds anything besides index
    /// artifacts; `build` replaces the whole directory.
    fn check_replaceable(&self) -> Result<()> {
        let entries = match fs::read_dir(&self.location) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(_) if !self.location.is_dir() => {
                return Err(RetrieverError::config(
                    Stage::Build,
                    format!("{} exists and is not a directory", self.location.display()),
                ));
            }
            Err(e) => return Err(RetrieverError::io(Stage::Build, &self.location, e)),
        };

        for entry in entries {
            let entry = entry.map_err(|e| RetrieverError::io(Stage::Build, &self.location, e))?;
            let name = entry.file_name();
            let is_artifact = name == VECTORS_FILE || name == CHUNKS_FILE;
            if !is_artifact || !entry.path().is_file() {
                return Err(RetrieverError::config(
                    Stage::Build,
                    format!(
                        "{} is not an index directory (found {}); refusing to replace it",
                        self.location.display(),
                        name.to_string_lossy()
                    ),
                ));
            }
        }
        Ok(())
    }

    fn corrupt(&self, message: impl Into<String>) -> RetrieverError {
        RetrieverError::CorruptIndex {
            location: self.location.clone(),
            message: message.into(),
        }
    }

    fn embed_chunks(
        &self,
        chunks: &[TextChunk],
        embedder: &dyn EmbeddingProvider,
    ) -> Result<Vec<f16>> {
        let dimension = embedder.embedding_dimension();
        let texts: Vec<String> = chunks.iter().map(|c| c.chunk_text.clone()).collect();

        tracing::info!(
            "Embedding {} chunks with {} ({})",
            texts.len(),
            embedder.provider_name(),
            embedder.model_name()
        );
        let result = embedder
            .embed_texts(&texts)
            .map_err(|e| RetrieverError::embedding(Stage::Embed, e))?;

        if result.len() != chunks.len() {
            return Err(RetrieverError::embedding(
                Stage::Embed,
                EmbedError::CountMismatch {
                    inputs: chunks.len(),
                    outputs: result.len(),
                },
            ));
        }

        let mut flat = Vec::with_capacity(chunks.len() * dimension);
        for embedding in result.embeddings {
            ensure_finite(&embedding).map_err(|e| RetrieverError::embedding(Stage::Embed, e))?;
            if embedding.len() != dimension {
                return Err(RetrieverError::embedding(
                    Stage::Embed,
                    EmbedError::DimensionMismatch {
                        expected: dimension,
                        actual: embedding.len(),
                    },
                ));
            }
            flat.extend(embedding);
        }
        Ok(flat)
    }

    /// Write both artifacts into a fresh directory next to the target and
    /// rename it into place.
    fn persist(
        &self,
        metadata: &IndexMetadata,
        vector_bytes: &[u8],
        chunks: &[TextChunk],
    ) -> Result<()> {
        let parent = self.parent_dir();
        fs::create_dir_all(&parent).map_err(|e| RetrieverError::io(Stage::Build, &parent, e))?;

        let staging = tempfile::Builder::new()
            .prefix(".solaudit-build-")
            .tempdir_in(&parent)
            .map_err(|e| RetrieverError::io(Stage::Build, &parent, e))?;

        let vectors_path = staging.path().join(VECTORS_FILE);
        fs::write(&vectors_path, vector_bytes)
            .map_err(|e| RetrieverError::io(Stage::Build, &vectors_path, e))?;

        let chunks_file = ChunksFile {
            metadata: metadata.clone(),
            chunks: chunks.to_vec(),
        };
        let json = serde_json::to_vec_pretty(&chunks_file).map_err(|e| {
            RetrieverError::Serialization {
                stage: Stage::Build,
                source: e,
            }
        })?;
        let chunks_path = staging.path().join(CHUNKS_FILE);
        fs::write(&chunks_path, json)
            .map_err(|e| RetrieverError::io(Stage::Build, &chunks_path, e))?;

        // Move any previous index aside first; rename cannot replace a non-empty directory.
        let retired = tempfile::Builder::new()
            .prefix(".solaudit-old-")
            .tempdir_in(&parent)
            .map_err(|e| RetrieverError::io(Stage::Build, &parent, e))?;
        let retired_index = retired.path().join("index");
        self.check_replaceable()?;
        let had_previous = self.location.exists();
        if had_previous {
            fs::rename(&self.location, &retired_index)
                .map_err(|e| RetrieverError::io(Stage::Build, &self.location, e))?;
        }

        if let Err(e) = fs::rename(staging.path(), &self.location) {
            if had_previous {
                if let Err(restore) = fs::rename(&retired_index, &self.location) {
                    tracing::error!(
                        "Failed to restore previous index at {}: {}",
                        self.location.display(),
                        restore
                    );
                }
            }
            return Err(RetrieverError::io(Stage::Build, &self.location, e));
        }

        // `staging` now points at a moved directory; dropping it is a no-op.
        // Dropping `retired` deletes the previous index.
        Ok(())
    }
}

impl IndexStore for DirectoryStore {
    fn location(&self) -> &Path {
        &self.location
    }

    fn exists(&self) -> bool {
        self.vectors_path().is_file() && self.chunks_path().is_file()
    }

    fn build(
        &self,
        chunks: &[TextChunk],
        embedder: &dyn EmbeddingProvider,
    ) -> Result<VectorIndex> {
        if chunks.is_empty() {
            return Err(RetrieverError::EmptyInput {
                stage: Stage::Build,
                document: "no chunks to index".to_string(),
            });
        }
        if embedder.embedding_dimension() == 0 {
            return Err(RetrieverError::config(
                Stage::Build,
                "embedding provider reports dimension 0",
            ));
        }
        self.check_replaceable()?;

        let vectors = self.embed_chunks(chunks, embedder)?;
        let vector_bytes: &[u8] = bytemuck::cast_slice(&vectors);

        let metadata = IndexMetadata {
            format_version: INDEX_FORMAT_VERSION,
            provider: embedder.provider_name().to_string(),
            model: embedder.model_name().to_string(),
            dimension: embedder.embedding_dimension(),
            metric: DistanceMetric::Cosine,
            chunk_count: chunks.len(),
            vectors_blake3: hex::encode(blake3::hash(vector_bytes).as_bytes()),
            built_at: Utc::now(),
        };

        self.persist(&metadata, vector_bytes, chunks)?;
        tracing::info!(
            "Built index at {} ({} chunks, dimension {})",
            self.location.display(),
            metadata.chunk_count,
            metadata.dimension
        );

        VectorIndex::from_parts(metadata, vectors, chunks.to_vec())
            .ok_or_else(|| RetrieverError::config(Stage::Build, "index shape mismatch"))
    }

    fn load(&self) -> Result<VectorIndex> {
        if !self.exists() {
            return Err(RetrieverError::IndexNotFound {
                location: self.location.clone(),
            });
        }

        let ChunksFile { metadata, chunks } = self.read_chunks_file()?;
        if metadata.format_version != INDEX_FORMAT_VERSION {
            return Err(self.corrupt(format!(
                "unsupported format version {}",
                metadata.format_version
            )));
        }
        if chunks.len() != metadata.chunk_count {
            return Err(self.corrupt(format!(
                "metadata lists {} chunks but {} are stored",
                metadata.chunk_count,
                chunks.len()
            )));
        }

        let vectors_path = self.vectors_path();
        let bytes =
            fs::read(&vectors_path).map_err(|e| RetrieverError::io(Stage::Load, &vectors_path, e))?;
        let expected_len = metadata
            .chunk_count
            .checked_mul(metadata.dimension)
            .and_then(|n| n.checked_mul(std::mem::size_of::<f16>()))
            .ok_or_else(|| {
                self.corrupt(format!(
                    "{} chunks of dimension {} overflow the vector size",
                    metadata.chunk_count, metadata.dimension
                ))
            })?;
        if bytes.len() != expected_len {
            return Err(self.corrupt(format!(
                "{VECTORS_FILE} holds {} bytes, expected {expected_len}",
                bytes.len()
            )));
        }
        let checksum = hex::encode(blake3::hash(&bytes).as_bytes());
        if checksum != metadata.vectors_blake3 {
            return Err(self.corrupt(format!("{VECTORS_FILE} checksum mismatch")));
        }

        // The byte buffer carries no alignment guarantee, so copy rather than cast.
        let vectors: Vec<f16> = bytemuck::pod_collect_to_vec(&bytes);
        tracing::info!(
            "Loaded index from {} ({} chunks, model {})",
            self.location.display(),
            metadata.chunk_count,
            metadata.model
        );

        VectorIndex::from_parts(metadata, vectors, chunks)
            .ok_or_else(|| self.corrupt("vector buffer does not match chunk list"))
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_dir_all(&self.location) {
            Ok(()) => {
                tracing::info!("Removed index at {}", self.location.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(RetrieverError::io(Stage::Build, &self.location, e)),
        }
    }

    fn summary(&self) -> Result<Option<IndexSummary>> {
        if !self.exists() {
            return Ok(None);
        }
        let ChunksFile { metadata, chunks } = self.read_chunks_file()?;
        let vectors_path = self.vectors_path();
        let vectors_bytes = fs::metadata(&vectors_path)
            .map_err(|e| RetrieverError::io(Stage::Load, &vectors_path, e))?
            .len();
        let sources: BTreeSet<String> = chunks.into_iter().filter_map(|c| c.source).collect();

        Ok(Some(IndexSummary {
            location: self.location.clone(),
            provider: metadata.provider,
            model: metadata.model,
            dimension: metadata.dimension,
            chunk_count: metadata.chunk_count,
            sources: sources.into_iter().collect(),
            vectors_bytes,
            built_at: metadata.built_at,
        }))
    }
}
