//! Nearest-neighbor lookup over a loaded index.

use crate::error::{Result, RetrieverError, Stage};
use crate::storage::{IndexStore, VectorIndex};
use serde::Serialize;
use solaudit_context::TextChunk;
use solaudit_embed::{EmbedError, EmbeddingProvider, ensure_finite};

/// Separator placed between chunk texts in [`Retriever::context_for`].
pub const CONTEXT_SEPARATOR: &str = "\n\n";

/// One retrieval hit.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievedChunk {
    /// Position in the result list, starting at 0
    pub rank: usize,
    /// Row of the chunk in the index
    pub row: usize,
    /// Cosine similarity to the query
    pub score: f32,
    pub chunk: TextChunk,
}

/// Embeds queries and looks them up in a [`VectorIndex`].
///
/// The embedder must be the one the index was built with: a different
/// dimension is refused, a different model name only logs a warning.
pub struct Retriever<E> {
    index: VectorIndex,
    embedder: E,
}

impl<E: EmbeddingProvider> Retriever<E> {
    pub fn new(index: VectorIndex, embedder: E) -> Result<Self> {
        let metadata = index.metadata();
        if metadata.dimension != embedder.embedding_dimension() {
            return Err(RetrieverError::config(
                Stage::Load,
                format!(
                    "index was built with {}-dimensional vectors ({}) but the embedder produces {} ({})",
                    metadata.dimension,
                    metadata.model,
                    embedder.embedding_dimension(),
                    embedder.model_name()
                ),
            ));
        }
        if metadata.model != embedder.model_name() || metadata.provider != embedder.provider_name()
        {
            tracing::warn!(
                "Index was built with {} ({}) but queries use {} ({}); results may be meaningless",
                metadata.provider,
                metadata.model,
                embedder.provider_name(),
                embedder.model_name()
            );
        }
        Ok(Self { index, embedder })
    }

    /// Load the index from `store` and bind it to `embedder`.
    pub fn open(store: &dyn IndexStore, embedder: E) -> Result<Self> {
        Self::new(store.load()?, embedder)
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    pub fn embedder(&self) -> &E {
        &self.embedder
    }

    /// Return the `k` chunks most similar to `query`, best first.
    ///
    /// Fewer than `k` come back only when the index is smaller than `k`.
    /// Equal scores keep index row order.
    pub fn retrieve(&self, query: &str, k: usize) -> Result<Vec<RetrievedChunk>> {
        if k == 0 {
            return Err(RetrieverError::config(
                Stage::Retrieve,
                "k must be greater than 0",
            ));
        }

        let query_vector = self
            .embedder
            .embed_text(query)
            .map_err(|e| RetrieverError::embedding(Stage::Retrieve, e))?;
        ensure_finite(&query_vector).map_err(|e| RetrieverError::embedding(Stage::Retrieve, e))?;
        if query_vector.len() != self.index.dimension() {
            return Err(RetrieverError::embedding(
                Stage::Retrieve,
                EmbedError::DimensionMismatch {
                    expected: self.index.dimension(),
                    actual: query_vector.len(),
                },
            ));
        }

        let hits = self.index.search(&query_vector, k);
        tracing::debug!("Retrieved {} of {} chunks for query", hits.len(), self.index.len());

        Ok(hits
            .into_iter()
            .enumerate()
            .filter_map(|(rank, (row, score))| {
                self.index.chunk(row).map(|chunk| RetrievedChunk {
                    rank,
                    row,
                    score,
                    chunk: chunk.clone(),
                })
            })
            .collect())
    }

    /// Retrieve and join the chunk texts into a single context string.
    pub fn context_for(&self, query: &str, k: usize) -> Result<String> {
        let hits = self.retrieve(query, k)?;
        Ok(hits
            .iter()
            .map(|hit| hit.chunk.chunk_text.as_str())
            .collect::<Vec<_>>()
            .join(CONTEXT_SEPARATOR))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::DirectoryStore;
    use solaudit_context::segment;
    use solaudit_embed::HashingProvider;
    use tempfile::tempdir;
    use tracing_test::traced_test;

    fn unique_text(words: usize) -> String {
        (0..words).map(|i| format!("w{i:04} ")).collect()
    }

    fn build(words: usize) -> (tempfile::TempDir, DirectoryStore, Vec<TextChunk>) {
        let dir = tempdir().unwrap();
        let store = DirectoryStore::new(dir.path().join("index"));
        let chunks = segment(&unique_text(words), 120, 24).unwrap();
        store
            .build(&chunks, &HashingProvider::new(256).unwrap())
            .unwrap();
        (dir, store, chunks)
    }

    #[test]
    fn test_exact_chunk_text_ranks_first() {
        let (_dir, store, chunks) = build(200);
        let retriever = Retriever::open(&store, HashingProvider::new(256).unwrap()).unwrap();

        for target in [0, chunks.len() / 2, chunks.len() - 1] {
            let hits = retriever.retrieve(&chunks[target].chunk_text, 3).unwrap();
            assert_eq!(hits[0].row, target);
            assert_eq!(hits.len(), 3);
            assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
        }
    }

    #[test]
    fn test_fewer_hits_than_k() {
        let (_dir, store, chunks) = build(20);
        let retriever = Retriever::open(&store, HashingProvider::new(256).unwrap()).unwrap();
        let hits = retriever.retrieve("w0001", 50).unwrap();
        assert_eq!(hits.len(), chunks.len());
    }

    #[test]
    fn test_zero_k_rejected() {
        let (_dir, store, _) = build(20);
        let retriever = Retriever::open(&store, HashingProvider::new(256).unwrap()).unwrap();
        let err = retriever.retrieve("anything", 0).unwrap_err();
        assert!(matches!(
            err,
            RetrieverError::Configuration {
                stage: Stage::Retrieve,
                ..
            }
        ));
    }

    #[test]
    fn test_dimension_mismatch_refused() {
        let (_dir, store, _) = build(20);
        let result = Retriever::open(&store, HashingProvider::new(64).unwrap());
        assert!(matches!(
            result,
            Err(RetrieverError::Configuration {
                stage: Stage::Load,
                ..
            })
        ));
    }

    /// Hashing embedder that yields NaN for the query "nan".
    struct NanQuery(HashingProvider);

    impl EmbeddingProvider for NanQuery {
        fn embed_text(&self, text: &str) -> solaudit_embed::Result<Vec<half::f16>> {
            let mut vector = self.0.embed_text(text)?;
            if text == "nan" {
                vector[0] = half::f16::NAN;
            }
            Ok(vector)
        }

        fn embedding_dimension(&self) -> usize {
            self.0.embedding_dimension()
        }

        fn provider_name(&self) -> &str {
            self.0.provider_name()
        }

        fn model_name(&self) -> &str {
            self.0.model_name()
        }
    }

    #[test]
    fn test_non_finite_query_rejected() {
        let (_dir, store, _) = build(20);
        let embedder = NanQuery(HashingProvider::new(256).unwrap());
        let retriever = Retriever::open(&store, embedder).unwrap();
        assert!(retriever.retrieve("w0001", 2).is_ok());

        let err = retriever.retrieve("nan", 2).unwrap_err();
        assert!(matches!(
            err,
            RetrieverError::Embedding {
                stage: Stage::Retrieve,
                source: EmbedError::NonFinite { position: 0 },
            }
        ));
    }

    #[traced_test]
    #[test]
    fn test_model_mismatch_warns() {
        let (_dir, store, _) = build(20);
        let embedder = HashingProvider::new(256).unwrap();
        let index = store.load().unwrap();
        let mut renamed = index.metadata().clone();
        renamed.model = "text-embedding-v1".to_string();
        let index =
            VectorIndex::from_parts(renamed, index.vectors().to_vec(), index.chunks().to_vec())
                .unwrap();

        assert!(Retriever::new(index, embedder).is_ok());
        assert!(logs_contain("results may be meaningless"));
    }

    #[test]
    fn test_context_joins_hits_in_rank_order() {
        let (_dir, store, chunks) = build(200);
        let retriever = Retriever::open(&store, HashingProvider::new(256).unwrap()).unwrap();
        let query = &chunks[1].chunk_text;

        let hits = retriever.retrieve(query, 2).unwrap();
        let context = retriever.context_for(query, 2).unwrap();
        assert_eq!(
            context,
            format!(
                "{}{CONTEXT_SEPARATOR}{}",
                hits[0].chunk.chunk_text, hits[1].chunk.chunk_text
            )
        );
        assert!(context.starts_with(query.as_str()));
    }
}
