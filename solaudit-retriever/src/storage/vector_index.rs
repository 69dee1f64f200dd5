//! In-memory exact nearest-neighbor index over f16 embeddings

use super::IndexMetadata;
use half::f16;
use solaudit_context::TextChunk;

/// Query-ready index: one embedding row per chunk, compared by cosine
/// similarity.
///
/// Vectors are kept in a single row-major buffer (`len() * dimension()`
/// values), the same layout as the persisted `vectors.f16` artifact. A
/// loaded index is never mutated.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    metadata: IndexMetadata,
    vectors: Vec<f16>,
    chunks: Vec<TextChunk>,
}

impl VectorIndex {
    /// Assemble an index, returning `None` when the buffer shape does not
    /// match the chunk list and the metadata.
    pub(crate) fn from_parts(
        metadata: IndexMetadata,
        vectors: Vec<f16>,
        chunks: Vec<TextChunk>,
    ) -> Option<Self> {
        let dimension = metadata.dimension;
        if dimension == 0
            || chunks.len() != metadata.chunk_count
            || chunks.len().checked_mul(dimension) != Some(vectors.len())
        {
            return None;
        }
        Some(Self {
            metadata,
            vectors,
            chunks,
        })
    }

    pub fn metadata(&self) -> &IndexMetadata {
        &self.metadata
    }

    pub fn dimension(&self) -> usize {
        self.metadata.dimension
    }

    /// Number of indexed chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn chunks(&self) -> &[TextChunk] {
        &self.chunks
    }

    pub fn chunk(&self, row: usize) -> Option<&TextChunk> {
        self.chunks.get(row)
    }

    /// Embedding stored for `row`.
    pub fn vector(&self, row: usize) -> Option<&[f16]> {
        let dim = self.dimension();
        let start = row.checked_mul(dim)?;
        self.vectors.get(start..start.checked_add(dim)?)
    }

    /// The raw row-major vector buffer.
    pub fn vectors(&self) -> &[f16] {
        &self.vectors
    }

    /// Return up to `k` `(row, similarity)` pairs, most similar first.
    ///
    /// Equal scores keep row order. A query whose length differs from the
    /// index dimension scores 0 against every row. A NaN score ranks below
    /// every real one.
    pub fn search(&self, query: &[f16], k: usize) -> Vec<(usize, f32)> {
        let dim = self.dimension();
        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .chunks_exact(dim)
            .enumerate()
            .map(|(row, vector)| (row, cosine_similarity(query, vector)))
            .collect();

        // sort_by is stable, so ties stay in ascending row order
        scored.sort_by(|a, b| rank_key(b.1).total_cmp(&rank_key(a.1)));
        scored.truncate(k);
        scored
    }
}

fn rank_key(score: f32) -> f32 {
    if score.is_nan() {
        f32::NEG_INFINITY
    } else {
        score
    }
}

/// Cosine similarity of two f16 vectors, accumulated in f32.
///
/// Returns 0 for vectors of different length or when either has zero norm.
pub fn cosine_similarity(a: &[f16], b: &[f16]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let mut dot_product = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b) {
        let x = x.to_f32();
        let y = y.to_f32();
        dot_product += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let norm_a = norm_a.sqrt();
    let norm_b = norm_b.sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot_product / (norm_a * norm_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::DistanceMetric;
    use chrono::Utc;

    fn v(values: &[f32]) -> Vec<f16> {
        values.iter().map(|&x| f16::from_f32(x)).collect()
    }

    fn chunk(sequence: usize, text: &str) -> TextChunk {
        TextChunk {
            source: None,
            sequence,
            start: 0,
            chunk_text: text.to_string(),
        }
    }

    fn metadata(dimension: usize, chunk_count: usize) -> IndexMetadata {
        IndexMetadata {
            format_version: 1,
            provider: "test".to_string(),
            model: "test-model".to_string(),
            dimension,
            metric: DistanceMetric::Cosine,
            chunk_count,
            vectors_blake3: String::new(),
            built_at: Utc::now(),
        }
    }

    fn index(rows: &[&[f32]]) -> VectorIndex {
        let dim = rows[0].len();
        let vectors: Vec<f16> = rows.iter().flat_map(|r| v(r)).collect();
        let chunks = (0..rows.len()).map(|i| chunk(i, &format!("c{i}"))).collect();
        VectorIndex::from_parts(metadata(dim, rows.len()), vectors, chunks).unwrap()
    }

    #[test]
    fn test_cosine_similarity() {
        // Identical vectors
        assert_eq!(cosine_similarity(&v(&[1.0, 0.0, 0.0]), &v(&[1.0, 0.0, 0.0])), 1.0);

        // Orthogonal vectors
        assert_eq!(cosine_similarity(&v(&[1.0, 0.0]), &v(&[0.0, 1.0])), 0.0);

        // Opposite vectors
        assert_eq!(cosine_similarity(&v(&[1.0, 0.0]), &v(&[-1.0, 0.0])), -1.0);

        // Normalized vectors
        let similarity = cosine_similarity(&v(&[0.6, 0.8]), &v(&[0.8, 0.6]));
        assert!((similarity - 0.96).abs() < 0.01);

        // Zero vectors
        assert_eq!(cosine_similarity(&v(&[0.0, 0.0]), &v(&[1.0, 1.0])), 0.0);

        // Different length vectors
        assert_eq!(cosine_similarity(&v(&[1.0, 2.0]), &v(&[1.0, 2.0, 3.0])), 0.0);
    }

    #[test]
    fn test_search_orders_by_similarity() {
        let index = index(&[&[0.0, 1.0], &[1.0, 0.0], &[0.7, 0.7]]);
        let results = index.search(&v(&[1.0, 0.1]), 3);
        let rows: Vec<usize> = results.iter().map(|(row, _)| *row).collect();
        assert_eq!(rows, vec![1, 2, 0]);
        assert!(results.windows(2).all(|w| w[0].1 >= w[1].1));
    }

    #[test]
    fn test_ties_keep_row_order() {
        let index = index(&[&[1.0, 0.0], &[0.0, 1.0], &[1.0, 0.0], &[1.0, 0.0]]);
        let results = index.search(&v(&[1.0, 0.0]), 3);
        let rows: Vec<usize> = results.iter().map(|(row, _)| *row).collect();
        assert_eq!(rows, vec![0, 2, 3]);
    }

    #[test]
    fn test_nan_rows_rank_last() {
        let index = index(&[
            &[1.0, 2.0],
            &[f32::NAN, 1.0],
            &[1.0, 0.0],
            &[1.0, 2.0],
            &[f32::NAN, 1.0],
            &[1.0, 0.0],
        ]);
        let results = index.search(&v(&[1.0, 0.0]), 6);
        let rows: Vec<usize> = results.iter().map(|(row, _)| *row).collect();
        assert_eq!(rows, vec![2, 5, 0, 3, 1, 4]);
        assert!(results[..4].windows(2).all(|w| w[0].1 >= w[1].1));
        assert!(results[4].1.is_nan() && results[5].1.is_nan());
    }

    #[test]
    fn test_k_larger_than_index() {
        let index = index(&[&[1.0, 0.0], &[0.0, 1.0]]);
        assert_eq!(index.search(&v(&[1.0, 1.0]), 10).len(), 2);
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let result = VectorIndex::from_parts(metadata(2, 2), v(&[1.0, 0.0, 1.0]), vec![
            chunk(0, "a"),
            chunk(1, "b"),
        ]);
        assert!(result.is_none());
    }

    #[test]
    fn test_oversized_dimension_rejected() {
        let result = VectorIndex::from_parts(metadata(usize::MAX, 2), v(&[1.0, 0.0]), vec![
            chunk(0, "a"),
            chunk(1, "b"),
        ]);
        assert!(result.is_none());
    }

    #[test]
    fn test_vector_rows() {
        let index = index(&[&[1.0, 0.0], &[0.0, 1.0]]);
        assert_eq!(index.vector(1), Some(v(&[0.0, 1.0]).as_slice()));
        assert_eq!(index.vector(2), None);
        assert_eq!(index.chunk(0).map(|c| c.chunk_text.as_str()), Some("c0"));
    }
}
