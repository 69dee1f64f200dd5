pub mod text;

// Re-export the segmentation entry points for external use
pub use text::{
    DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE, SegmentError, TextChunk, TextSegmenter,
    WindowConfig, expected_chunk_count, segment,
};
