use solaudit_context::{TextChunk, TextSegmenter, WindowConfig};
use std::path::Path;

/// Configuration for chunking documents
#[derive(Debug, Clone, Copy, Default)]
pub struct ChunkingConfig {
    /// Window size and overlap, in characters
    pub window: WindowConfig,
}

impl ChunkingConfig {
    pub fn new(window: WindowConfig) -> Self {
        Self { window }
    }
}

/// Strategy for chunking documents - delegates the windowing to solaudit-context
#[derive(Debug, Clone, Default)]
pub struct ChunkingStrategy {
    config: ChunkingConfig,
}

impl ChunkingStrategy {
    /// Create a new chunking strategy with the given configuration
    pub fn new(config: ChunkingConfig) -> Self {
        Self { config }
    }

    pub fn window(&self) -> WindowConfig {
        self.config.window
    }

    /// Chunk a document's text; every chunk carries `source` as its origin
    pub fn chunk_content(&self, source: &str, content: &str) -> Vec<TextChunk> {
        let chunks = TextSegmenter::new(self.config.window)
            .with_source(source)
            .get_chunks(content);

        tracing::debug!(
            "Chunked {} into {} chunks (size: {}, overlap: {})",
            source,
            chunks.len(),
            self.config.window.size(),
            self.config.window.overlap()
        );

        chunks
    }

    /// Check if a file found while walking a directory should be ingested
    pub fn should_index_file(&self, file_path: &Path) -> bool {
        // Skip hidden files and common binary/generated file extensions
        if let Some(filename) = file_path.file_name().and_then(|n| n.to_str()) {
            if filename.starts_with('.') {
                return false;
            }
        }

        match file_path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .as_deref()
        {
            // Contract sources, audit reports and plain documents
            Some("sol") | Some("vy") | Some("pdf") | Some("md") | Some("markdown")
            | Some("txt") | Some("rst") => true,

            // Binary and generated files we skip
            Some("exe") | Some("dll") | Some("so") | Some("dylib") | Some("bin") | Some("png")
            | Some("jpg") | Some("jpeg") | Some("gif") | Some("ico") | Some("wasm")
            | Some("lock") | Some("zip") | Some("gz") => false,

            // Files without extensions - check if they're common text files
            None => {
                if let Some(filename) = file_path.file_name().and_then(|n| n.to_str()) {
                    matches!(filename, "README" | "CHANGELOG" | "LICENSE")
                } else {
                    false
                }
            }

            // Unknown extensions - default to indexing
            Some(_) => true,
        }
    }
}
