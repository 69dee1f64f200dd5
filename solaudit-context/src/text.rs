//! Fixed-size, overlap-aware text segmentation for the retrieval index.
//!
//! Raw text extracted from audit reports, whitepapers or contract sources is
//! split into windows of `size` characters. Consecutive windows share
//! `overlap` characters so that a sentence cut at a window edge still appears
//! whole in at least one chunk. Windows advance by `size - overlap`
//! characters and the final window may be shorter than `size`.
//!
//! The module defines three main items:
//! - [`WindowConfig`]: a validated `(size, overlap)` pair.
//! - [`TextSegmenter`]: binds a window to an optional source identifier and
//!   produces [`TextChunk`]s.
//! - [`segment`]: the one-shot convenience wrapper.
//!
//! Windows are measured in Unicode scalar values, never bytes, so multi-byte
//! text (for example Chinese audit reports) is never split inside a
//! character.
//!
//! # Determinism
//!
//! Segmentation is a pure function of `(text, size, overlap)`: re-segmenting
//! the same text with the same window yields the same ordered chunks. Index
//! reproducibility depends on this.
//!
//! # Usage
//!
//! ```
//! use solaudit_context::text::{TextSegmenter, WindowConfig};
//!
//! let window = WindowConfig::new(10, 4).unwrap();
//! let segmenter = TextSegmenter::new(window).with_source("notes.txt");
//!
//! let chunks = segmenter.get_chunks("abcdefghijklmnopqrst");
//! let texts: Vec<&str> = chunks.iter().map(|c| c.chunk_text.as_str()).collect();
//! assert_eq!(texts, vec!["abcdefghij", "ghijklmnop", "mnopqrst"]);
//! assert_eq!(chunks[2].sequence, 2);
//! assert_eq!(chunks[2].start, 12);
//! assert_eq!(chunks[0].source.as_deref(), Some("notes.txt"));
//! ```
use serde::{Deserialize, Serialize};

/// Default window size in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Default number of characters shared by consecutive windows.
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Invalid segmentation parameters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SegmentError {
    /// The window size must be at least one character
    #[error("chunk size must be greater than zero")]
    ZeroSize,

    /// The overlap must leave room for the window to advance
    #[error("chunk overlap ({overlap}) must be smaller than chunk size ({size})")]
    OverlapTooLarge { size: usize, overlap: usize },
}

/// A validated segmentation window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WindowConfig {
    size: usize,
    overlap: usize,
}

impl WindowConfig {
    /// Validates and creates a window.
    ///
    /// # Errors
    ///
    /// Returns [`SegmentError::ZeroSize`] when `size == 0` and
    /// [`SegmentError::OverlapTooLarge`] when `overlap >= size`.
    pub fn new(size: usize, overlap: usize) -> Result<Self, SegmentError> {
        if size == 0 {
            return Err(SegmentError::ZeroSize);
        }
        if overlap >= size {
            return Err(SegmentError::OverlapTooLarge { size, overlap });
        }
        Ok(Self { size, overlap })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Number of characters a window advances by.
    pub fn step(&self) -> usize {
        self.size - self.overlap
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

/// A single window of text, along with where it came from.
///
/// `TextChunk`s are immutable once produced; they are consumed by the
/// embedding collaborator and then stored in the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextChunk {
    /// Identifier of the source document, if known.
    pub source: Option<String>,
    /// The position of this chunk within its source (0-indexed).
    pub sequence: usize,
    /// Character offset of the first character of this chunk in its source.
    pub start: usize,
    /// The text content of this chunk.
    pub chunk_text: String,
}

impl TextChunk {
    /// Number of characters in this chunk.
    pub fn char_len(&self) -> usize {
        self.chunk_text.chars().count()
    }
}

/// Splits text into overlapping fixed-size windows.
#[derive(Debug, Clone, Default)]
pub struct TextSegmenter {
    source: Option<String>,
    window: WindowConfig,
}

impl TextSegmenter {
    /// Creates a segmenter for the given window with no source identifier.
    pub fn new(window: WindowConfig) -> Self {
        Self {
            source: None,
            window,
        }
    }

    /// Attaches a source identifier that every produced chunk will carry.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn window(&self) -> WindowConfig {
        self.window
    }

    /// Splits `text` into an ordered sequence of chunks.
    ///
    /// Empty input yields an empty vector. Any non-empty input yields at
    /// least one chunk and no chunk is ever empty. Iteration stops as soon as
    /// a window reaches the end of the text, so the last chunk is never a
    /// suffix already wholly contained in its predecessor.
    ///
    /// # Examples
    ///
    /// ```
    /// use solaudit_context::text::{TextSegmenter, WindowConfig};
    ///
    /// let segmenter = TextSegmenter::new(WindowConfig::new(1000, 200).unwrap());
    /// let text = "x".repeat(2000);
    /// let lengths: Vec<usize> = segmenter
    ///     .get_chunks(&text)
    ///     .iter()
    ///     .map(|c| c.char_len())
    ///     .collect();
    /// assert_eq!(lengths, vec![1000, 1000, 400]);
    /// ```
    pub fn get_chunks(&self, text: &str) -> Vec<TextChunk> {
        if text.is_empty() {
            return Vec::new();
        }

        // Byte offset of every character boundary, including the end of the text.
        let boundaries: Vec<usize> = text
            .char_indices()
            .map(|(offset, _)| offset)
            .chain(std::iter::once(text.len()))
            .collect();
        let char_len = boundaries.len() - 1;
        let step = self.window.step();

        let mut chunks = Vec::with_capacity(expected_chunk_count(char_len, self.window));
        let mut start = 0;
        loop {
            let end = (start + self.window.size).min(char_len);
            chunks.push(TextChunk {
                source: self.source.clone(),
                sequence: chunks.len(),
                start,
                chunk_text: text[boundaries[start]..boundaries[end]].to_string(),
            });
            if end == char_len {
                break;
            }
            start += step;
        }

        chunks
    }
}

/// Number of chunks [`TextSegmenter::get_chunks`] produces for a text of
/// `char_len` characters.
///
/// For `char_len > overlap` this is `ceil((char_len - overlap) / step)`.
pub fn expected_chunk_count(char_len: usize, window: WindowConfig) -> usize {
    if char_len == 0 {
        0
    } else if char_len <= window.size {
        1
    } else {
        1 + (char_len - window.size).div_ceil(window.step())
    }
}

/// Validates the window and segments `text` in one call.
///
/// # Errors
///
/// Fails with a [`SegmentError`] when `size == 0` or `overlap >= size`.
pub fn segment(text: &str, size: usize, overlap: usize) -> Result<Vec<TextChunk>, SegmentError> {
    let window = WindowConfig::new(size, overlap)?;
    Ok(TextSegmenter::new(window).get_chunks(text))
}
