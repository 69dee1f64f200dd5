//! Turning files into chunks ready for indexing.
//!
//! Plain-text files are read as UTF-8, PDFs go through `pdf-extract`. A
//! document that yields no text is reported on its own and does not stop
//! the others.

use super::chunking_strategy::ChunkingStrategy;
use crate::error::{Result, RetrieverError, Stage};
use solaudit_context::TextChunk;
use std::fs;
use std::path::{Path, PathBuf};

/// A source document held only while it is being ingested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: String,
    pub text: String,
}

impl Document {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }

    /// Read a document from disk, using the path as its id.
    pub fn from_path(path: &Path) -> Result<Self> {
        let id = path.display().to_string();
        let text = extract_text(path)?;
        Ok(Self { id, text })
    }

    /// True when there is no non-whitespace text to index.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Extract the text of a file; `.pdf` files are parsed, everything else is
/// read as UTF-8.
pub fn extract_text(path: &Path) -> Result<String> {
    let is_pdf = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

    if is_pdf {
        return pdf_extract::extract_text(path).map_err(|e| RetrieverError::Extraction {
            document: path.display().to_string(),
            message: e.to_string(),
        });
    }

    let bytes = fs::read(path).map_err(|e| RetrieverError::io(Stage::Extract, path, e))?;
    String::from_utf8(bytes).map_err(|_| RetrieverError::Extraction {
        document: path.display().to_string(),
        message: "file is not valid UTF-8 text".to_string(),
    })
}

/// Expand `paths` into the list of files to ingest.
///
/// Files named explicitly are always included. Directories are walked with
/// `.gitignore` rules applied and filtered through
/// [`ChunkingStrategy::should_index_file`]. The result is sorted and free of
/// duplicates so repeated builds see the same row order.
pub fn collect_documents(paths: &[PathBuf], strategy: &ChunkingStrategy) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        let metadata =
            fs::metadata(path).map_err(|e| RetrieverError::io(Stage::Extract, path, e))?;
        if metadata.is_file() {
            files.push(path.clone());
            continue;
        }

        let mut found: Vec<PathBuf> = ignore::WalkBuilder::new(path)
            .hidden(true)
            .git_ignore(true)
            .build()
            .flatten()
            .filter(|e| e.file_type().is_some_and(|ft| ft.is_file()))
            .map(|e| e.into_path())
            .filter(|p| strategy.should_index_file(p))
            .collect();
        found.sort();
        tracing::debug!("Found {} files under {}", found.len(), path.display());
        files.extend(found);
    }

    let mut seen = std::collections::HashSet::new();
    files.retain(|p| seen.insert(p.clone()));
    Ok(files)
}

/// What happened to one document during ingestion.
#[derive(Debug)]
pub struct DocumentOutcome {
    pub document: String,
    /// Number of chunks produced, or why the document was skipped
    pub result: std::result::Result<usize, RetrieverError>,
}

/// Per-document outcomes plus every chunk produced, in document order.
#[derive(Debug, Default)]
pub struct IngestReport {
    pub outcomes: Vec<DocumentOutcome>,
    pub chunks: Vec<TextChunk>,
}

impl IngestReport {
    /// Documents that contributed chunks.
    pub fn indexed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    /// Documents that were skipped, with the reason.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &RetrieverError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.document.as_str(), e)))
    }

    fn record(&mut self, document: String, chunks: Result<Vec<TextChunk>>) {
        let result = match chunks {
            Ok(chunks) => {
                let count = chunks.len();
                self.chunks.extend(chunks);
                Ok(count)
            }
            Err(e) => {
                tracing::warn!("Skipping {}: {}", document, e);
                Err(e)
            }
        };
        self.outcomes.push(DocumentOutcome { document, result });
    }
}

fn chunk_document(document: &Document, strategy: &ChunkingStrategy) -> Result<Vec<TextChunk>> {
    if document.is_blank() {
        return Err(RetrieverError::EmptyInput {
            stage: Stage::Extract,
            document: format!("{} has no extractable text", document.id),
        });
    }
    Ok(strategy.chunk_content(&document.id, &document.text))
}

/// Segment documents that are already in memory.
pub fn ingest(documents: &[Document], strategy: &ChunkingStrategy) -> IngestReport {
    let mut report = IngestReport::default();
    for document in documents {
        report.record(document.id.clone(), chunk_document(document, strategy));
    }
    report
}

/// Read and segment files; unreadable or empty files are recorded and skipped.
pub fn ingest_paths(files: &[PathBuf], strategy: &ChunkingStrategy) -> IngestReport {
    let mut report = IngestReport::default();
    for path in files {
        let chunks = Document::from_path(path).and_then(|doc| chunk_document(&doc, strategy));
        report.record(path.display().to_string(), chunks);
    }
    tracing::info!(
        "Ingested {}/{} documents into {} chunks",
        report.indexed_count(),
        files.len(),
        report.chunks.len()
    );
    report
}
