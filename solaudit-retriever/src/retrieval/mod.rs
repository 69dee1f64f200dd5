pub mod chunking_strategy;
pub mod ingest;
pub mod retriever;

pub use chunking_strategy::{ChunkingConfig, ChunkingStrategy};
pub use ingest::{
    Document, DocumentOutcome, IngestReport, collect_documents, extract_text, ingest, ingest_paths,
};
pub use retriever::{CONTEXT_SEPARATOR, RetrievedChunk, Retriever};
