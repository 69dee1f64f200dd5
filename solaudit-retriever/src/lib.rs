//! solaudit-retriever: build, persist and query a vector index of audit material
//!
//! Documents (Solidity sources, audit reports, PDFs) are segmented into
//! overlapping character windows, embedded, and stored as a single index
//! directory. A [`Retriever`](retrieval::Retriever) bound to the same
//! embedder returns the chunks nearest to a query.
//!
//! ## Key Modules
//!
//! - **[`retrieval`]**: Document ingestion, chunking strategy and the retriever
//! - **[`storage`]**: The `IndexStore` trait and its directory-backed implementation
//! - **[`config`]**: `solaudit.toml` parsing
//! - **[`error`]**: `RetrieverError` and the pipeline `Stage` it names
//!
//! ## Quick Start
//!
//! ```rust
//! use solaudit_context::segment;
//! use solaudit_embed::HashingProvider;
//! use solaudit_retriever::retrieval::Retriever;
//! use solaudit_retriever::storage::{DirectoryStore, IndexStore};
//!
//! # fn main() -> anyhow::Result<()> {
//! let dir = tempfile::tempdir()?;
//! let store = DirectoryStore::new(dir.path().join("index"));
//! let chunks = segment("function withdraw() external { msg.sender.call{value: amount}(\"\"); }", 1000, 200)?;
//!
//! store.build(&chunks, &HashingProvider::new(64)?)?;
//! let retriever = Retriever::open(&store, HashingProvider::new(64)?)?;
//! let hits = retriever.retrieve("withdraw", 4)?;
//! assert_eq!(hits.len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Files → Ingest → ChunkingStrategy → Embeddings → DirectoryStore
//!                                                      ↓
//!                      Query → Embedding → Retriever ← VectorIndex
//! ```

pub mod config;
pub mod error;
pub mod retrieval;
pub mod storage;

pub use error::{Result, RetrieverError, Stage};
