//! Integration tests covering the segment → build → load → retrieve path
//!
//! These tests verify that:
//! - Windowing produces the expected chunk lengths and overlaps
//! - A built index survives a round trip through the directory store
//! - Retrieval ranks the chunk a query was taken from first
//! - The index lifecycle (exists/build/clear) behaves as documented

use anyhow::Result;
use solaudit_context::{TextChunk, segment};
use solaudit_embed::{EmbedConfig, HashingProvider, provider_from_config};
use solaudit_retriever::retrieval::{
    ChunkingConfig, ChunkingStrategy, Document, Retriever, collect_documents, ingest, ingest_paths,
};
use solaudit_retriever::storage::{DirectoryStore, IndexStore};
use solaudit_retriever::{RetrieverError, Stage};
use std::fs;
use tempfile::tempdir;

/// Text of exactly `len` characters with no repeated word, so every window
/// has a distinct embedding.
fn distinct_text(len: usize) -> String {
    let mut text = String::new();
    let mut i = 0;
    while text.len() < len {
        text.push_str(&format!("t{i:05} "));
        i += 1;
    }
    text.truncate(len);
    text
}

fn lengths(chunks: &[TextChunk]) -> Vec<usize> {
    chunks.iter().map(|c| c.char_len()).collect()
}

#[test]
fn test_two_thousand_chars_end_to_end() -> Result<()> {
    let text = distinct_text(2000);
    let chunks = segment(&text, 1000, 200)?;
    assert_eq!(lengths(&chunks), vec![1000, 1000, 400]);

    let dir = tempdir()?;
    let store = DirectoryStore::new(dir.path().join("solaudit_index"));
    let embedder = HashingProvider::new(512)?;
    store.build(&chunks, &embedder)?;

    let retriever = Retriever::open(&store, HashingProvider::new(512)?)?;
    let hits = retriever.retrieve(&chunks[1].chunk_text, 4)?;

    assert_eq!(hits.len(), 3);
    assert_eq!(hits[0].row, 1);
    assert_eq!(hits[0].chunk, chunks[1]);
    assert!((hits[0].score - 1.0).abs() < 1e-2);
    Ok(())
}

#[test]
fn test_twenty_four_hundred_chars() -> Result<()> {
    let text = distinct_text(2400);
    let chunks = segment(&text, 1000, 200)?;
    assert_eq!(lengths(&chunks), vec![1000, 1000, 800]);

    // Consecutive chunks share exactly `overlap` characters
    for pair in chunks.windows(2) {
        let tail: String = pair[0].chunk_text.chars().skip(800).collect();
        let head: String = pair[1].chunk_text.chars().take(200).collect();
        assert_eq!(tail, head);
    }
    Ok(())
}

#[test]
fn test_lifecycle_and_missing_index() -> Result<()> {
    let dir = tempdir()?;
    let store = DirectoryStore::new(dir.path().join("solaudit_index"));
    let embedder = HashingProvider::new(64)?;

    assert!(!store.exists());
    let err = store.load().unwrap_err();
    assert!(matches!(err, RetrieverError::IndexNotFound { .. }));
    assert!(err.to_string().contains("build the index first"));

    store.build(&segment(&distinct_text(1500), 500, 100)?, &embedder)?;
    assert!(store.exists());

    store.clear()?;
    assert!(!store.exists());
    assert!(matches!(
        store.load(),
        Err(RetrieverError::IndexNotFound { .. })
    ));
    Ok(())
}

#[test]
fn test_rebuild_is_idempotent() -> Result<()> {
    let dir = tempdir()?;
    let store = DirectoryStore::new(dir.path().join("solaudit_index"));
    let embedder = HashingProvider::new(64)?;
    let chunks = segment(&distinct_text(3000), 1000, 200)?;

    let first = store.build(&chunks, &embedder)?;
    let second = store.build(&chunks, &embedder)?;
    assert_eq!(first.vectors(), second.vectors());
    assert_eq!(first.chunks(), second.chunks());
    assert_eq!(
        first.metadata().vectors_blake3,
        second.metadata().vectors_blake3
    );
    Ok(())
}

#[test]
fn test_ingest_directory_then_search() -> Result<()> {
    let corpus = tempdir()?;
    fs::write(
        corpus.path().join("Reentrancy.md"),
        "Reentrancy: an external call to msg.sender before the balance update lets the callee \
         re-enter withdraw and drain the vault.",
    )?;
    fs::write(
        corpus.path().join("Overflow.md"),
        "Integer overflow: unchecked arithmetic on uint256 wraps around in older compilers.",
    )?;
    fs::write(corpus.path().join("empty.txt"), "   ")?;

    let strategy = ChunkingStrategy::default();
    let files = collect_documents(&[corpus.path().to_path_buf()], &strategy)?;
    assert_eq!(files.len(), 3);

    let report = ingest_paths(&files, &strategy);
    assert_eq!(report.indexed_count(), 2);
    let failures: Vec<_> = report.failures().collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].1.stage(), Stage::Extract);

    let dir = tempdir()?;
    let store = DirectoryStore::new(dir.path().join("index"));
    let embedder = provider_from_config(&EmbedConfig::hashing(256))?;
    store.build(&report.chunks, embedder.as_ref())?;

    let retriever = Retriever::open(&store, embedder)?;
    let context = retriever.context_for("external call re-enter withdraw", 1)?;
    assert!(context.starts_with("Reentrancy"));
    Ok(())
}

#[test]
fn test_empty_corpus_is_refused() -> Result<()> {
    let report = ingest(
        &[Document::new("blank.sol", "\n\n")],
        &ChunkingStrategy::new(ChunkingConfig::default()),
    );
    assert!(report.chunks.is_empty());

    let dir = tempdir()?;
    let store = DirectoryStore::new(dir.path().join("index"));
    let err = store
        .build(&report.chunks, &HashingProvider::new(16)?)
        .unwrap_err();
    assert!(matches!(err, RetrieverError::EmptyInput { .. }));
    assert!(!store.exists());
    Ok(())
}
