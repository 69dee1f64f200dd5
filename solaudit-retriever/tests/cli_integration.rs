use anyhow::Result;
use std::fs;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Helper to run the CLI binary against an index inside `temp_dir`
fn run_cli(temp_dir: &TempDir, args: &[&str]) -> Result<Output> {
    let output = Command::new(env!("CARGO_BIN_EXE_solaudit-retriever"))
        .current_dir(temp_dir.path())
        .arg("--index")
        .arg(temp_dir.path().join("index"))
        .args(args)
        .output()?;
    Ok(output)
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Helper to write a small corpus of audit notes
fn populate_corpus(temp_dir: &TempDir) -> Result<()> {
    let corpus = temp_dir.path().join("corpus");
    fs::create_dir_all(&corpus)?;
    fs::write(
        corpus.join("reentrancy.md"),
        "External calls made before state updates allow reentrancy into withdraw.",
    )?;
    fs::write(
        corpus.join("access.md"),
        "Functions missing onlyOwner let anyone change the fee recipient.",
    )?;
    Ok(())
}

#[test]
fn test_status_without_index() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let output = run_cli(&temp_dir, &["status"])?;
    assert!(output.status.success());
    assert!(stdout(&output).contains("No index at"));
    Ok(())
}

#[test]
fn test_search_without_index_fails() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let output = run_cli(&temp_dir, &["search", "reentrancy"])?;
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("build the index first"));
    Ok(())
}

#[test]
fn test_build_search_clear() -> Result<()> {
    let temp_dir = TempDir::new()?;
    populate_corpus(&temp_dir)?;

    let output = run_cli(&temp_dir, &["build", "corpus"])?;
    assert!(
        output.status.success(),
        "build failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(stdout(&output).contains("Indexed 2 chunks from 2/2 documents"));

    let output = run_cli(
        &temp_dir,
        &["search", "reentrancy into withdraw", "-k", "1", "--format", "json"],
    )?;
    assert!(output.status.success());
    let hits: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    let hits = hits.as_array().expect("search output is a JSON array");
    assert_eq!(hits.len(), 1);
    assert!(
        hits[0]["chunk"]["source"]
            .as_str()
            .unwrap()
            .ends_with("reentrancy.md")
    );

    let output = run_cli(&temp_dir, &["status", "--format", "json"])?;
    let status: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(status["chunk_count"], 2);
    assert_eq!(status["provider"], "hashing");

    let output = run_cli(&temp_dir, &["clear"])?;
    assert!(output.status.success());
    assert!(!temp_dir.path().join("index").exists());
    Ok(())
}

#[test]
fn test_invalid_window_is_rejected() -> Result<()> {
    let temp_dir = TempDir::new()?;
    populate_corpus(&temp_dir)?;
    let output = run_cli(
        &temp_dir,
        &["build", "corpus", "--size", "100", "--overlap", "100"],
    )?;
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("[segment]"));
    Ok(())
}
