//! Loading labeled benchmark items
//!
//! A corpus comes either as two directories (every file under the positive
//! directory is a vulnerable sample, every file under the negative one a safe
//! sample) or as a JSON array of `{ "id"?, "code", "label" }` objects.

use crate::error::{BenchError, Result};
use crate::label::Label;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// One benchmark sample with its ground truth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledItem {
    pub id: String,
    pub code: String,
    pub label: Label,
}

impl LabeledItem {
    pub fn new(id: impl Into<String>, code: impl Into<String>, label: Label) -> Self {
        Self {
            id: id.into(),
            code: code.into(),
            label,
        }
    }
}

#[derive(Deserialize)]
struct RawItem {
    id: Option<String>,
    code: String,
    label: String,
}

/// Every regular file under `dir`, sorted, hidden files and `.gitignore`d
/// paths excluded.
fn sample_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(BenchError::corpus(dir, "not a directory"));
    }
    let mut files: Vec<PathBuf> = ignore::WalkBuilder::new(dir)
        .hidden(true)
        .git_ignore(true)
        .build()
        .flatten()
        .filter(|e| e.file_type().is_some_and(|ft| ft.is_file()))
        .map(|e| e.into_path())
        .collect();
    files.sort();
    Ok(files)
}

fn read_samples(dir: &Path, label: Label) -> Result<Vec<LabeledItem>> {
    sample_files(dir)?
        .into_iter()
        .map(|path| -> Result<LabeledItem> {
            let code = fs::read_to_string(&path)
                .map_err(|e| BenchError::corpus(&path, e.to_string()))?;
            Ok(LabeledItem::new(path.display().to_string(), code, label))
        })
        .collect()
}

/// Load samples from a positive (vulnerable) and a negative (safe) directory.
///
/// Positive items come first, each group in path order.
pub fn load_labeled_dirs(positive: &Path, negative: &Path) -> Result<Vec<LabeledItem>> {
    let mut items = read_samples(positive, Label::Vulnerable)?;
    let positives = items.len();
    items.extend(read_samples(negative, Label::Safe)?);
    tracing::info!(
        "Loaded {} labeled items ({} vulnerable, {} safe)",
        items.len(),
        positives,
        items.len() - positives
    );
    Ok(items)
}

/// Load samples from a JSON array; items without an id get `item-<index>`.
pub fn load_json(path: &Path) -> Result<Vec<LabeledItem>> {
    let content = fs::read_to_string(path).map_err(|e| BenchError::corpus(path, e.to_string()))?;
    parse_json(&content).map_err(|message| BenchError::corpus(path, message))
}

fn parse_json(content: &str) -> std::result::Result<Vec<LabeledItem>, String> {
    let raw: Vec<RawItem> = serde_json::from_str(content).map_err(|e| e.to_string())?;
    raw.into_iter()
        .enumerate()
        .map(|(index, item)| -> std::result::Result<LabeledItem, String> {
            let label = item
                .label
                .parse::<Label>()
                .map_err(|e| format!("item {index}: {e}"))?;
            let id = item.id.unwrap_or_else(|| format!("item-{index}"));
            Ok(LabeledItem::new(id, item.code, label))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_labeled_dirs() {
        let dir = tempdir().unwrap();
        let positive = dir.path().join("vulnerable");
        let negative = dir.path().join("safe");
        fs::create_dir_all(&positive).unwrap();
        fs::create_dir_all(&negative).unwrap();
        fs::write(positive.join("b.sol"), "contract B {}").unwrap();
        fs::write(positive.join("a.sol"), "contract A {}").unwrap();
        fs::write(negative.join("c.sol"), "contract C {}").unwrap();

        let items = load_labeled_dirs(&positive, &negative).unwrap();
        let summary: Vec<(&str, Label)> = items
            .iter()
            .map(|i| (i.code.as_str(), i.label))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("contract A {}", Label::Vulnerable),
                ("contract B {}", Label::Vulnerable),
                ("contract C {}", Label::Safe),
            ]
        );
    }

    #[test]
    fn test_missing_directory() {
        let dir = tempdir().unwrap();
        let err = load_labeled_dirs(&dir.path().join("nope"), dir.path()).unwrap_err();
        assert!(matches!(err, BenchError::Corpus { .. }));
        assert!(err.to_string().starts_with("[corpus]"));
    }

    #[test]
    fn test_parse_json() {
        let items = parse_json(
            r#"[
                {"id": "reentrancy", "code": "contract R {}", "label": "vulnerable"},
                {"code": "contract S {}", "label": "无漏洞"}
            ]"#,
        )
        .unwrap();
        assert_eq!(items[0], LabeledItem::new("reentrancy", "contract R {}", Label::Vulnerable));
        assert_eq!(items[1], LabeledItem::new("item-1", "contract S {}", Label::Safe));
    }

    #[test]
    fn test_parse_json_rejects_unknown_label() {
        let err = parse_json(r#"[{"code": "x", "label": "unsure"}]"#).unwrap_err();
        assert!(err.contains("item 0"));
    }
}
