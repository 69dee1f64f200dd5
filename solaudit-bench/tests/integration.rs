//! Integration tests for the benchmark harness and both prediction strategies

use solaudit_bench::{
    AnsweringModel, BenchError, BenchmarkHarness, DirectPredictor, KeywordClassifier, Label,
    LabeledItem, Predictor, Result, RetrievalAugmentedPredictor, load_labeled_dirs,
};
use solaudit_context::WindowConfig;
use solaudit_embed::HashingProvider;
use solaudit_retriever::retrieval::{ChunkingConfig, ChunkingStrategy, Document, Retriever, ingest};
use solaudit_retriever::storage::{DirectoryStore, IndexStore};
use solaudit_retriever::{RetrieverError, Stage};
use std::fs;
use tempfile::tempdir;

fn three_positive_two_negative() -> Vec<LabeledItem> {
    vec![
        LabeledItem::new("p1", "contract P1 {}", Label::Vulnerable),
        LabeledItem::new("p2", "contract P2 {}", Label::Vulnerable),
        LabeledItem::new("p3", "contract P3 {}", Label::Vulnerable),
        LabeledItem::new("n1", "contract N1 {}", Label::Safe),
        LabeledItem::new("n2", "contract N2 {}", Label::Safe),
    ]
}

#[test]
fn test_all_correct() {
    let harness = BenchmarkHarness::new(KeywordClassifier::default());
    let predictor = |item: &LabeledItem| -> Result<String> {
        Ok(match item.label {
            Label::Vulnerable => "The contract is vulnerable to reentrancy.".to_string(),
            Label::Safe => "No issues found.".to_string(),
        })
    };

    let result = harness
        .run(&three_positive_two_negative(), &predictor)
        .unwrap();
    assert_eq!(result.correct, 5);
    assert_eq!(result.total, 5);
    assert_eq!(result.accuracy_percent, 100.0);
}

#[test]
fn test_one_positive_missed() {
    let harness = BenchmarkHarness::new(KeywordClassifier::default());
    let predictor = |item: &LabeledItem| -> Result<String> {
        Ok(match (item.label, item.id.as_str()) {
            (Label::Vulnerable, "p2") => "No issues found.".to_string(),
            (Label::Vulnerable, _) => "vulnerable".to_string(),
            (Label::Safe, _) => "No issues found.".to_string(),
        })
    };

    let result = harness
        .run(&three_positive_two_negative(), &predictor)
        .unwrap();
    assert_eq!(result.correct, 4);
    assert_eq!(result.total, 5);
    assert_eq!(result.accuracy_percent, 80.0);

    let missed: Vec<&str> = result
        .predictions
        .iter()
        .filter(|p| !p.is_correct())
        .map(|p| p.item_id.as_str())
        .collect();
    assert_eq!(missed, vec!["p2"]);
}

#[test]
fn test_empty_item_list() {
    let harness = BenchmarkHarness::new(KeywordClassifier::default());
    let predictor = |_: &LabeledItem| -> Result<String> { Ok(String::new()) };
    let result = harness.run(&[], &predictor).unwrap();
    assert_eq!(result.total, 0);
    assert_eq!(result.accuracy_percent, 0.0);
}

#[test]
fn test_items_from_directories() {
    let dir = tempdir().unwrap();
    let positive = dir.path().join("positive");
    let negative = dir.path().join("negative");
    fs::create_dir_all(&positive).unwrap();
    fs::create_dir_all(&negative).unwrap();
    for i in 0..3 {
        fs::write(positive.join(format!("v{i}.sol")), "tx.origin == owner").unwrap();
    }
    for i in 0..2 {
        fs::write(negative.join(format!("s{i}.sol")), "msg.sender == owner").unwrap();
    }

    let items = load_labeled_dirs(&positive, &negative).unwrap();
    let harness = BenchmarkHarness::new(KeywordClassifier::default());
    let predictor = |item: &LabeledItem| -> Result<String> {
        Ok(if item.code.contains("tx.origin") {
            "vulnerable: tx.origin authentication".to_string()
        } else {
            "safe".to_string()
        })
    };

    let result = harness.run(&items, &predictor).unwrap();
    assert_eq!((result.correct, result.total), (5, 5));
}

/// Answers "vulnerable" when the context mentions reentrancy, and fails
/// when no context was supplied.
struct ContextEcho;

impl AnsweringModel for ContextEcho {
    fn answer(&self, _question: &str, context: Option<&str>) -> Result<String> {
        match context {
            Some(context) if context.contains("reentrancy") => {
                Ok("vulnerable: see reentrancy guidance".to_string())
            }
            Some(_) => Ok("no known pattern applies".to_string()),
            None => Err(BenchError::answering(std::io::Error::other("no context"))),
        }
    }
}

#[test]
fn test_retrieval_augmented_predictor() {
    let dir = tempdir().unwrap();
    let store = DirectoryStore::new(dir.path().join("index"));
    let strategy = ChunkingStrategy::new(ChunkingConfig::new(WindowConfig::default()));
    let report = ingest(
        &[
            Document::new(
                "reentrancy.md",
                "reentrancy withdraw external call before balance update",
            ),
            Document::new("rounding.md", "rounding division precision loss fee"),
        ],
        &strategy,
    );
    store
        .build(&report.chunks, &HashingProvider::new(256).unwrap())
        .unwrap();

    let retriever = Retriever::open(&store, HashingProvider::new(256).unwrap()).unwrap();
    let predictor = RetrievalAugmentedPredictor::new(retriever, ContextEcho, "Is this contract vulnerable?", 1);

    let items = vec![
        LabeledItem::new("bank", "withdraw external call before balance update", Label::Vulnerable),
        LabeledItem::new("fees", "division precision fee", Label::Safe),
    ];
    let harness = BenchmarkHarness::new(KeywordClassifier::default());
    let result = harness.run(&items, &predictor).unwrap();
    assert_eq!(result.correct, 2);
    assert_eq!(result.accuracy_percent, 100.0);
}

#[test]
fn test_direct_predictor_never_retrieves() {
    let predictor = DirectPredictor::new(ContextEcho, "Is this contract vulnerable?");
    let item = LabeledItem::new("bank", "withdraw", Label::Vulnerable);
    let err = predictor.predict(&item).unwrap_err();
    assert_eq!(err.stage(), Stage::Answer);
}

#[test]
fn test_rag_without_index_points_to_build() {
    let dir = tempdir().unwrap();
    let store = DirectoryStore::new(dir.path().join("missing"));
    let err = Retriever::open(&store, HashingProvider::new(256).unwrap())
        .err()
        .unwrap();
    assert!(matches!(err, RetrieverError::IndexNotFound { .. }));
    assert!(err.to_string().contains("build the index first"));
}
