//! Runs a predictor over labeled items and scores the answers.

use crate::corpus::LabeledItem;
use crate::error::{BenchError, Result};
use crate::label::{Label, LabelClassifier};
use crate::predictor::Predictor;
use serde::Serialize;

/// Outcome for a single item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub item_id: String,
    pub actual: Label,
    pub predicted: Label,
    pub raw_answer: String,
}

impl Prediction {
    pub fn is_correct(&self) -> bool {
        self.actual == self.predicted
    }
}

/// Aggregate score of a run, with per-item predictions in input order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkResult {
    pub total: usize,
    pub correct: usize,
    pub accuracy_percent: f64,
    pub predictions: Vec<Prediction>,
}

impl BenchmarkResult {
    fn from_predictions(predictions: Vec<Prediction>) -> Self {
        let total = predictions.len();
        let correct = predictions.iter().filter(|p| p.is_correct()).count();
        let accuracy_percent = if total == 0 {
            0.0
        } else {
            100.0 * correct as f64 / total as f64
        };
        Self {
            total,
            correct,
            accuracy_percent,
            predictions,
        }
    }
}

/// Classifies predictor answers and compares them with ground truth.
pub struct BenchmarkHarness<C> {
    classifier: C,
}

impl<C: LabelClassifier> BenchmarkHarness<C> {
    pub fn new(classifier: C) -> Self {
        Self { classifier }
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    /// Predict every item in order. The first predictor error stops the run.
    pub fn run(&self, items: &[LabeledItem], predictor: &dyn Predictor) -> Result<BenchmarkResult> {
        tracing::info!("Running benchmark over {} items", items.len());

        let mut predictions = Vec::with_capacity(items.len());
        for (position, item) in items.iter().enumerate() {
            let raw_answer = predictor
                .predict(item)
                .map_err(|e| BenchError::Prediction {
                    item_id: item.id.clone(),
                    source: Box::new(e),
                })?;
            let predicted = self.classifier.classify(&raw_answer);
            tracing::debug!(
                "[{}/{}] {}: actual={} predicted={}",
                position + 1,
                items.len(),
                item.id,
                item.label,
                predicted
            );
            predictions.push(Prediction {
                item_id: item.id.clone(),
                actual: item.label,
                predicted,
                raw_answer,
            });
        }

        let result = BenchmarkResult::from_predictions(predictions);
        tracing::info!(
            "Benchmark finished: {}/{} correct ({:.1}%)",
            result.correct,
            result.total,
            result.accuracy_percent
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::KeywordClassifier;
    use solaudit_retriever::Stage;
    use tracing_test::traced_test;

    fn items() -> Vec<LabeledItem> {
        vec![
            LabeledItem::new("p1", "reentrancy", Label::Vulnerable),
            LabeledItem::new("n1", "checks-effects", Label::Safe),
            LabeledItem::new("p2", "tx.origin", Label::Vulnerable),
        ]
    }

    fn oracle(item: &LabeledItem) -> Result<String> {
        Ok(match item.label {
            Label::Vulnerable => "this is vulnerable".to_string(),
            Label::Safe => "looks fine".to_string(),
        })
    }

    #[test]
    fn test_empty_run() {
        let harness = BenchmarkHarness::new(KeywordClassifier::default());
        let result = harness.run(&[], &oracle).unwrap();
        assert_eq!(result.total, 0);
        assert_eq!(result.correct, 0);
        assert_eq!(result.accuracy_percent, 0.0);
        assert!(result.predictions.is_empty());
    }

    #[test]
    fn test_order_independent_counts() {
        let harness = BenchmarkHarness::new(KeywordClassifier::default());
        // wrong on n1 only
        let predictor = |_: &LabeledItem| -> Result<String> { Ok("vulnerable".to_string()) };

        let forward = harness.run(&items(), &predictor).unwrap();
        let mut reversed_items = items();
        reversed_items.reverse();
        let reversed = harness.run(&reversed_items, &predictor).unwrap();

        assert_eq!(forward.correct, 2);
        assert_eq!(forward.correct, reversed.correct);
        assert_eq!(forward.accuracy_percent, reversed.accuracy_percent);
        assert_eq!(forward.predictions[0].item_id, "p1");
        assert_eq!(reversed.predictions[0].item_id, "p2");
    }

    #[test]
    fn test_predictions_keep_raw_answers() {
        let harness = BenchmarkHarness::new(KeywordClassifier::default());
        let result = harness.run(&items(), &oracle).unwrap();
        assert_eq!(result.correct, 3);
        assert_eq!(result.accuracy_percent, 100.0);
        assert_eq!(result.predictions[1].raw_answer, "looks fine");
        assert!(result.predictions.iter().all(Prediction::is_correct));
    }

    #[test]
    fn test_failure_aborts_run() {
        let harness = BenchmarkHarness::new(KeywordClassifier::default());
        let predictor = |item: &LabeledItem| -> Result<String> {
            if item.id == "n1" {
                Err(BenchError::AnsweringService {
                    status: 503,
                    body: "unavailable".to_string(),
                })
            } else {
                Ok("vulnerable".to_string())
            }
        };

        let err = harness.run(&items(), &predictor).unwrap_err();
        assert!(matches!(&err, BenchError::Prediction { item_id, .. } if item_id == "n1"));
        assert_eq!(err.stage(), Stage::Answer);
    }

    #[test]
    fn test_swapped_classifier() {
        let harness = BenchmarkHarness::new(|answer: &str| {
            if answer.starts_with("looks") {
                Label::Safe
            } else {
                Label::Vulnerable
            }
        });
        let result = harness.run(&items(), &oracle).unwrap();
        assert_eq!(result.correct, 3);
    }

    #[traced_test]
    #[test]
    fn test_run_logs_summary() {
        let harness = BenchmarkHarness::new(KeywordClassifier::default());
        harness.run(&items(), &oracle).unwrap();
        assert!(logs_contain("Benchmark finished: 3/3 correct"));
    }
}
