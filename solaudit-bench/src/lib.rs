//! # solaudit-bench
//!
//! Scores vulnerability predictions for smart contracts against labeled
//! samples. Each item's code is sent to an answering model (optionally with
//! context retrieved from the solaudit index), the free-text answer is mapped
//! to a [`Label`], and the harness reports accuracy plus per-item results.
//!
//! ## Quick Start
//!
//! ```
//! use solaudit_bench::{BenchmarkHarness, KeywordClassifier, Label, LabeledItem};
//!
//! let items = vec![
//!     LabeledItem::new("reentrancy.sol", "msg.sender.call{value: amount}(\"\");", Label::Vulnerable),
//!     LabeledItem::new("pull.sol", "balances[msg.sender] = 0;", Label::Safe),
//! ];
//! let predictor = |item: &LabeledItem| -> solaudit_bench::Result<String> {
//!     Ok(if item.code.contains("call") { "vulnerable to reentrancy" } else { "no issues" }.to_string())
//! };
//!
//! let harness = BenchmarkHarness::new(KeywordClassifier::default());
//! let result = harness.run(&items, &predictor)?;
//! assert_eq!(result.correct, 2);
//! assert_eq!(result.accuracy_percent, 100.0);
//! # Ok::<(), solaudit_bench::BenchError>(())
//! ```
//!
//! ## Strategies
//!
//! - [`RetrievalAugmentedPredictor`]: retrieves the chunks nearest to the code
//!   and passes them as context
//! - [`DirectPredictor`]: asks about the code alone
//!
//! Both go through the [`Predictor`] trait, and the answer-to-label rule is the
//! swappable [`LabelClassifier`].

pub mod answering;
pub mod config;
pub mod corpus;
pub mod error;
pub mod harness;
pub mod label;
pub mod predictor;

pub use answering::{AnsweringModel, ChatCompletionsConfig, ChatCompletionsModel};
pub use config::{BenchConfig, Strategy};
pub use corpus::{LabeledItem, load_json, load_labeled_dirs};
pub use error::{BenchError, Result};
pub use harness::{BenchmarkHarness, BenchmarkResult, Prediction};
pub use label::{KeywordClassifier, Label, LabelClassifier};
pub use predictor::{DirectPredictor, Predictor, RetrievalAugmentedPredictor};
