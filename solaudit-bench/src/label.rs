//! Ground-truth labels and turning free-text answers into labels

use crate::error::{BenchError, Result};
use serde::{Deserialize, Serialize};
use solaudit_retriever::Stage;

/// Default keyword whose presence marks an answer as a positive verdict.
pub const DEFAULT_POSITIVE_KEYWORD: &str = "vulnerable";

/// Verdict for a contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Vulnerable,
    Safe,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Vulnerable => "vulnerable",
            Label::Safe => "safe",
        }
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Label {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "vulnerable" | "positive" | "有漏洞" => Ok(Label::Vulnerable),
            "safe" | "negative" | "无漏洞" => Ok(Label::Safe),
            other => Err(format!("unknown label '{other}'")),
        }
    }
}

/// Maps a free-text answer to a [`Label`].
pub trait LabelClassifier {
    fn classify(&self, answer: &str) -> Label;
}

impl<F> LabelClassifier for F
where
    F: Fn(&str) -> Label,
{
    fn classify(&self, answer: &str) -> Label {
        self(answer)
    }
}

/// Case-sensitive substring test: the keyword anywhere in the answer means
/// [`Label::Vulnerable`], otherwise [`Label::Safe`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordClassifier {
    keyword: String,
}

impl KeywordClassifier {
    pub fn new(keyword: impl Into<String>) -> Result<Self> {
        let keyword = keyword.into();
        if keyword.is_empty() {
            return Err(BenchError::config(
                Stage::Classify,
                "positive keyword must not be empty",
            ));
        }
        Ok(Self { keyword })
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self {
            keyword: DEFAULT_POSITIVE_KEYWORD.to_string(),
        }
    }
}

impl LabelClassifier for KeywordClassifier {
    fn classify(&self, answer: &str) -> Label {
        if answer.contains(&self.keyword) {
            Label::Vulnerable
        } else {
            Label::Safe
        }
    }
}
