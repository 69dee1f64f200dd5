//! Prediction strategies: turn one labeled item into a free-text answer.

use crate::answering::AnsweringModel;
use crate::corpus::LabeledItem;
use crate::error::Result;
use solaudit_embed::EmbeddingProvider;
use solaudit_retriever::retrieval::Retriever;

/// Question asked about every contract when none is configured.
pub const DEFAULT_QUESTION: &str = "Is this contract vulnerable?";

/// Produces the raw answer for a benchmark item.
///
/// The harness only sees this trait, so it does not know whether retrieval
/// took place.
pub trait Predictor {
    fn predict(&self, item: &LabeledItem) -> Result<String>;
}

impl<F> Predictor for F
where
    F: Fn(&LabeledItem) -> Result<String>,
{
    fn predict(&self, item: &LabeledItem) -> Result<String> {
        self(item)
    }
}

fn question_with_code(question: &str, code: &str) -> String {
    format!("{question}\n\n{code}")
}

/// Asks the answering model about the item's code with no retrieved context.
pub struct DirectPredictor<A> {
    model: A,
    question: String,
}

impl<A: AnsweringModel> DirectPredictor<A> {
    pub fn new(model: A, question: impl Into<String>) -> Self {
        Self {
            model,
            question: question.into(),
        }
    }
}

impl<A: AnsweringModel> Predictor for DirectPredictor<A> {
    fn predict(&self, item: &LabeledItem) -> Result<String> {
        self.model
            .answer(&question_with_code(&self.question, &item.code), None)
    }
}

/// Retrieves the `top_k` chunks closest to the item's code and passes them
/// to the answering model as context.
pub struct RetrievalAugmentedPredictor<E, A> {
    retriever: Retriever<E>,
    model: A,
    question: String,
    top_k: usize,
}

impl<E: EmbeddingProvider, A: AnsweringModel> RetrievalAugmentedPredictor<E, A> {
    pub fn new(retriever: Retriever<E>, model: A, question: impl Into<String>, top_k: usize) -> Self {
        Self {
            retriever,
            model,
            question: question.into(),
            top_k,
        }
    }

    pub fn retriever(&self) -> &Retriever<E> {
        &self.retriever
    }
}

impl<E: EmbeddingProvider, A: AnsweringModel> Predictor for RetrievalAugmentedPredictor<E, A> {
    fn predict(&self, item: &LabeledItem) -> Result<String> {
        let context = self.retriever.context_for(&item.code, self.top_k)?;
        tracing::debug!("Item {}: {} bytes of context", item.id, context.len());
        self.model.answer(
            &question_with_code(&self.question, &item.code),
            Some(&context),
        )
    }
}
