//! The answering collaborator: question (plus optional context) in, free text out.

use crate::error::{BenchError, Result};
use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use solaudit_retriever::Stage;
use std::time::Duration;

/// Base URL of the DeepSeek API.
pub const DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com";

/// Chat model used when none is configured.
pub const DEFAULT_CHAT_MODEL: &str = "deepseek-chat";

/// Instructions sent as the system message of every request.
pub const SYSTEM_PROMPT: &str = "You are an AI assistant. Answer the question using the provided \
context and include every relevant detail. If the answer is not in the context, say \"the answer \
is not in the context\" instead of giving a wrong answer.";

/// Something that answers questions, optionally grounded in retrieved context.
pub trait AnsweringModel {
    fn answer(&self, question: &str, context: Option<&str>) -> Result<String>;
}

impl<T: AnsweringModel + ?Sized> AnsweringModel for Box<T> {
    fn answer(&self, question: &str, context: Option<&str>) -> Result<String> {
        (**self).answer(question, context)
    }
}

/// Settings for [`ChatCompletionsModel`]. The API key is passed in resolved.
#[derive(Clone)]
pub struct ChatCompletionsConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: String,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl std::fmt::Debug for ChatCompletionsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionsConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .field("temperature", &self.temperature)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl ChatCompletionsConfig {
    /// DeepSeek `deepseek-chat` with deterministic sampling.
    pub fn deepseek(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEEPSEEK_BASE_URL.to_string(),
            model: DEFAULT_CHAT_MODEL.to_string(),
            api_key: api_key.into(),
            temperature: 0.0,
            timeout_secs: 60,
        }
    }
}

/// Blocking client for OpenAI-compatible `/chat/completions` endpoints.
pub struct ChatCompletionsModel {
    client: Client,
    endpoint: String,
    model: String,
    temperature: f32,
}

impl ChatCompletionsModel {
    pub fn new(config: &ChatCompletionsConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(BenchError::config(Stage::Answer, "missing API key"));
        }
        if config.model.trim().is_empty() {
            return Err(BenchError::config(Stage::Answer, "model must not be empty"));
        }

        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {}", config.api_key.trim()))
            .map_err(|_| BenchError::config(Stage::Answer, "API key is not a valid header value"))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl AnsweringModel for ChatCompletionsModel {
    fn answer(&self, question: &str, context: Option<&str>) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: build_messages(question, context),
            temperature: self.temperature,
        };

        tracing::debug!("Sending chat request to {}", self.endpoint);
        let resp = self.client.post(&self.endpoint).json(&request).send()?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp
                .text()
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(BenchError::AnsweringService {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = resp.json()?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| BenchError::AnsweringService {
                status: status.as_u16(),
                body: "response contained no answer".to_string(),
            })
    }
}

/// System prompt followed by one user message carrying context and question.
fn build_messages(question: &str, context: Option<&str>) -> Vec<ChatMessage> {
    let user = match context {
        Some(context) => format!("Context:\n{context}\n\nQuestion:\n{question}"),
        None => question.to_string(),
    };
    vec![
        ChatMessage {
            role: "system".to_string(),
            content: Some(SYSTEM_PROMPT.to_string()),
        },
        ChatMessage {
            role: "user".to_string(),
            content: Some(user),
        },
    ]
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}
