//! Blocking client for OpenAI-compatible `/embeddings` endpoints.
//!
//! Works against OpenAI itself and against services exposing the same wire
//! format, such as DashScope's compatible mode.

use crate::config::EmbedConfig;
use crate::error::{EmbedError, Result};
use crate::provider::{EmbeddingProvider, EmbeddingResult, l2_normalize, to_f16};
use half::f16;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::thread;
use std::time::Duration;

/// Embedding provider that talks to an OpenAI-compatible HTTP endpoint.
#[derive(Clone)]
pub struct OpenAiCompatibleProvider {
    client: Client,
    endpoint: String,
    provider_name: String,
    model: String,
    dimension: usize,
    batch_size: usize,
    normalize: bool,
    max_retries: usize,
}

impl std::fmt::Debug for OpenAiCompatibleProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiCompatibleProvider")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("dimension", &self.dimension)
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

impl OpenAiCompatibleProvider {
    /// Builds a client from a validated configuration.
    pub fn new(config: &EmbedConfig) -> Result<Self> {
        config.validate()?;

        let api_key = config
            .api_key
            .as_deref()
            .ok_or_else(|| EmbedError::invalid_config("missing API key"))?;
        let base_url = config
            .base_url
            .as_deref()
            .ok_or_else(|| EmbedError::invalid_config("missing base_url"))?;
        let dimension = config
            .dimension
            .ok_or_else(|| EmbedError::invalid_config("missing dimension"))?;

        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth)
                .map_err(|_| EmbedError::invalid_config("API key is not a valid header value"))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", base_url.trim_end_matches('/')),
            provider_name: config.provider.as_str().to_string(),
            model: config.model_name.clone(),
            dimension,
            batch_size: config.batch_size,
            normalize: config.normalize,
            max_retries: config.max_retries.max(1),
        })
    }

    /// Sends one batch and returns the vectors in input order.
    fn embed_batch(&self, inputs: &[&str]) -> Result<Vec<Vec<f16>>> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let mut attempt = 0usize;
        loop {
            let request = EmbeddingRequest {
                model: &self.model,
                input: inputs,
            };
            let outcome = self.client.post(&self.endpoint).json(&request).send();
            match outcome {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        let mut parsed: EmbeddingResponse = resp.json()?;
                        parsed.data.sort_by_key(|entry| entry.index);
                        if parsed.data.len() != inputs.len() {
                            return Err(EmbedError::CountMismatch {
                                inputs: inputs.len(),
                                outputs: parsed.data.len(),
                            });
                        }
                        return parsed
                            .data
                            .into_iter()
                            .map(|entry| self.finish_vector(entry.embedding))
                            .collect();
                    }

                    let body = resp
                        .text()
                        .unwrap_or_else(|_| "<body unavailable>".to_string());
                    if should_retry(status) && attempt + 1 < self.max_retries {
                        attempt += 1;
                        tracing::warn!(
                            "Embedding request failed with {}, retrying (attempt {})",
                            status,
                            attempt
                        );
                        thread::sleep(retry_backoff(attempt));
                        continue;
                    }
                    return Err(EmbedError::Service {
                        status: status.as_u16(),
                        body,
                    });
                }
                Err(err) => {
                    if (err.is_timeout() || err.is_connect()) && attempt + 1 < self.max_retries {
                        attempt += 1;
                        tracing::warn!("Embedding request error: {}, retrying", err);
                        thread::sleep(retry_backoff(attempt));
                        continue;
                    }
                    return Err(err.into());
                }
            }
        }
    }

    fn finish_vector(&self, mut vector: Vec<f32>) -> Result<Vec<f16>> {
        if vector.len() != self.dimension {
            return Err(EmbedError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        if self.normalize {
            l2_normalize(&mut vector);
        }
        Ok(to_f16(&vector))
    }
}

impl EmbeddingProvider for OpenAiCompatibleProvider {
    fn embed_text(&self, text: &str) -> Result<Vec<f16>> {
        self.embed_batch(&[text])?
            .pop()
            .ok_or(EmbedError::CountMismatch {
                inputs: 1,
                outputs: 0,
            })
    }

    fn embed_texts(&self, texts: &[String]) -> Result<EmbeddingResult> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            let inputs: Vec<&str> = batch.iter().map(String::as_str).collect();
            embeddings.extend(self.embed_batch(&inputs)?);
            tracing::debug!("Embedded {}/{} texts", embeddings.len(), texts.len());
        }
        Ok(EmbeddingResult::new(embeddings))
    }

    fn embedding_dimension(&self) -> usize {
        self.dimension
    }

    fn provider_name(&self) -> &str {
        &self.provider_name
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

fn should_retry(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn retry_backoff(attempt: usize) -> Duration {
    let capped = attempt.min(5) as u32;
    Duration::from_millis(500 * (1 << capped))
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}
