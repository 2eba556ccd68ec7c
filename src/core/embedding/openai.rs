//! OpenAI-compatible embeddings client.
//!
//! Sends `POST {base_url}/embeddings` with `{model, input}` and reads
//! `data[].embedding`, reordered by `data[].index`. Server errors,
//! rate limiting and transport failures are retried with exponential
//! backoff; other client errors fail immediately.

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use tracing::{debug, error, warn};
use url::Url;

use super::{check_vectors, Embedder};
use crate::core::config::EmbeddingConfig;
use crate::core::error::{CourseAlignError, Result};

const EXPONENTIAL_BACKOFF_BASE: u32 = 2;
const MAX_BACKOFF_DELAY: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct OpenAiEmbedder {
    endpoint: Url,
    model: String,
    api_key: Option<String>,
    batch_size: usize,
    agent: ureq::Agent,
    retry_attempts: u32,
    retry_base_delay: Duration,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

impl OpenAiEmbedder {
    /// Create a client from the `[embedding]` config section
    ///
    /// The API key is read from the variable named by `api_key_env`.
    /// A missing key is allowed for local OpenAI-compatible servers.
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self> {
        let api_key = env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty());
        if api_key.is_none() {
            warn!(
                "{} is not set, embedding requests will be sent without credentials",
                config.api_key_env
            );
        }

        let mut client = Self::new(&config.base_url, &config.model, api_key)?
            .with_timeout(config.timeout())
            .with_retry(config.retry_attempts, config.retry_base_delay());
        client.batch_size = config.batch_size.max(1);
        Ok(client)
    }

    pub fn new(base_url: &str, model: &str, api_key: Option<String>) -> Result<Self> {
        let base = Url::parse(base_url).map_err(|e| {
            CourseAlignError::ConfigError(format!("Invalid embedding base_url '{base_url}': {e}"))
        })?;
        let endpoint = Url::parse(&format!("{}/embeddings", base.as_str().trim_end_matches('/')))
            .map_err(|e| {
                CourseAlignError::ConfigError(format!("Failed to build embeddings URL: {e}"))
            })?;

        let defaults = EmbeddingConfig::default();
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(defaults.timeout()))
            .build()
            .into();

        Ok(Self {
            endpoint,
            model: model.to_string(),
            api_key,
            batch_size: defaults.batch_size,
            agent,
            retry_attempts: defaults.retry_attempts,
            retry_base_delay: defaults.retry_base_delay(),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        self
    }

    pub fn with_retry(mut self, attempts: u32, base_delay: Duration) -> Self {
        self.retry_attempts = attempts.max(1);
        self.retry_base_delay = base_delay;
        self
    }

    /// Delay after failed `attempt` (1-based), capped at one minute
    fn backoff_delay(&self, attempt: u32) -> Duration {
        EXPONENTIAL_BACKOFF_BASE
            .checked_pow(attempt.saturating_sub(1))
            .and_then(|factor| self.retry_base_delay.checked_mul(factor))
            .map_or(MAX_BACKOFF_DELAY, |delay| delay.min(MAX_BACKOFF_DELAY))
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn embed_single_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let request = EmbeddingRequest {
            model: &self.model,
            input: texts,
        };
        let request_json = serde_json::to_string(&request)?;

        let response_text = self.make_request_with_retry(|| {
            let mut builder = self
                .agent
                .post(self.endpoint.as_str())
                .header("Content-Type", "application/json");
            if let Some(key) = &self.api_key {
                builder = builder.header("Authorization", format!("Bearer {key}"));
            }
            builder
                .send(&request_json)
                .and_then(|mut resp| resp.body_mut().read_to_string())
        })?;

        let mut response: EmbeddingResponse =
            serde_json::from_str(&response_text).map_err(|e| {
                CourseAlignError::Embedding(format!("Failed to parse embedding response: {e}"))
            })?;

        response.data.sort_by_key(|d| d.index);
        for (position, item) in response.data.iter().enumerate() {
            if item.index != position {
                return Err(CourseAlignError::Embedding(format!(
                    "Embedding response indices are not 0..{}",
                    texts.len()
                )));
            }
        }

        let vectors: Vec<Vec<f32>> = response.data.into_iter().map(|d| d.embedding).collect();
        check_vectors(&vectors, texts.len())?;
        Ok(vectors)
    }

    fn make_request_with_retry<F>(&self, mut request_fn: F) -> Result<String>
    where
        F: FnMut() -> std::result::Result<String, ureq::Error>,
    {
        let mut last_error = None;

        for attempt in 1..=self.retry_attempts {
            debug!("Embedding request attempt {}/{}", attempt, self.retry_attempts);

            match request_fn() {
                Ok(response_text) => return Ok(response_text),
                Err(error) => {
                    let should_retry = match &error {
                        ureq::Error::StatusCode(status) if *status >= 500 || *status == 429 => {
                            warn!(
                                "Embedding provider returned HTTP {}, attempt {}/{}",
                                status, attempt, self.retry_attempts
                            );
                            true
                        }
                        ureq::Error::StatusCode(status) => {
                            warn!("Client error (status {}), not retrying", status);
                            return Err(CourseAlignError::Embedding(format!(
                                "Client error: HTTP {status}"
                            )));
                        }
                        ureq::Error::ConnectionFailed
                        | ureq::Error::HostNotFound
                        | ureq::Error::Timeout(_)
                        | ureq::Error::Io(_) => {
                            warn!(
                                "Transport error: {}, attempt {}/{}",
                                error, attempt, self.retry_attempts
                            );
                            true
                        }
                        _ => false,
                    };

                    if !should_retry {
                        return Err(CourseAlignError::Embedding(format!(
                            "Non-retryable error: {error}"
                        )));
                    }

                    last_error = Some(error.to_string());

                    if attempt < self.retry_attempts {
                        let delay = self.backoff_delay(attempt);
                        debug!("Waiting {:?} before retry", delay);
                        std::thread::sleep(delay);
                    }
                }
            }
        }

        error!("All retry attempts failed for {}", self.endpoint);
        Err(CourseAlignError::Embedding(format!(
            "Request failed after {} attempts: {}",
            self.retry_attempts,
            last_error.unwrap_or_else(|| "unknown error".to_string())
        )))
    }
}

impl Embedder for OpenAiEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            vectors.extend(self.embed_single_batch(batch)?);
        }
        Ok(vectors)
    }
}
