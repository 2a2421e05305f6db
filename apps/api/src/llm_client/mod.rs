/// Generation Client — the single point of entry for text-generation calls.
///
/// ARCHITECTURAL RULE: No other module may call the inference endpoint directly.
/// The assistant pipeline only sees the `TextGenerator` trait.
///
/// The wire format is the Hugging Face text-generation shape:
/// `POST {inputs, parameters, options}` → `[{"generated_text": "..."}]`.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

const MAX_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Generation client failed to initialize: {0}")]
    Init(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Generation timed out after {0:?}")]
    Timeout(Duration),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Malformed generation payload: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Model returned no usable text")]
    EmptyOutput,

    #[error("Generation failed after {retries} retries")]
    RetriesExhausted { retries: u32 },
}

impl GenerationError {
    /// True when the call completed but its output cannot be used.
    pub fn is_malformed(&self) -> bool {
        matches!(self, GenerationError::Parse(_) | GenerationError::EmptyOutput)
    }
}

/// Decoding parameters sent with every generation call.
/// They bias toward short, low-repetition completions and are not part of the
/// output contract.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub repetition_penalty: f32,
    pub no_repeat_ngram_size: u32,
    pub max_new_tokens: u32,
    pub do_sample: bool,
    pub eos_token_id: u32,
    pub pad_token_id: u32,
    pub return_full_text: bool,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            top_p: 0.8,
            top_k: 50,
            repetition_penalty: 1.2,
            no_repeat_ngram_size: 3,
            max_new_tokens: 150,
            do_sample: true,
            eos_token_id: 50256,
            pad_token_id: 50256,
            return_full_text: false,
        }
    }
}

/// Black-box text completion. Carried in `AppState` as `Arc<dyn TextGenerator>`.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Model identifier, for status reporting and logs.
    fn model(&self) -> &str;

    /// Returns the generated continuation of `prompt`.
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, GenerationError>;
}

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: &'a GenerationOptions,
    options: InferenceOptions,
}

#[derive(Debug, Serialize)]
struct InferenceOptions {
    wait_for_model: bool,
    use_cache: bool,
}

#[derive(Debug, Deserialize)]
struct GeneratedSequence {
    generated_text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InferenceResponse {
    Batch(Vec<GeneratedSequence>),
    Single(GeneratedSequence),
}

#[derive(Debug, Deserialize)]
struct InferenceError {
    error: String,
}

/// HTTP client for a text-generation inference endpoint.
/// Retries on 429, 5xx and transport errors with exponential backoff.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    endpoint: Url,
    api_key: Option<String>,
    model: String,
    timeout: Duration,
}

impl LlmClient {
    pub fn new(
        endpoint: &str,
        api_key: Option<String>,
        model: String,
        timeout: Duration,
    ) -> Result<Self, GenerationError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| GenerationError::Init(format!("invalid endpoint '{endpoint}': {e}")))?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GenerationError::Init(e.to_string()))?;

        Ok(Self {
            client,
            endpoint,
            api_key,
            model,
            timeout,
        })
    }

    /// Outer `Err` is retryable; an inner `Err` is final.
    async fn call_once(
        &self,
        body: &InferenceRequest<'_>,
    ) -> Result<Result<String, GenerationError>, GenerationError> {
        let mut request = self.client.post(self.endpoint.clone()).json(body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = match request.send().await {
            Ok(r) => r,
            Err(e) if e.is_timeout() => return Err(GenerationError::Timeout(self.timeout)),
            Err(e) => return Err(GenerationError::Http(e)),
        };

        let status = response.status();
        let text = response.text().await?;

        if status.as_u16() == 429 || status.is_server_error() {
            warn!("Generation endpoint returned {}: {}", status, text);
            return Err(GenerationError::Api {
                status: status.as_u16(),
                message: text,
            });
        }

        if !status.is_success() {
            let message = serde_json::from_str::<InferenceError>(&text)
                .map(|e| e.error)
                .unwrap_or(text);
            // Client errors are not retried
            return Ok(Err(GenerationError::Api {
                status: status.as_u16(),
                message,
            }));
        }

        Ok(parse_generated_text(&text))
    }
}

#[async_trait]
impl TextGenerator for LlmClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, GenerationError> {
        let body = InferenceRequest {
            inputs: prompt,
            parameters: options,
            options: InferenceOptions {
                wait_for_model: true,
                use_cache: false,
            },
        };

        let mut last_error: Option<GenerationError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s
                let delay = Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "Generation attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            match self.call_once(&body).await {
                Ok(outcome) => {
                    let text = outcome?;
                    debug!(
                        "Generation succeeded: prompt_chars={}, output_chars={}",
                        prompt.len(),
                        text.len()
                    );
                    return Ok(strip_prompt_echo(prompt, &text).to_string());
                }
                Err(e) => last_error = Some(e),
            }
        }

        Err(last_error.unwrap_or(GenerationError::RetriesExhausted {
            retries: MAX_RETRIES,
        }))
    }
}

/// Extracts the first non-blank `generated_text` from a response body.
fn parse_generated_text(body: &str) -> Result<String, GenerationError> {
    let sequences = match serde_json::from_str::<InferenceResponse>(body)? {
        InferenceResponse::Batch(seqs) => seqs,
        InferenceResponse::Single(seq) => vec![seq],
    };

    sequences
        .into_iter()
        .filter_map(|s| s.generated_text)
        .find(|t| !t.trim().is_empty())
        .ok_or(GenerationError::EmptyOutput)
}

/// Some endpoints ignore `return_full_text=false` and echo the prompt.
fn strip_prompt_echo<'a>(prompt: &str, text: &'a str) -> &'a str {
    text.strip_prefix(prompt).unwrap_or(text)
}
