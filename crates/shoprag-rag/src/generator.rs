//! Answer generation through the Gemini `generateContent` REST endpoint.
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use shoprag_core::config::GenerationSettings;
use shoprag_core::error::{Error, GenerationError, Result};
use shoprag_core::traits::Generator;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const MAX_ERROR_BODY: usize = 500;

/// Blocking Gemini client.
pub struct GeminiGenerator {
    client: Client,
    endpoint: String,
    model: String,
}

impl GeminiGenerator {
    pub fn new(api_key: &str, model: &str, timeout: Duration) -> Result<Self> {
        Self::with_base_url(api_key, model, timeout, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: &str, model: &str, timeout: Duration, base_url: &str) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(Error::InvalidConfig("missing Gemini API key".to_string()));
        }
        if model.trim().is_empty() {
            return Err(Error::InvalidConfig("missing Gemini model name".to_string()));
        }
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-goog-api-key",
            HeaderValue::from_str(api_key.trim()).map_err(|_| Error::InvalidConfig("invalid Gemini API key".to_string()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| Error::InvalidConfig(format!("failed to build Gemini HTTP client: {}", e)))?;
        let endpoint = format!("{}/models/{}:generateContent", base_url.trim_end_matches('/'), model.trim());
        Ok(Self { client, endpoint, model: model.trim().to_string() })
    }

    pub fn model(&self) -> &str { &self.model }
}

impl Generator for GeminiGenerator {
    fn generate(&self, prompt: &str) -> std::result::Result<String, GenerationError> {
        let body = GenerateRequest { contents: vec![Content { parts: vec![Part { text: Some(prompt.to_string()) }] }] };
        let resp = self.client.post(&self.endpoint).json(&body).send().map_err(classify_send_error)?;
        let status = resp.status();
        let text = resp.text().map_err(classify_send_error)?;
        if !status.is_success() {
            return Err(classify_status(status, &text));
        }
        let answer = extract_text(&text)?;
        debug!(model = %self.model, chars = answer.len(), "generated answer");
        Ok(answer)
    }
}

/// Retries transient failures with exponential backoff.
pub struct RetryingGenerator<G> {
    inner: G,
    max_retries: u32,
    backoff: Duration,
}

impl<G: Generator> RetryingGenerator<G> {
    pub fn new(inner: G, max_retries: u32, backoff: Duration) -> Self {
        Self { inner, max_retries, backoff }
    }

    fn delay(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(1u32 << attempt.min(5))
    }
}

impl<G: Generator> Generator for RetryingGenerator<G> {
    fn generate(&self, prompt: &str) -> std::result::Result<String, GenerationError> {
        let mut attempt = 0u32;
        loop {
            match self.inner.generate(prompt) {
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    let delay = self.delay(attempt);
                    attempt += 1;
                    warn!(error = %e, attempt, max_retries = self.max_retries, delay_ms = delay.as_millis() as u64, "retrying generation");
                    thread::sleep(delay);
                }
                other => return other,
            }
        }
    }
}

/// Build the configured generator, or `None` when no API key is available.
pub fn generator_from_settings(settings: &GenerationSettings) -> Result<Option<Arc<dyn Generator>>> {
    let Some(key) = settings.api_key.as_deref().filter(|k| !k.trim().is_empty()) else {
        warn!("no Gemini API key configured; answers will not be generated");
        return Ok(None);
    };
    let gemini = GeminiGenerator::new(key, &settings.model, Duration::from_secs(settings.timeout_secs))?;
    info!(model = gemini.model(), max_retries = settings.max_retries, "configured Gemini generator");
    if settings.max_retries == 0 {
        return Ok(Some(Arc::new(gemini)));
    }
    Ok(Some(Arc::new(RetryingGenerator::new(
        gemini,
        settings.max_retries,
        Duration::from_millis(settings.backoff_ms),
    ))))
}

fn classify_send_error(err: reqwest::Error) -> GenerationError {
    if err.is_timeout() {
        GenerationError::Timeout
    } else {
        GenerationError::Network(err.to_string())
    }
}

fn classify_status(status: StatusCode, body: &str) -> GenerationError {
    let body: String = body.chars().take(MAX_ERROR_BODY).collect();
    match status {
        StatusCode::TOO_MANY_REQUESTS => GenerationError::RateLimited(body),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GenerationError::Unauthorized(body),
        _ => GenerationError::Api { status: status.as_u16(), body },
    }
}

fn extract_text(body: &str) -> std::result::Result<String, GenerationError> {
    let parsed: GenerateResponse =
        serde_json::from_str(body).map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;
    let Some(candidate) = parsed.candidates.into_iter().next() else {
        let reason = parsed
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .map(|r| format!("no candidates (blocked: {})", r))
            .unwrap_or_else(|| "no candidates".to_string());
        return Err(GenerationError::MalformedResponse(reason));
    };
    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();
    if text.trim().is_empty() {
        let reason = candidate.finish_reason.unwrap_or_else(|| "unknown".to_string());
        return Err(GenerationError::MalformedResponse(format!("candidate has no text (finish reason: {})", reason)));
    }
    Ok(text)
}

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}
