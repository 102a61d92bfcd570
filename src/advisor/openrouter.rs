//! OpenRouter chat-completion client.
//!
//! Routes all advisory calls through OpenRouter's unified API, giving
//! access to multiple model providers with a single API key. Uses the
//! OpenAI-compatible chat completions format.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{AdvisorError, AdvisoryClient};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const OPENROUTER_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

const DEFAULT_MAX_TOKENS: u32 = 1024;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

// ---------------------------------------------------------------------------
// API types (OpenAI-compatible)
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    max_tokens: u32,
    temperature: f64,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ChatMessage>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct OpenRouterClient {
    http: Client,
    api_key: String,
    max_tokens: u32,
    total_calls: AtomicU64,
}

impl OpenRouterClient {
    /// Create a new OpenRouter client.
    ///
    /// - `api_key`: OpenRouter API key.
    /// - `max_tokens`: Max output tokens per request.
    pub fn new(api_key: String, max_tokens: Option<u32>) -> Result<Self, AdvisorError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AdvisorError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_key,
            max_tokens: max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            total_calls: AtomicU64::new(0),
        })
    }

    /// Total number of API calls attempted.
    pub fn total_calls(&self) -> u64 {
        self.total_calls.load(Ordering::Relaxed)
    }
}

/// The server's Retry-After hint, when present and whole-second form.
fn retry_after_hint(response: &reqwest::Response) -> Option<Duration> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

#[async_trait]
impl AdvisoryClient for OpenRouterClient {
    async fn complete(
        &self,
        model: &str,
        system: &str,
        prompt: &str,
    ) -> Result<String, AdvisorError> {
        let request = ChatRequest {
            model: model.to_string(),
            max_tokens: self.max_tokens,
            // Deterministic output: verdicts should not vary run to run.
            temperature: 0.0,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
        };

        self.total_calls.fetch_add(1, Ordering::Relaxed);

        let response = self
            .http
            .post(OPENROUTER_API_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| AdvisorError::Transport(e.to_string()))?;

        let status = response.status();

        if status.as_u16() == 429 {
            let retry_after = retry_after_hint(&response);
            warn!(model, ?retry_after, "OpenRouter rate limited");
            return Err(AdvisorError::Throttled { retry_after });
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AdvisorError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| AdvisorError::Transport(format!("failed to parse response: {e}")))?;

        let text = body
            .choices
            .first()
            .and_then(|c| c.message.as_ref())
            .map(|m| m.content.clone())
            .unwrap_or_default();

        debug!(model, chars = text.len(), "OpenRouter completion received");
        Ok(text)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
