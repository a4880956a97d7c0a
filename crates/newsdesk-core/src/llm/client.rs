//! HTTP gateway for OpenAI-compatible chat completion services

use super::mock;
use crate::config::LLMServiceConfig;
use crate::error::{NewsDeskError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Trait for LLM service clients
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Generate chat completion
    async fn chat_completion(&self, messages: Vec<ChatMessage>) -> Result<String>;

    /// Complete a single system instruction + user message exchange
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        self.chat_completion(vec![ChatMessage::system(system), ChatMessage::user(user)])
            .await
    }
}

/// Chat message for completion requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Gateway metrics for monitoring
#[derive(Debug, Default)]
pub struct APIMetrics {
    pub total_requests: AtomicU64,
    pub failed_attempts: AtomicU64,
    pub mock_fallbacks: AtomicU64,
    pub total_latency_ms: AtomicU64,
}

/// Snapshot of gateway metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub failed_attempts: u64,
    pub mock_fallbacks: u64,
    pub avg_latency_ms: f64,
}

/// Outcome of one attempt against one candidate endpoint
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    Success(String),
    Status(u16),
    Timeout,
    Transport(String),
    /// 2xx response without a usable `choices[0].message.content`
    Malformed(String),
}

impl AttemptOutcome {
    fn describe(&self) -> String {
        match self {
            Self::Success(_) => "success".to_string(),
            Self::Status(code) => format!("HTTP {}", code),
            Self::Timeout => "timed out".to_string(),
            Self::Transport(e) => format!("transport error: {}", e),
            Self::Malformed(e) => format!("malformed response: {}", e),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Chat completion gateway that walks an ordered list of candidate endpoints
///
/// Every failed attempt falls through to the next candidate. When all of
/// them fail the gateway answers with a deterministic mock completion, so
/// `chat_completion` never returns an error.
pub struct LLMGateway {
    http_client: reqwest::Client,
    config: LLMServiceConfig,
    candidates: Vec<String>,
    metrics: Arc<APIMetrics>,
}

impl LLMGateway {
    /// Create new gateway from configuration
    pub fn new(config: LLMServiceConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(NewsDeskError::Http)?;

        let candidates = candidate_endpoints(&config);
        tracing::debug!("LLM gateway candidates: {:?}", candidates);

        Ok(Self {
            http_client,
            config,
            candidates,
            metrics: Arc::new(APIMetrics::default()),
        })
    }

    /// Ordered candidate completion URLs
    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    /// Get current gateway metrics
    pub fn metrics(&self) -> MetricsSnapshot {
        let total = self.metrics.total_requests.load(Ordering::Relaxed);

        MetricsSnapshot {
            total_requests: total,
            failed_attempts: self.metrics.failed_attempts.load(Ordering::Relaxed),
            mock_fallbacks: self.metrics.mock_fallbacks.load(Ordering::Relaxed),
            avg_latency_ms: if total > 0 {
                self.metrics.total_latency_ms.load(Ordering::Relaxed) as f64 / total as f64
            } else {
                0.0
            },
        }
    }

    /// Issue one request against one candidate and classify the result
    async fn attempt(&self, url: &str, messages: &[ChatMessage]) -> AttemptOutcome {
        let request = ChatRequest {
            model: &self.config.model,
            messages,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let mut req = self.http_client.post(url).json(&request);
        if let Some(ref api_key) = self.config.api_key {
            req = req.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = match req.send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => return AttemptOutcome::Timeout,
            Err(e) => return AttemptOutcome::Transport(e.to_string()),
        };

        let status = response.status();
        if !status.is_success() {
            return AttemptOutcome::Status(status.as_u16());
        }

        let body: ChatResponse = match response.json().await {
            Ok(body) => body,
            Err(e) if e.is_timeout() => return AttemptOutcome::Timeout,
            Err(e) => return AttemptOutcome::Malformed(e.to_string()),
        };

        match body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
        {
            Some(content) => AttemptOutcome::Success(content),
            None => AttemptOutcome::Malformed("missing choices[0].message.content".to_string()),
        }
    }
}

/// Derived candidates from the base URL, then the configured extras, without duplicates
pub fn candidate_endpoints(config: &LLMServiceConfig) -> Vec<String> {
    let base = config.url.trim_end_matches('/');
    let derived = [
        format!("{}/v1/chat/completions", base),
        format!("{}/chat/completions", base),
        format!("{}/api/v1/chat/completions", base),
    ];

    let mut candidates: Vec<String> = Vec::new();
    for url in derived.into_iter().chain(config.extra_endpoints.iter().cloned()) {
        if !url.trim().is_empty() && !candidates.contains(&url) {
            candidates.push(url);
        }
    }
    candidates
}

#[async_trait]
impl LLMClient for LLMGateway {
    async fn chat_completion(&self, messages: Vec<ChatMessage>) -> Result<String> {
        let start = Instant::now();
        self.metrics.total_requests.fetch_add(1, Ordering::Relaxed);

        let mut completion = None;
        for url in &self.candidates {
            tracing::debug!("Trying completion endpoint: {}", url);
            match self.attempt(url, &messages).await {
                AttemptOutcome::Success(text) => {
                    tracing::debug!("Completion served by {}", url);
                    completion = Some(text);
                    break;
                }
                failure => {
                    self.metrics.failed_attempts.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!("Completion endpoint {} failed: {}", url, failure.describe());
                }
            }
        }

        let text = match completion {
            Some(text) => text,
            None => {
                tracing::warn!("All completion endpoints failed, using mock response");
                self.metrics.mock_fallbacks.fetch_add(1, Ordering::Relaxed);
                let system = messages
                    .iter()
                    .find(|m| m.role == "system")
                    .map(|m| m.content.as_str())
                    .unwrap_or_default();
                let user = messages
                    .iter()
                    .rev()
                    .find(|m| m.role == "user")
                    .map(|m| m.content.as_str())
                    .unwrap_or_default();
                mock::mock_response(system, user)
            }
        };

        let elapsed = start.elapsed().as_millis() as u64;
        self.metrics
            .total_latency_ms
            .fetch_add(elapsed, Ordering::Relaxed);

        Ok(text)
    }
}
