//! LLM integration
//!
//! Provides:
//! - An OpenAI-compatible completion gateway with endpoint fall-through
//! - Query analysis (LLM-backed or keyword heuristics)
//! - Article summarization

mod client;
mod mock;
mod query_analyzer;
mod summarizer;

pub use client::{
    candidate_endpoints, APIMetrics, AttemptOutcome, ChatMessage, LLMClient, LLMGateway,
    MetricsSnapshot,
};
pub use mock::{mock_response, MOCK_SUMMARY};
pub use query_analyzer::{
    heuristic_analysis, parse_analysis_response, AnalysisParameters, Entities, Intent,
    LocationHint, QueryAnalysis, QueryAnalyzer,
};
pub use summarizer::{clean_summary, SummaryEnricher};

#[cfg(test)]
pub(crate) mod testing {
    //! In-process LLM clients for tests

    use super::{ChatMessage, LLMClient};
    use crate::error::{NewsDeskError, Result};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Always answers with the same text
    #[derive(Clone)]
    pub struct StubClient {
        reply: String,
        delay: Option<Duration>,
        calls: Arc<AtomicUsize>,
        last: Arc<Mutex<Option<(String, String)>>>,
    }

    impl StubClient {
        pub fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                delay: None,
                calls: Arc::new(AtomicUsize::new(0)),
                last: Arc::new(Mutex::new(None)),
            }
        }

        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        /// (system, user) of the most recent call
        pub fn last_exchange(&self) -> Option<(String, String)> {
            self.last.lock().unwrap().clone()
        }
    }

    fn content_of(messages: &[ChatMessage], role: &str) -> String {
        messages
            .iter()
            .find(|m| m.role == role)
            .map(|m| m.content.clone())
            .unwrap_or_default()
    }

    #[async_trait]
    impl LLMClient for StubClient {
        async fn chat_completion(&self, messages: Vec<ChatMessage>) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last.lock().unwrap() = Some((
                content_of(&messages, "system"),
                content_of(&messages, "user"),
            ));
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            Ok(self.reply.clone())
        }
    }

    /// Always errors
    pub struct FailingClient;

    #[async_trait]
    impl LLMClient for FailingClient {
        async fn chat_completion(&self, _messages: Vec<ChatMessage>) -> Result<String> {
            Err(NewsDeskError::ExternalError("service unavailable".to_string()))
        }
    }

    /// Errors when the user message contains a marker, otherwise echoes a summary
    pub struct SelectiveClient {
        marker: String,
    }

    impl SelectiveClient {
        pub fn failing_on(marker: &str) -> Self {
            Self {
                marker: marker.to_string(),
            }
        }
    }

    #[async_trait]
    impl LLMClient for SelectiveClient {
        async fn chat_completion(&self, messages: Vec<ChatMessage>) -> Result<String> {
            let user = content_of(&messages, "user");
            if user.contains(&self.marker) {
                Err(NewsDeskError::Llm("refused".to_string()))
            } else {
                Ok(format!("Summary of {}", user.lines().next().unwrap_or_default()))
            }
        }
    }
}
