//! Query routing and retrieval
//!
//! Strategy building, strategy execution against an [`ArticleStore`](crate::db::ArticleStore),
//! and the smart query pipeline that ties analysis, retrieval and enrichment together.

mod executor;
mod smart;
mod strategy;

pub use executor::{dedup_by_id, RetrievalExecutor};
pub use smart::{
    SmartQueryRequest, SmartQueryResponse, SmartQueryService, REQUEST_MAX_LIMIT,
    REQUEST_MIN_LIMIT,
};
pub use strategy::{
    build_strategy, CategoryParams, Endpoint, EndpointParams, NearbyParams, RoutingStrategy,
    ScoreParams, SearchParams, SecondaryEndpoint, SourceParams, StrategyType,
    DEFAULT_ENDPOINT_LIMIT, DEFAULT_MIN_SCORE, DEFAULT_RADIUS_KM, FALLBACK_QUERY,
    SECONDARY_ENDPOINT_LIMIT,
};

#[cfg(test)]
pub(crate) mod testing {
    //! Article stores with scripted behavior

    use crate::db::{Article, ArticleStore, ArticleSummaryView};
    use crate::error::{NewsDeskError, Result};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Records the limit of every call and returns one fresh article each time
    #[derive(Default)]
    pub struct RecordingStore {
        limits: Mutex<Vec<usize>>,
        counter: AtomicUsize,
    }

    impl RecordingStore {
        pub fn limits(&self) -> Vec<usize> {
            self.limits.lock().unwrap().clone()
        }

        fn record(&self, limit: usize) -> Result<Vec<ArticleSummaryView>> {
            self.limits.lock().unwrap().push(limit);
            let n = self.counter.fetch_add(1, Ordering::SeqCst);
            Ok(vec![Article {
                id: format!("rec-{}", n),
                title: format!("Recorded {}", n),
                description: String::new(),
                url: format!("https://example.com/rec-{}", n),
                publication_date: Utc::now(),
                source_name: "Recorder".to_string(),
                category: vec!["general".to_string()],
                relevance_score: 0.5,
                latitude: 0.0,
                longitude: 0.0,
                llm_summary: None,
            }
            .into()])
        }
    }

    #[async_trait]
    impl ArticleStore for RecordingStore {
        async fn by_category(&self, _: &str, limit: usize) -> Result<Vec<ArticleSummaryView>> {
            self.record(limit)
        }
        async fn by_search(&self, _: &str, limit: usize) -> Result<Vec<ArticleSummaryView>> {
            self.record(limit)
        }
        async fn by_source(&self, _: &str, limit: usize) -> Result<Vec<ArticleSummaryView>> {
            self.record(limit)
        }
        async fn by_score(&self, _: f64, limit: usize) -> Result<Vec<ArticleSummaryView>> {
            self.record(limit)
        }
        async fn nearby(&self, _: f64, _: f64, _: f64, limit: usize) -> Result<Vec<ArticleSummaryView>> {
            self.record(limit)
        }
    }

    /// Every call fails
    pub struct FailingStore;

    fn unavailable() -> Result<Vec<ArticleSummaryView>> {
        Err(NewsDeskError::ExternalError("document store unavailable".to_string()))
    }

    #[async_trait]
    impl ArticleStore for FailingStore {
        async fn by_category(&self, _: &str, _: usize) -> Result<Vec<ArticleSummaryView>> {
            unavailable()
        }
        async fn by_search(&self, _: &str, _: usize) -> Result<Vec<ArticleSummaryView>> {
            unavailable()
        }
        async fn by_source(&self, _: &str, _: usize) -> Result<Vec<ArticleSummaryView>> {
            unavailable()
        }
        async fn by_score(&self, _: f64, _: usize) -> Result<Vec<ArticleSummaryView>> {
            unavailable()
        }
        async fn nearby(&self, _: f64, _: f64, _: f64, _: usize) -> Result<Vec<ArticleSummaryView>> {
            unavailable()
        }
    }

    /// Every call panics
    pub struct PanickingStore;

    #[async_trait]
    impl ArticleStore for PanickingStore {
        async fn by_category(&self, _: &str, _: usize) -> Result<Vec<ArticleSummaryView>> {
            panic!("corrupt index")
        }
        async fn by_search(&self, _: &str, _: usize) -> Result<Vec<ArticleSummaryView>> {
            panic!("corrupt index")
        }
        async fn by_source(&self, _: &str, _: usize) -> Result<Vec<ArticleSummaryView>> {
            panic!("corrupt index")
        }
        async fn by_score(&self, _: f64, _: usize) -> Result<Vec<ArticleSummaryView>> {
            panic!("corrupt index")
        }
        async fn nearby(&self, _: f64, _: f64, _: f64, _: usize) -> Result<Vec<ArticleSummaryView>> {
            panic!("corrupt index")
        }
    }
}
