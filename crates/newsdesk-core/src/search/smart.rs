//! Smart query orchestration: analyze, route, retrieve, enrich

use super::executor::RetrievalExecutor;
use super::strategy::{build_strategy, RoutingStrategy};
use crate::config::{Config, QueryConfig};
use crate::db::{round2, ArticleStore, ArticleSummaryView, GeoPoint};
use crate::error::{NewsDeskError, Result};
use crate::llm::{LLMClient, LLMGateway, QueryAnalysis, QueryAnalyzer, SummaryEnricher};
use chrono::Utc;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Bounds on the requested limit accepted at the request boundary
pub const REQUEST_MIN_LIMIT: usize = 1;
pub const REQUEST_MAX_LIMIT: usize = 20;

fn default_true() -> bool {
    true
}

/// Incoming smart query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmartQueryRequest {
    pub query: String,
    #[serde(default)]
    pub location: Option<GeoPoint>,
    /// Falls back to the configured default limit when absent
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default = "default_true")]
    pub include_summary: bool,
    #[serde(default)]
    pub include_analysis: bool,
}

impl SmartQueryRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            location: None,
            limit: None,
            include_summary: true,
            include_analysis: false,
        }
    }

    pub fn with_location(mut self, location: GeoPoint) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_summary(mut self, include_summary: bool) -> Self {
        self.include_summary = include_summary;
        self
    }

    pub fn with_analysis(mut self, include_analysis: bool) -> Self {
        self.include_analysis = include_analysis;
        self
    }
}

/// Smart query result payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmartQueryResponse {
    pub articles: Vec<ArticleSummaryView>,
    pub total: usize,
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<QueryAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routing_strategy: Option<RoutingStrategy>,
    pub processing_time_ms: f64,
    pub timestamp: String,
    pub cache_hit: bool,
}

/// A request that passed validation
struct ValidatedQuery {
    query: String,
    location: Option<GeoPoint>,
    limit: usize,
    include_summary: bool,
}

fn validate(request: &SmartQueryRequest, config: &QueryConfig) -> Result<ValidatedQuery> {
    // The length bound applies to the query as sent, padding included
    if request.query.chars().count() > config.max_query_chars {
        return Err(NewsDeskError::Validation(format!(
            "Query exceeds {} characters",
            config.max_query_chars
        )));
    }
    let query = request.query.trim();
    if query.is_empty() {
        return Err(NewsDeskError::Validation("Query cannot be empty".to_string()));
    }
    if let Some(location) = request.location {
        location.validate()?;
    }
    let limit = match request.limit {
        Some(limit) if !(REQUEST_MIN_LIMIT..=REQUEST_MAX_LIMIT).contains(&limit) => {
            return Err(NewsDeskError::Validation(format!(
                "Limit must be between {} and {}",
                REQUEST_MIN_LIMIT, REQUEST_MAX_LIMIT
            )));
        }
        Some(limit) => limit,
        None => config.default_limit,
    };

    Ok(ValidatedQuery {
        query: query.to_string(),
        location: request.location,
        limit: config.clamp_limit(limit),
        include_summary: request.include_summary,
    })
}

/// Output of the analyze/retrieve/enrich phases
struct PhaseOutput {
    articles: Vec<ArticleSummaryView>,
    analysis: QueryAnalysis,
    strategy: RoutingStrategy,
}

/// Composes analysis, routing, retrieval and enrichment for one query at a time
pub struct SmartQueryService {
    analyzer: QueryAnalyzer,
    executor: RetrievalExecutor,
    enricher: SummaryEnricher,
    config: QueryConfig,
}

impl SmartQueryService {
    pub fn new(
        analyzer: QueryAnalyzer,
        executor: RetrievalExecutor,
        enricher: SummaryEnricher,
        config: QueryConfig,
    ) -> Self {
        Self {
            analyzer,
            executor,
            enricher,
            config,
        }
    }

    /// Wire the default components around a store and an optional LLM client
    pub fn from_parts(
        store: Arc<dyn ArticleStore>,
        llm: Option<Arc<dyn LLMClient>>,
        config: QueryConfig,
    ) -> Self {
        let analyzer = QueryAnalyzer::with_client(llm.clone());
        let executor = RetrievalExecutor::new(store, config.clone());
        let enricher =
            SummaryEnricher::new(llm, Duration::from_secs(config.summary_timeout_secs));
        Self::new(analyzer, executor, enricher, config)
    }

    /// Build from configuration; the LLM gateway is used only when an API key is set
    pub fn from_config(store: Arc<dyn ArticleStore>, config: &Config) -> Result<Self> {
        let llm: Option<Arc<dyn LLMClient>> = if config.llm_service.is_configured() {
            Some(Arc::new(LLMGateway::new(config.llm_service.clone())?))
        } else {
            tracing::info!("No LLM API key configured, using keyword heuristics");
            None
        };
        Ok(Self::from_parts(store, llm, config.query.clone()))
    }

    /// Process one smart query
    ///
    /// Only validation failures are returned as errors. Anything that goes
    /// wrong later, panics included, yields an empty response.
    pub async fn process_smart_query(
        &self,
        request: SmartQueryRequest,
    ) -> Result<SmartQueryResponse> {
        let start = Instant::now();
        let valid = validate(&request, &self.config)?;

        let outcome = AssertUnwindSafe(self.run_phases(&valid))
            .catch_unwind()
            .await;

        let (articles, analysis, strategy) = match outcome {
            Ok(output) => (output.articles, Some(output.analysis), Some(output.strategy)),
            Err(_) => {
                tracing::error!("Smart query processing panicked for: {}", valid.query);
                (Vec::new(), None, None)
            }
        };

        let processing_time_ms = round2(start.elapsed().as_secs_f64() * 1000.0);
        tracing::info!(
            "Smart query '{}' returned {} articles in {}ms",
            valid.query,
            articles.len(),
            processing_time_ms
        );

        let (analysis, routing_strategy) = if request.include_analysis {
            (analysis, strategy)
        } else {
            (None, None)
        };

        Ok(SmartQueryResponse {
            total: articles.len(),
            articles,
            query: valid.query,
            analysis,
            routing_strategy,
            processing_time_ms,
            timestamp: Utc::now().to_rfc3339(),
            cache_hit: false,
        })
    }

    async fn run_phases(&self, valid: &ValidatedQuery) -> PhaseOutput {
        let analysis_timeout = Duration::from_secs(self.config.analysis_timeout_secs);
        let analyzed = tokio::time::timeout(
            analysis_timeout,
            self.analyzer.analyze(&valid.query, valid.location),
        )
        .await;

        let (analysis, strategy) = match analyzed {
            Ok(analysis) => {
                let strategy = build_strategy(&analysis);
                (analysis, strategy)
            }
            Err(_) => {
                tracing::warn!(
                    "Query analysis timed out after {}s, using fallback strategy",
                    self.config.analysis_timeout_secs
                );
                let analysis = QueryAnalysis::error(&valid.query, "analysis timed out");
                let strategy = RoutingStrategy::fallback(analysis.confidence);
                (analysis, strategy)
            }
        };
        tracing::debug!(
            "Routing {} intent via {:?} {}",
            analysis.intent,
            strategy.strategy_type,
            strategy.primary_endpoint
        );

        let mut articles = self.executor.execute(&strategy, valid.limit).await;

        if valid.include_summary {
            articles = self.enricher.enrich(articles).await;
        }

        PhaseOutput {
            articles,
            analysis,
            strategy,
        }
    }
}
