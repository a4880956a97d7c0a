//! Retrieval executor - runs a routing strategy against the article store

use super::strategy::{EndpointParams, RoutingStrategy, StrategyType};
use crate::config::QueryConfig;
use crate::db::{ArticleStore, ArticleSummaryView};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

/// Executes routing strategies; store failures become empty results
pub struct RetrievalExecutor {
    store: Arc<dyn ArticleStore>,
    config: QueryConfig,
}

impl RetrievalExecutor {
    pub fn new(store: Arc<dyn ArticleStore>, config: QueryConfig) -> Self {
        Self { store, config }
    }

    /// Run `strategy`, returning at most `limit` articles (capped to the retrieval range)
    pub async fn execute(&self, strategy: &RoutingStrategy, limit: usize) -> Vec<ArticleSummaryView> {
        let limit = self.config.clamp_retrieval(limit);

        let results = match strategy.strategy_type {
            StrategyType::Single | StrategyType::Fallback => {
                self.call(&strategy.parameters, limit).await
            }
            StrategyType::Multiple => self.execute_multiple(strategy, limit).await,
        };

        tracing::info!(
            "Executed {:?} strategy via {}: {} results",
            strategy.strategy_type,
            strategy.primary_endpoint,
            results.len()
        );
        results
    }

    async fn execute_multiple(
        &self,
        strategy: &RoutingStrategy,
        limit: usize,
    ) -> Vec<ArticleSummaryView> {
        let primary_limit = limit / self.config.mixed_primary_divisor.max(1);
        let mut all = self.call(&strategy.parameters, primary_limit).await;
        tracing::debug!("Primary {}: {} results", strategy.primary_endpoint, all.len());

        let mut remaining = limit.saturating_sub(all.len());
        for secondary in &strategy.secondary_endpoints {
            if remaining == 0 {
                break;
            }
            let call_limit = remaining.min(self.config.secondary_cap);
            let results = self.call(&secondary.parameters, call_limit).await;
            tracing::debug!("Secondary {}: {} results", secondary.endpoint, results.len());

            remaining = remaining.saturating_sub(results.len());
            all.extend(results);
        }

        let mut merged = dedup_by_id(all);
        merged.truncate(limit);
        merged
    }

    /// One retrieval call under the store timeout; errors are logged and yield nothing
    async fn call(&self, params: &EndpointParams, limit: usize) -> Vec<ArticleSummaryView> {
        if limit == 0 {
            return Vec::new();
        }

        let store = self.store.as_ref();
        let fut = async {
            match params {
                EndpointParams::Category(p) => store.by_category(&p.category, limit).await,
                EndpointParams::Search(p) => store.by_search(&p.query, limit).await,
                EndpointParams::Source(p) => store.by_source(&p.source, limit).await,
                EndpointParams::Score(p) => store.by_score(p.min_score, limit).await,
                EndpointParams::Nearby(p) => store.nearby(p.lat, p.lon, p.radius_km, limit).await,
            }
        };

        let timeout = Duration::from_millis(self.config.store_timeout_ms);
        match tokio::time::timeout(timeout, fut).await {
            Ok(Ok(results)) => results,
            Ok(Err(e)) => {
                tracing::warn!("{} retrieval failed: {}", params.endpoint(), e);
                Vec::new()
            }
            Err(_) => {
                tracing::warn!(
                    "{} retrieval timed out after {}ms",
                    params.endpoint(),
                    self.config.store_timeout_ms
                );
                Vec::new()
            }
        }
    }
}

/// Drop repeated article ids, keeping the first occurrence
pub fn dedup_by_id(articles: Vec<ArticleSummaryView>) -> Vec<ArticleSummaryView> {
    let mut seen = HashSet::new();
    articles
        .into_iter()
        .filter(|view| seen.insert(view.article.id.clone()))
        .collect()
}
