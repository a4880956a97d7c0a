//! Async retrieval facade over the article database

use super::{ArticleSummaryView, Database};
use crate::error::{NewsDeskError, Result};
use async_trait::async_trait;

/// Read-only article retrieval used by the query pipeline
#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Articles tagged with `category`, newest first
    async fn by_category(&self, category: &str, limit: usize) -> Result<Vec<ArticleSummaryView>>;

    /// Text match over title and description
    async fn by_search(&self, query: &str, limit: usize) -> Result<Vec<ArticleSummaryView>>;

    /// Source name match, newest first
    async fn by_source(&self, source: &str, limit: usize) -> Result<Vec<ArticleSummaryView>>;

    /// Relevance score at or above `min_score`
    async fn by_score(&self, min_score: f64, limit: usize) -> Result<Vec<ArticleSummaryView>>;

    /// Articles within `radius_km` of a point, closest first
    async fn nearby(
        &self,
        lat: f64,
        lon: f64,
        radius_km: f64,
        limit: usize,
    ) -> Result<Vec<ArticleSummaryView>>;
}

impl Database {
    async fn run_blocking<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> Result<T> + Send + 'static,
    {
        let db = self.clone();
        tokio::task::spawn_blocking(move || f(&db))
            .await
            .map_err(|e| NewsDeskError::Internal(format!("store task failed: {}", e)))?
    }
}

#[async_trait]
impl ArticleStore for Database {
    async fn by_category(&self, category: &str, limit: usize) -> Result<Vec<ArticleSummaryView>> {
        let category = category.to_string();
        self.run_blocking(move |db| db.articles_by_category(&category, limit))
            .await
    }

    async fn by_search(&self, query: &str, limit: usize) -> Result<Vec<ArticleSummaryView>> {
        let query = query.to_string();
        self.run_blocking(move |db| db.articles_by_search(&query, limit))
            .await
    }

    async fn by_source(&self, source: &str, limit: usize) -> Result<Vec<ArticleSummaryView>> {
        let source = source.to_string();
        self.run_blocking(move |db| db.articles_by_source(&source, limit))
            .await
    }

    async fn by_score(&self, min_score: f64, limit: usize) -> Result<Vec<ArticleSummaryView>> {
        self.run_blocking(move |db| db.articles_by_score(min_score, limit))
            .await
    }

    async fn nearby(
        &self,
        lat: f64,
        lon: f64,
        radius_km: f64,
        limit: usize,
    ) -> Result<Vec<ArticleSummaryView>> {
        self.run_blocking(move |db| db.articles_nearby(lat, lon, radius_km, limit))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::super::articles::test_support::*;
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_store_through_trait_object() {
        let db = seeded_db(&[
            article("a", "Cup final tonight", &["sports"], 2),
            article("b", "Chip shortage eases", &["technology"], 4),
        ]);
        let store: Arc<dyn ArticleStore> = Arc::new(db);

        let sports = store.by_category("sports", 5).await.unwrap();
        assert_eq!(sports.len(), 1);
        assert_eq!(sports[0].id(), "a");

        let chips = store.by_search("chip", 5).await.unwrap();
        assert_eq!(chips[0].id(), "b");

        let everything = store.by_score(0.0, 5).await.unwrap();
        assert_eq!(everything.len(), 2);

        let near = store.nearby(0.0, 0.0, 1.0, 5).await.unwrap();
        assert_eq!(near.len(), 2);
        assert!(near.iter().all(|v| v.distance_km == Some(0.0)));
    }
}
