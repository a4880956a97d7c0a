//! Article records and retrieval queries

use super::functions::round2;
use super::Database;
use crate::error::{NewsDeskError, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

/// News article as stored in the database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub title: String,
    pub description: String,
    pub url: String,
    pub publication_date: DateTime<Utc>,
    pub source_name: String,
    /// Non-empty, insertion order preserved
    pub category: Vec<String>,
    /// Always within [0, 1]
    pub relevance_score: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub llm_summary: Option<String>,
}

impl Article {
    /// Whether the article carries the given category tag
    pub fn has_category(&self, tag: &str) -> bool {
        self.category.iter().any(|c| c == tag)
    }
}

/// Clamp a relevance score into [0, 1]; NaN becomes 0
pub(crate) fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 1.0)
    }
}

/// Geographic point in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// lat within [-90, 90] and lon within [-180, 180]
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lon)
    }

    /// Like [`GeoPoint::is_valid`], naming the offending coordinate
    pub fn validate(&self) -> Result<()> {
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(NewsDeskError::Validation(
                "Latitude must be between -90 and 90".to_string(),
            ));
        }
        if !(-180.0..=180.0).contains(&self.lon) {
            return Err(NewsDeskError::Validation(
                "Longitude must be between -180 and 180".to_string(),
            ));
        }
        Ok(())
    }
}

/// Response-facing projection of an article
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleSummaryView {
    #[serde(flatten)]
    pub article: Article,

    /// Distance from the query point, only set for geospatial results
    #[serde(default)]
    pub distance_km: Option<f64>,
}

impl ArticleSummaryView {
    pub fn id(&self) -> &str {
        &self.article.id
    }
}

impl From<Article> for ArticleSummaryView {
    fn from(article: Article) -> Self {
        Self {
            article,
            distance_km: None,
        }
    }
}

const ARTICLE_COLUMNS: &str = "id, title, description, url, publication_date, source_name, \
     category, relevance_score, latitude, longitude, llm_summary";

/// Index of the first computed column after [`ARTICLE_COLUMNS`]
const COMPUTED_COLUMN: usize = 11;

fn conversion_error(idx: usize, err: impl std::error::Error + Send + Sync + 'static) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(err))
}

fn article_from_row(row: &Row) -> rusqlite::Result<Article> {
    let published: String = row.get(4)?;
    let publication_date = DateTime::parse_from_rfc3339(&published)
        .map_err(|e| conversion_error(4, e))?
        .with_timezone(&Utc);

    let category_json: String = row.get(6)?;
    let category: Vec<String> =
        serde_json::from_str(&category_json).map_err(|e| conversion_error(6, e))?;

    Ok(Article {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        url: row.get(3)?,
        publication_date,
        source_name: row.get(5)?,
        category,
        relevance_score: clamp_score(row.get(7)?),
        latitude: row.get(8)?,
        longitude: row.get(9)?,
        llm_summary: row.get(10)?,
    })
}

fn view_from_row(row: &Row) -> rusqlite::Result<ArticleSummaryView> {
    Ok(article_from_row(row)?.into())
}

fn view_with_distance(row: &Row) -> rusqlite::Result<ArticleSummaryView> {
    let distance: f64 = row.get(COMPUTED_COLUMN)?;
    Ok(ArticleSummaryView {
        article: article_from_row(row)?,
        distance_km: Some(round2(distance)),
    })
}

/// Canonical text form of a timestamp; lexicographic order equals time order
pub(crate) fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

impl Database {
    /// Articles whose category list contains `category`, newest first
    pub fn articles_by_category(
        &self,
        category: &str,
        limit: usize,
    ) -> Result<Vec<ArticleSummaryView>> {
        let sql = format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles a
             WHERE EXISTS (SELECT 1 FROM json_each(a.category) WHERE json_each.value = ?1)
             ORDER BY publication_date DESC, id ASC
             LIMIT ?2"
        );
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let results = stmt
            .query_map(params![category, limit as i64], view_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(results)
    }

    /// Case-insensitive substring search over title and description
    ///
    /// Title hits weigh 2, description hits 1; ties break on relevance
    /// score and then recency.
    pub fn articles_by_search(&self, query: &str, limit: usize) -> Result<Vec<ArticleSummaryView>> {
        let sql = format!(
            "SELECT {ARTICLE_COLUMNS},
                    (CASE WHEN contains_ci(title, ?1) THEN 2 ELSE 0 END)
                  + (CASE WHEN contains_ci(description, ?1) THEN 1 ELSE 0 END) AS text_score
             FROM articles
             WHERE contains_ci(title, ?1) OR contains_ci(description, ?1)
             ORDER BY text_score DESC, relevance_score DESC, publication_date DESC, id ASC
             LIMIT ?2"
        );
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let results = stmt
            .query_map(params![query, limit as i64], view_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(results)
    }

    /// Case-insensitive substring match on source name, newest first
    pub fn articles_by_source(&self, source: &str, limit: usize) -> Result<Vec<ArticleSummaryView>> {
        let sql = format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles
             WHERE contains_ci(source_name, ?1)
             ORDER BY publication_date DESC, id ASC
             LIMIT ?2"
        );
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let results = stmt
            .query_map(params![source, limit as i64], view_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(results)
    }

    /// Articles with relevance score >= `min_score`, best first
    pub fn articles_by_score(&self, min_score: f64, limit: usize) -> Result<Vec<ArticleSummaryView>> {
        let sql = format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles
             WHERE relevance_score >= ?1
             ORDER BY relevance_score DESC, publication_date DESC, id ASC
             LIMIT ?2"
        );
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let results = stmt
            .query_map(params![min_score, limit as i64], view_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(results)
    }

    /// Articles within `radius_km` of (lat, lon), closest first, with distance attached
    pub fn articles_nearby(
        &self,
        lat: f64,
        lon: f64,
        radius_km: f64,
        limit: usize,
    ) -> Result<Vec<ArticleSummaryView>> {
        let sql = format!(
            "SELECT * FROM (
                 SELECT {ARTICLE_COLUMNS},
                        great_circle_km(?1, ?2, latitude, longitude) AS distance_km
                 FROM articles
             )
             WHERE distance_km <= ?3
             ORDER BY distance_km ASC, id ASC
             LIMIT ?4"
        );
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let results = stmt
            .query_map(params![lat, lon, radius_km, limit as i64], view_with_distance)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(results)
    }

    /// Find a single article by id
    pub fn get_article(&self, id: &str) -> Result<Option<Article>> {
        let sql = format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE id = ?1");
        let conn = self.conn()?;
        let result = conn.query_row(&sql, params![id], article_from_row);
        match result {
            Ok(article) => Ok(Some(article)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Insert or update an article, keyed by URL
    pub fn upsert_article(&self, article: &Article) -> Result<()> {
        let conn = self.conn()?;
        upsert(&conn, article, &format_timestamp(&Utc::now()))?;
        Ok(())
    }

    /// Upsert a batch in one transaction
    ///
    /// Returns (inserted, failed). A failing record is logged and skipped.
    pub fn insert_articles(&self, articles: &[Article]) -> Result<(usize, usize)> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let now = format_timestamp(&Utc::now());

        let mut inserted = 0;
        let mut failed = 0;
        for article in articles {
            match upsert(&tx, article, &now) {
                Ok(()) => inserted += 1,
                Err(e) => {
                    tracing::warn!("Failed to store article {} ({}): {}", article.id, article.url, e);
                    failed += 1;
                }
            }
        }

        tx.commit()?;
        Ok((inserted, failed))
    }

    /// Remove every article
    pub fn clear_articles(&self) -> Result<usize> {
        let conn = self.conn()?;
        let rows = conn.execute("DELETE FROM articles", [])?;
        Ok(rows)
    }
}

fn upsert(conn: &rusqlite::Connection, article: &Article, now: &str) -> rusqlite::Result<()> {
    let category = serde_json::to_string(&article.category)
        .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

    conn.execute(
        "INSERT INTO articles (id, url, title, description, publication_date, source_name,
                               category, relevance_score, latitude, longitude, llm_summary,
                               created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)
         ON CONFLICT(url) DO UPDATE SET
             title = excluded.title,
             description = excluded.description,
             publication_date = excluded.publication_date,
             source_name = excluded.source_name,
             category = excluded.category,
             relevance_score = excluded.relevance_score,
             latitude = excluded.latitude,
             longitude = excluded.longitude,
             updated_at = excluded.updated_at",
        params![
            article.id,
            article.url,
            article.title,
            article.description,
            format_timestamp(&article.publication_date),
            article.source_name,
            category,
            clamp_score(article.relevance_score),
            article.latitude,
            article.longitude,
            article.llm_summary,
            now,
        ],
    )?;
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use chrono::TimeZone;

    /// Build an article with sensible defaults for tests
    pub fn article(id: &str, title: &str, category: &[&str], day: u32) -> Article {
        Article {
            id: id.to_string(),
            title: title.to_string(),
            description: format!("Description of {}", title),
            url: format!("https://news.example.com/{}", id),
            publication_date: Utc.with_ymd_and_hms(2025, 3, day, 12, 0, 0).unwrap(),
            source_name: "Example Times".to_string(),
            category: category.iter().map(|c| c.to_string()).collect(),
            relevance_score: 0.5,
            latitude: 0.0,
            longitude: 0.0,
            llm_summary: None,
        }
    }

    pub fn seeded_db(articles: &[Article]) -> Database {
        let db = Database::open_in_memory().unwrap();
        db.initialize().unwrap();
        db.insert_articles(articles).unwrap();
        db
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    fn ids(results: &[ArticleSummaryView]) -> Vec<&str> {
        results.iter().map(|r| r.id()).collect()
    }

    #[test]
    fn test_category_newest_first() {
        let db = seeded_db(&[
            article("a", "Old match", &["sports"], 1),
            article("b", "New match", &["sports", "world"], 9),
            article("c", "Chip news", &["technology"], 5),
        ]);

        let results = db.articles_by_category("sports", 10).unwrap();
        assert_eq!(ids(&results), vec!["b", "a"]);
        assert!(results.iter().all(|r| r.article.has_category("sports")));
        assert!(results.iter().all(|r| r.distance_km.is_none()));
    }

    #[test]
    fn test_category_preserves_tag_order() {
        let db = seeded_db(&[article("a", "Mixed", &["world", "business"], 1)]);
        let results = db.articles_by_category("business", 5).unwrap();
        assert_eq!(results[0].article.category, vec!["world", "business"]);
    }

    #[test]
    fn test_search_weights_title_over_description() {
        let mut in_description = article("desc", "Markets today", &["business"], 9);
        in_description.description = "Elon Musk comments on markets".to_string();
        in_description.relevance_score = 0.99;
        let in_title = article("title", "Elon Musk unveils rocket", &["technology"], 1);

        let db = seeded_db(&[in_description, in_title]);
        let results = db.articles_by_search("elon musk", 10).unwrap();
        assert_eq!(ids(&results), vec!["title", "desc"]);
    }

    #[test]
    fn test_search_ties_break_on_relevance() {
        let mut low = article("low", "Rain forecast", &["world"], 9);
        low.relevance_score = 0.2;
        let mut high = article("high", "Rain warning", &["world"], 1);
        high.relevance_score = 0.9;

        let db = seeded_db(&[low, high]);
        let results = db.articles_by_search("RAIN", 10).unwrap();
        assert_eq!(ids(&results), vec!["high", "low"]);
    }

    #[test]
    fn test_search_no_match() {
        let db = seeded_db(&[article("a", "Budget vote", &["national"], 1)]);
        assert!(db.articles_by_search("volcano", 10).unwrap().is_empty());
    }

    #[test]
    fn test_source_is_case_insensitive_substring() {
        let mut reuters = article("r", "Wire story", &["world"], 3);
        reuters.source_name = "Reuters".to_string();
        let db = seeded_db(&[reuters, article("e", "Other", &["world"], 4)]);

        let results = db.articles_by_source("reut", 10).unwrap();
        assert_eq!(ids(&results), vec!["r"]);
    }

    #[test]
    fn test_score_threshold_and_order() {
        let mut a = article("a", "A", &["world"], 1);
        a.relevance_score = 0.71;
        let mut b = article("b", "B", &["world"], 2);
        b.relevance_score = 0.95;
        let mut c = article("c", "C", &["world"], 3);
        c.relevance_score = 0.3;

        let db = seeded_db(&[a, b, c]);
        let results = db.articles_by_score(0.7, 10).unwrap();
        assert_eq!(ids(&results), vec!["b", "a"]);
    }

    #[test]
    fn test_scores_are_clamped_on_write() {
        let mut a = article("a", "A", &["world"], 1);
        a.relevance_score = 3.5;
        let db = seeded_db(&[a]);
        let stored = db.get_article("a").unwrap().unwrap();
        assert_eq!(stored.relevance_score, 1.0);
    }

    #[test]
    fn test_nearby_orders_by_distance_and_rounds() {
        let mut palo_alto = article("pa", "Palo Alto", &["national"], 1);
        palo_alto.latitude = 37.4419;
        palo_alto.longitude = -122.143;
        let mut mountain_view = article("mv", "Mountain View", &["national"], 2);
        mountain_view.latitude = 37.3861;
        mountain_view.longitude = -122.0839;
        let mut new_york = article("ny", "New York", &["national"], 3);
        new_york.latitude = 40.7128;
        new_york.longitude = -74.006;

        let db = seeded_db(&[mountain_view, new_york, palo_alto]);
        let results = db.articles_nearby(37.4419, -122.143, 25.0, 10).unwrap();

        assert_eq!(ids(&results), vec!["pa", "mv"]);
        let first = results[0].distance_km.unwrap();
        let second = results[1].distance_km.unwrap();
        assert_eq!(first, 0.0);
        assert!(second > 5.0 && second < 15.0, "got {}", second);
        assert_eq!(second, round2(second));
    }

    #[test]
    fn test_limit_is_respected() {
        let articles: Vec<Article> = (1..=8)
            .map(|i| article(&format!("s{}", i), "Match report", &["sports"], i))
            .collect();
        let db = seeded_db(&articles);
        assert_eq!(db.articles_by_category("sports", 3).unwrap().len(), 3);
        assert_eq!(db.articles_by_search("match", 4).unwrap().len(), 4);
    }

    #[test]
    fn test_upsert_by_url_updates_in_place() {
        let db = seeded_db(&[article("a", "First title", &["world"], 1)]);
        let mut updated = article("a", "Second title", &["world"], 1);
        updated.relevance_score = 0.8;
        db.upsert_article(&updated).unwrap();

        let stored = db.get_article("a").unwrap().unwrap();
        assert_eq!(stored.title, "Second title");
        assert_eq!(stored.relevance_score, 0.8);
        assert_eq!(db.clear_articles().unwrap(), 1);
    }

    #[test]
    fn test_malformed_row_is_an_error() {
        let db = seeded_db(&[article("a", "Broken", &["world"], 1)]);
        db.conn()
            .unwrap()
            .execute("UPDATE articles SET category = 'not json' WHERE id = 'a'", [])
            .unwrap();
        assert!(db.articles_by_source("example", 5).is_err());
    }

    #[test]
    fn test_geo_point_validation() {
        assert!(GeoPoint::new(90.0, -180.0).validate().is_ok());
        let err = GeoPoint::new(90.5, 0.0).validate().unwrap_err();
        assert!(err.to_string().contains("Latitude"));
        let err = GeoPoint::new(0.0, 181.0).validate().unwrap_err();
        assert!(err.to_string().contains("Longitude"));
    }
}
