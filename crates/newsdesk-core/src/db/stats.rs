//! Database statistics

use super::Database;
use crate::error::Result;
use std::collections::BTreeMap;

/// Database stats
#[derive(Debug, Clone, serde::Serialize)]
pub struct DatabaseStats {
    pub article_count: usize,
    pub source_count: usize,
    pub summarized_count: usize,
    /// Article count per category tag
    pub categories: BTreeMap<String, usize>,
    pub earliest_publication: Option<String>,
    pub latest_publication: Option<String>,
}

impl Database {
    /// Get database statistics
    pub fn get_stats(&self) -> Result<DatabaseStats> {
        let conn = self.conn()?;

        let article_count: i64 =
            conn.query_row("SELECT COUNT(*) FROM articles", [], |row| row.get(0))?;

        let source_count: i64 = conn.query_row(
            "SELECT COUNT(DISTINCT source_name) FROM articles",
            [],
            |row| row.get(0),
        )?;

        let summarized_count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM articles WHERE llm_summary IS NOT NULL AND llm_summary != ''",
            [],
            |row| row.get(0),
        )?;

        let (earliest_publication, latest_publication): (Option<String>, Option<String>) = conn
            .query_row(
                "SELECT MIN(publication_date), MAX(publication_date) FROM articles",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;

        let mut stmt = conn.prepare(
            "SELECT json_each.value, COUNT(*) FROM articles, json_each(articles.category)
             GROUP BY json_each.value",
        )?;
        let categories = stmt
            .query_map([], |row| {
                let count: i64 = row.get(1)?;
                Ok((row.get::<_, String>(0)?, count as usize))
            })?
            .collect::<std::result::Result<BTreeMap<_, _>, _>>()?;

        Ok(DatabaseStats {
            article_count: article_count as usize,
            source_count: source_count as usize,
            summarized_count: summarized_count as usize,
            categories,
            earliest_publication,
            latest_publication,
        })
    }

    /// Vacuum the database
    pub fn vacuum(&self) -> Result<()> {
        self.conn()?.execute("VACUUM", [])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::articles::test_support::*;

    #[test]
    fn test_stats_on_empty_db() {
        let db = seeded_db(&[]);
        let stats = db.get_stats().unwrap();
        assert_eq!(stats.article_count, 0);
        assert!(stats.categories.is_empty());
        assert!(stats.latest_publication.is_none());
    }

    #[test]
    fn test_stats_histogram() {
        let mut summarized = article("c", "C", &["technology"], 7);
        summarized.llm_summary = Some("Short summary.".to_string());
        let db = seeded_db(&[
            article("a", "A", &["sports", "world"], 1),
            article("b", "B", &["sports"], 3),
            summarized,
        ]);

        let stats = db.get_stats().unwrap();
        assert_eq!(stats.article_count, 3);
        assert_eq!(stats.source_count, 1);
        assert_eq!(stats.summarized_count, 1);
        assert_eq!(stats.categories.get("sports"), Some(&2));
        assert_eq!(stats.categories.get("world"), Some(&1));
        assert_eq!(stats.earliest_publication.as_deref(), Some("2025-03-01T12:00:00Z"));
        assert_eq!(stats.latest_publication.as_deref(), Some("2025-03-07T12:00:00Z"));
    }
}
