//! News data ingestion
//!
//! Loads JSON arrays of raw article records from a file or a directory tree,
//! validates them and upserts them into the [`Database`] in batches.

mod transform;

pub use transform::{
    article_id_from_url, parse_publication_date, transform_article, CategoryField, RawArticle,
};

use crate::db::{Article, Database};
use crate::error::{NewsDeskError, Result};
use chrono::Utc;
use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Articles per insert transaction
pub const BATCH_SIZE: usize = 100;

/// Validated articles from one or more files
#[derive(Debug, Default)]
pub struct LoadedArticles {
    pub files: Vec<PathBuf>,
    pub articles: Vec<Article>,
    /// Records seen, valid or not
    pub total: usize,
    /// Records rejected by validation
    pub invalid: usize,
}

impl LoadedArticles {
    fn merge(&mut self, other: LoadedArticles) {
        self.files.extend(other.files);
        self.articles.extend(other.articles);
        self.total += other.total;
        self.invalid += other.invalid;
    }
}

/// Outcome of an ingestion run
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
    pub files: usize,
    pub total: usize,
    pub processed: usize,
    pub inserted: usize,
    pub errors: usize,
    pub cleared: usize,
}

/// Parse a JSON array of raw article records
pub fn parse_articles(json: &str) -> Result<LoadedArticles> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    let serde_json::Value::Array(records) = value else {
        return Err(NewsDeskError::Validation(
            "News data must be a list of articles".to_string(),
        ));
    };

    let now = Utc::now();
    let mut loaded = LoadedArticles {
        total: records.len(),
        ..LoadedArticles::default()
    };

    for (idx, record) in records.into_iter().enumerate() {
        let result = serde_json::from_value::<RawArticle>(record)
            .map_err(NewsDeskError::from)
            .and_then(|raw| transform_article(raw, now));

        match result {
            Ok(article) => loaded.articles.push(article),
            Err(e) => {
                tracing::warn!("Skipping article {}: {}", idx, e);
                loaded.invalid += 1;
            }
        }
    }

    Ok(loaded)
}

/// Load one news data file
pub fn load_news_file(path: &Path) -> Result<LoadedArticles> {
    tracing::info!("Loading news data from {}", path.display());
    let content = std::fs::read_to_string(path)?;
    let mut loaded = parse_articles(&content)?;
    loaded.files.push(path.to_path_buf());
    tracing::info!(
        "Loaded {} of {} articles from {}",
        loaded.articles.len(),
        loaded.total,
        path.display()
    );
    Ok(loaded)
}

/// Load a file, or every `*.json` file under a directory in path order
pub fn load_path(path: &Path) -> Result<LoadedArticles> {
    if !path.exists() {
        return Err(NewsDeskError::Validation(format!(
            "News data not found: {}",
            path.display()
        )));
    }
    if path.is_file() {
        return load_news_file(path);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(path).follow_links(true).sort_by_file_name() {
        let entry = entry?;
        let is_json = entry
            .path()
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if entry.file_type().is_file() && is_json {
            files.push(entry.into_path());
        }
    }

    let mut loaded = LoadedArticles::default();
    for file in files {
        loaded.merge(load_news_file(&file)?);
    }
    Ok(loaded)
}

/// Load `path` and upsert its articles, optionally wiping the table first
pub fn ingest_path(db: &Database, path: &Path, clear_existing: bool) -> Result<IngestReport> {
    let loaded = load_path(path)?;

    let cleared = if clear_existing {
        let removed = db.clear_articles()?;
        tracing::info!("Cleared {} existing articles", removed);
        removed
    } else {
        0
    };

    let mut report = IngestReport {
        files: loaded.files.len(),
        total: loaded.total,
        processed: loaded.articles.len(),
        errors: loaded.invalid,
        cleared,
        ..IngestReport::default()
    };

    for (idx, batch) in loaded.articles.chunks(BATCH_SIZE).enumerate() {
        let (inserted, failed) = db.insert_articles(batch)?;
        report.inserted += inserted;
        report.errors += failed;
        tracing::debug!("Batch {}: {} inserted, {} failed", idx + 1, inserted, failed);
    }

    tracing::info!(
        "Ingestion completed: {} of {} articles inserted, {} errors",
        report.inserted,
        report.total,
        report.errors
    );
    Ok(report)
}
