//! Raw article records to validated [`Article`]s

use crate::db::{clamp_score, Article, GeoPoint};
use crate::error::{NewsDeskError, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use sha2::{Digest, Sha256};

/// Article record as found in news data files
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawArticle {
    pub id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub publication_date: Option<String>,
    pub source_name: Option<String>,
    pub category: Option<CategoryField>,
    pub relevance_score: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Category given as a single tag or a list of tags
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CategoryField {
    One(String),
    Many(Vec<String>),
}

impl CategoryField {
    fn into_tags(self) -> Vec<String> {
        let tags = match self {
            CategoryField::One(tag) => vec![tag],
            CategoryField::Many(tags) => tags,
        };
        tags.into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect()
    }
}

/// Article id derived from its URL: first 12 hex chars of the SHA-256
pub fn article_id_from_url(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    format!("{:x}", hasher.finalize()).chars().take(12).collect()
}

/// Parse a publication date, accepting RFC 3339 or a bare ISO date-time taken as UTC
pub fn parse_publication_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn required(value: Option<String>, field: &str) -> Result<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| NewsDeskError::Validation(format!("missing {}", field)))
}

/// Validate and normalize one raw record
///
/// Unparsable dates become `now`; relevance is clamped to [0, 1].
pub fn transform_article(raw: RawArticle, now: DateTime<Utc>) -> Result<Article> {
    let title = required(raw.title, "title")?;
    let url = required(raw.url, "url")?;
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(NewsDeskError::Validation(format!("invalid url: {}", url)));
    }
    let source_name = required(raw.source_name, "source_name")?;

    let category = raw.category.map(CategoryField::into_tags).unwrap_or_default();
    if category.is_empty() {
        return Err(NewsDeskError::Validation("missing category".to_string()));
    }

    let point = GeoPoint::new(raw.latitude.unwrap_or(0.0), raw.longitude.unwrap_or(0.0));
    if !point.is_valid() {
        return Err(NewsDeskError::Validation(format!(
            "coordinates out of range: ({}, {})",
            point.lat, point.lon
        )));
    }

    let publication_date = match raw.publication_date.as_deref() {
        Some(value) => parse_publication_date(value).unwrap_or_else(|| {
            tracing::debug!("Unparsable publication date '{}', using now", value);
            now
        }),
        None => now,
    };

    let id = raw
        .id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| article_id_from_url(&url));

    Ok(Article {
        id,
        title,
        description: raw.description.unwrap_or_default().trim().to_string(),
        url,
        publication_date,
        source_name,
        category,
        relevance_score: clamp_score(raw.relevance_score.unwrap_or(0.0)),
        latitude: point.lat,
        longitude: point.lon,
        llm_summary: None,
    })
}
