//! Database layer for newsdesk
//!
//! Provides SQLite-based article storage with:
//! - Category, text, source, score and geospatial retrieval
//! - Case-insensitive matching and great-circle distance as SQL functions
//! - An async [`ArticleStore`] facade for the query pipeline

mod articles;
mod functions;
mod schema;
mod stats;
mod store;

pub use articles::{Article, ArticleSummaryView, GeoPoint};
pub(crate) use articles::clamp_score;
pub use functions::{great_circle_km, round2, EARTH_RADIUS_KM};
pub use schema::Database;
pub use stats::DatabaseStats;
pub use store::ArticleStore;
use std::path::PathBuf;

impl Database {
    /// Get the default database path
    pub fn default_path() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(crate::CACHE_DIR_NAME)
            .join("news.sqlite")
    }
}
