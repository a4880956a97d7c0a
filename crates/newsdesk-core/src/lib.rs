//! NewsDesk Core Library
//!
//! Core functionality for the newsdesk contextual news retrieval service.
//!
//! # Features
//! - SQLite article store with category, text, source, score and geo retrieval
//! - LLM query analysis with keyword heuristics as fallback
//! - Intent-based routing with multi-endpoint merging
//! - Concurrent article summarization with per-article timeouts
//! - JSON news data ingestion

pub mod config;
pub mod db;
pub mod error;
pub mod ingest;
pub mod llm;
pub mod search;

pub use config::{Config, LLMServiceConfig, QueryConfig};
pub use db::{Article, ArticleStore, ArticleSummaryView, Database, DatabaseStats, GeoPoint};
pub use error::{Error, NewsDeskError, Result};
pub use ingest::{ingest_path, IngestReport};
pub use llm::{
    ChatMessage, Intent, LLMClient, LLMGateway, MetricsSnapshot, QueryAnalysis, QueryAnalyzer,
    SummaryEnricher,
};
pub use search::{
    build_strategy, Endpoint, EndpointParams, RetrievalExecutor, RoutingStrategy,
    SmartQueryRequest, SmartQueryResponse, SmartQueryService, StrategyType,
};

/// Default cache directory name
pub const CACHE_DIR_NAME: &str = "newsdesk";

/// Default config directory name
pub const CONFIG_DIR_NAME: &str = "newsdesk";
