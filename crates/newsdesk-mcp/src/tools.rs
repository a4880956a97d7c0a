//! MCP tool definitions and handlers

use crate::protocol::*;
use anyhow::Result;
use newsdesk_core::search::{DEFAULT_MIN_SCORE, DEFAULT_RADIUS_KM};
use newsdesk_core::{
    ArticleStore, ArticleSummaryView, Database, GeoPoint, NewsDeskError, QueryConfig,
    SmartQueryRequest, SmartQueryService,
};
use serde_json::Value;

/// Limit used by the direct retrieval tools when none is given
pub const DEFAULT_TOOL_LIMIT: usize = 20;

fn limit_property(default: usize) -> Value {
    serde_json::json!({
        "type": "integer",
        "description": format!("Maximum results (default: {})", default),
        "default": default
    })
}

pub fn smart_query_tool_definition() -> ToolDefinition {
    ToolDefinition {
        name: "smart_query".to_string(),
        description: "Answer a free-text news question: infers intent, routes to the best \
                      retrieval and optionally summarizes each article"
            .to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Natural language query (1-500 characters)"
                },
                "location": {
                    "type": "object",
                    "description": "Caller location for nearby questions",
                    "properties": {
                        "lat": { "type": "number" },
                        "lon": { "type": "number" }
                    },
                    "required": ["lat", "lon"]
                },
                "limit": {
                    "type": "integer",
                    "description": "Maximum articles, 1-20 (default: the configured query.default_limit)"
                },
                "include_summary": {
                    "type": "boolean",
                    "description": "Attach generated summaries (default: true)",
                    "default": true
                },
                "include_analysis": {
                    "type": "boolean",
                    "description": "Include query analysis and routing strategy (default: false)",
                    "default": false
                }
            },
            "required": ["query"]
        }),
    }
}

pub fn category_tool_definition() -> ToolDefinition {
    ToolDefinition {
        name: "category".to_string(),
        description: "Latest articles tagged with a category".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "category": {
                    "type": "string",
                    "description": "Category tag (technology, business, sports, world, ...)"
                },
                "limit": limit_property(DEFAULT_TOOL_LIMIT)
            },
            "required": ["category"]
        }),
    }
}

pub fn search_tool_definition() -> ToolDefinition {
    ToolDefinition {
        name: "search".to_string(),
        description: "Case-insensitive text search over titles and descriptions".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Text to look for"
                },
                "limit": limit_property(DEFAULT_TOOL_LIMIT)
            },
            "required": ["query"]
        }),
    }
}

pub fn source_tool_definition() -> ToolDefinition {
    ToolDefinition {
        name: "source".to_string(),
        description: "Latest articles from a news source".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "source": {
                    "type": "string",
                    "description": "Source name or part of it"
                },
                "limit": limit_property(DEFAULT_TOOL_LIMIT)
            },
            "required": ["source"]
        }),
    }
}

pub fn score_tool_definition() -> ToolDefinition {
    ToolDefinition {
        name: "score".to_string(),
        description: "Most relevant articles at or above a relevance threshold".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "min_score": {
                    "type": "number",
                    "description": format!("Minimum relevance 0-1 (default: {})", DEFAULT_MIN_SCORE),
                    "default": DEFAULT_MIN_SCORE
                },
                "limit": limit_property(DEFAULT_TOOL_LIMIT)
            }
        }),
    }
}

pub fn nearby_tool_definition() -> ToolDefinition {
    ToolDefinition {
        name: "nearby".to_string(),
        description: "Articles located within a radius of a point, closest first".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "lat": { "type": "number", "description": "Latitude (-90 to 90)" },
                "lon": { "type": "number", "description": "Longitude (-180 to 180)" },
                "radius_km": {
                    "type": "number",
                    "description": format!("Search radius in km (default: {})", DEFAULT_RADIUS_KM),
                    "default": DEFAULT_RADIUS_KM
                },
                "limit": limit_property(DEFAULT_TOOL_LIMIT)
            },
            "required": ["lat", "lon"]
        }),
    }
}

pub fn status_tool_definition() -> ToolDefinition {
    ToolDefinition {
        name: "status".to_string(),
        description: "Article store statistics".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {}
        }),
    }
}

/// All tool definitions in listing order
pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        smart_query_tool_definition(),
        category_tool_definition(),
        search_tool_definition(),
        source_tool_definition(),
        score_tool_definition(),
        nearby_tool_definition(),
        status_tool_definition(),
    ]
}

fn required_str<'a>(args: &'a Value, key: &str) -> Result<&'a str> {
    args.get(key)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| NewsDeskError::Validation(format!("Missing {}", key)).into())
}

fn required_f64(args: &Value, key: &str) -> Result<f64> {
    args.get(key)
        .and_then(|v| v.as_f64())
        .ok_or_else(|| NewsDeskError::Validation(format!("Missing {}", key)).into())
}

fn tool_limit(args: &Value, config: &QueryConfig) -> usize {
    let limit = args
        .get("limit")
        .and_then(|v| v.as_u64())
        .map(|v| v as usize)
        .unwrap_or(DEFAULT_TOOL_LIMIT);
    config.clamp_retrieval(limit)
}

/// One line per article plus optional summary and distance lines
pub fn render_articles(header: &str, articles: &[ArticleSummaryView]) -> String {
    let mut text = header.to_string();
    for (idx, view) in articles.iter().enumerate() {
        let article = &view.article;
        text.push_str(&format!(
            "\n{}. {} ({}, {})",
            idx + 1,
            article.title,
            article.source_name,
            article.publication_date.format("%Y-%m-%d")
        ));
        if let Some(distance) = view.distance_km {
            text.push_str(&format!(" - {:.2} km", distance));
        }
        text.push_str(&format!("\n   {}", article.url));
        if let Some(ref summary) = article.llm_summary {
            text.push_str(&format!("\n   {}", summary));
        }
    }
    text
}

fn listing_result(header: String, articles: Vec<ArticleSummaryView>, params: Value) -> ToolResult {
    let text = render_articles(&header, &articles);
    let structured = serde_json::json!({
        "total": articles.len(),
        "parameters": params,
        "articles": articles,
    });
    ToolResult::success(text, structured)
}

pub async fn handle_smart_query(service: &SmartQueryService, args: Value) -> Result<ToolResult> {
    let request: SmartQueryRequest = serde_json::from_value(args)
        .map_err(|e| NewsDeskError::Validation(format!("Malformed smart query: {}", e)))?;

    let response = service.process_smart_query(request).await?;

    let mut text = render_articles(
        &format!(
            "Found {} articles for \"{}\" in {}ms",
            response.total, response.query, response.processing_time_ms
        ),
        &response.articles,
    );
    if let Some(ref strategy) = response.routing_strategy {
        text.push_str(&format!(
            "\n\nRouted via {} ({:?}, confidence {:.2})",
            strategy.primary_endpoint, strategy.strategy_type, strategy.confidence
        ));
    }

    Ok(ToolResult::success(text, serde_json::to_value(&response)?))
}

pub async fn handle_category(
    store: &dyn ArticleStore,
    config: &QueryConfig,
    args: Value,
) -> Result<ToolResult> {
    let category = required_str(&args, "category")?;
    let limit = tool_limit(&args, config);

    let articles = store.by_category(category, limit).await?;
    Ok(listing_result(
        format!("{} articles in category \"{}\"", articles.len(), category),
        articles,
        serde_json::json!({ "category": category, "limit": limit }),
    ))
}

pub async fn handle_search(
    store: &dyn ArticleStore,
    config: &QueryConfig,
    args: Value,
) -> Result<ToolResult> {
    let query = required_str(&args, "query")?;
    let limit = tool_limit(&args, config);

    let articles = store.by_search(query, limit).await?;
    Ok(listing_result(
        format!("Found {} results for \"{}\"", articles.len(), query),
        articles,
        serde_json::json!({ "query": query, "limit": limit }),
    ))
}

pub async fn handle_source(
    store: &dyn ArticleStore,
    config: &QueryConfig,
    args: Value,
) -> Result<ToolResult> {
    let source = required_str(&args, "source")?;
    let limit = tool_limit(&args, config);

    let articles = store.by_source(source, limit).await?;
    Ok(listing_result(
        format!("{} articles from \"{}\"", articles.len(), source),
        articles,
        serde_json::json!({ "source": source, "limit": limit }),
    ))
}

pub async fn handle_score(
    store: &dyn ArticleStore,
    config: &QueryConfig,
    args: Value,
) -> Result<ToolResult> {
    let min_score = args
        .get("min_score")
        .and_then(|v| v.as_f64())
        .unwrap_or(DEFAULT_MIN_SCORE);
    if !(0.0..=1.0).contains(&min_score) {
        return Err(NewsDeskError::Validation("min_score must be between 0 and 1".to_string()).into());
    }
    let limit = tool_limit(&args, config);

    let articles = store.by_score(min_score, limit).await?;
    Ok(listing_result(
        format!("{} articles with relevance >= {}", articles.len(), min_score),
        articles,
        serde_json::json!({ "min_score": min_score, "limit": limit }),
    ))
}

pub async fn handle_nearby(
    store: &dyn ArticleStore,
    config: &QueryConfig,
    args: Value,
) -> Result<ToolResult> {
    let point = GeoPoint::new(required_f64(&args, "lat")?, required_f64(&args, "lon")?);
    point.validate()?;
    let radius_km = args
        .get("radius_km")
        .and_then(|v| v.as_f64())
        .unwrap_or(DEFAULT_RADIUS_KM);
    if radius_km <= 0.0 {
        return Err(NewsDeskError::Validation("radius_km must be positive".to_string()).into());
    }
    let limit = tool_limit(&args, config);

    let articles = store.nearby(point.lat, point.lon, radius_km, limit).await?;
    Ok(listing_result(
        format!(
            "{} articles within {} km of ({}, {})",
            articles.len(),
            radius_km,
            point.lat,
            point.lon
        ),
        articles,
        serde_json::json!({
            "lat": point.lat,
            "lon": point.lon,
            "radius_km": radius_km,
            "limit": limit
        }),
    ))
}

pub async fn handle_status(db: &Database) -> Result<ToolResult> {
    let stats = db.get_stats()?;

    let mut summary = format!(
        "Articles: {} from {} sources\nSummarized: {}",
        stats.article_count, stats.source_count, stats.summarized_count
    );
    if let (Some(earliest), Some(latest)) =
        (&stats.earliest_publication, &stats.latest_publication)
    {
        summary.push_str(&format!("\nPublished: {} to {}", earliest, latest));
    }
    if !stats.categories.is_empty() {
        summary.push_str("\n\nCategories:");
        for (category, count) in &stats.categories {
            summary.push_str(&format!("\n  - {}: {}", category, count));
        }
    }

    Ok(ToolResult::success(summary, serde_json::to_value(&stats)?))
}
