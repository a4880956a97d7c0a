//! End-to-end smart query tests over an on-disk article store
//!
//! Articles are ingested from a JSON file, then queried through the full
//! analyze/route/retrieve/enrich pipeline with and without a live LLM.

use httpmock::prelude::*;
use newsdesk_core::llm::MOCK_SUMMARY;
use newsdesk_core::{
    ingest_path, Config, Database, Endpoint, Intent, LLMServiceConfig, SmartQueryRequest,
    SmartQueryService, StrategyType,
};
use serde_json::json;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

const NEWS_DATA: &str = r#"[
    {"id": "t1", "title": "Chipmaker expands fab", "description": "New plant announced",
     "url": "https://news.example.com/t1", "publication_date": "2025-03-20T08:00:00Z",
     "source_name": "Reuters", "category": ["technology"], "relevance_score": 0.9,
     "latitude": 33.45, "longitude": -112.07},
    {"id": "t2", "title": "Phone makers bet on AI", "description": "On-device models",
     "url": "https://news.example.com/t2", "publication_date": "2025-03-22T08:00:00Z",
     "source_name": "The Verge", "category": ["technology", "business"], "relevance_score": 0.6,
     "latitude": 37.77, "longitude": -122.42},
    {"id": "s1", "title": "Cup final recap", "description": "Late winner decides it",
     "url": "https://news.example.com/s1", "publication_date": "2025-03-21T20:00:00Z",
     "source_name": "ESPN", "category": ["sports"], "relevance_score": 0.7,
     "latitude": 51.55, "longitude": -0.28},
    {"id": "w1", "title": "Summit ends without deal", "description": "Talks to resume",
     "url": "https://news.example.com/w1", "publication_date": "2025-03-23T11:00:00Z",
     "source_name": "AP", "category": ["world"], "relevance_score": 0.8,
     "latitude": 46.2, "longitude": 6.14}
]"#;

fn setup() -> (TempDir, Database) {
    let temp_dir = TempDir::new().unwrap();
    let data_file = temp_dir.path().join("news.json");
    fs::write(&data_file, NEWS_DATA).unwrap();

    let db = Database::open(temp_dir.path().join("news.sqlite")).unwrap();
    db.initialize().unwrap();
    let report = ingest_path(&db, &data_file, false).unwrap();
    assert_eq!(report.inserted, 4);

    (temp_dir, db)
}

fn config_with_llm(url: &str) -> Config {
    Config {
        llm_service: LLMServiceConfig {
            url: url.to_string(),
            model: "test-model".to_string(),
            api_key: Some("test-key".to_string()),
            extra_endpoints: vec![],
            timeout_secs: 2,
            max_tokens: 500,
            temperature: 0.3,
        },
        ..Config::default()
    }
}

#[tokio::test]
async fn test_llm_backed_query_with_summaries() {
    let (_temp_dir, db) = setup();
    let server = MockServer::start_async().await;

    let analysis = json!({
        "intent": "category",
        "entities": {"topics": ["semiconductors"]},
        "parameters": {"category": "technology"},
        "confidence": 0.9,
        "reasoning": "Asks about the chip industry"
    });
    let analysis_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/chat/completions")
            .body_includes("news query analyzer");
        then.status(200).json_body(json!({
            "choices": [{"message": {"role": "assistant", "content": analysis.to_string()}}]
        }));
    });
    let summary_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/chat/completions")
            .body_includes("news article summarizer");
        then.status(200).json_body(json!({
            "choices": [{"message": {"role": "assistant", "content": "```\nChip news in brief.\n```"}}]
        }));
    });

    let service =
        SmartQueryService::from_config(Arc::new(db.clone()), &config_with_llm(&server.base_url()))
            .unwrap();
    let response = service
        .process_smart_query(SmartQueryRequest::new("what is new with chips").with_analysis(true))
        .await
        .unwrap();

    analysis_mock.assert_calls(1);
    summary_mock.assert_calls(2);

    let analysis = response.analysis.unwrap();
    assert_eq!(analysis.intent, Intent::Category);
    assert_eq!(analysis.confidence, 0.9);

    let strategy = response.routing_strategy.unwrap();
    assert_eq!(strategy.primary_endpoint, Endpoint::Category);
    assert_eq!(strategy.strategy_type, StrategyType::Single);

    let ids: Vec<&str> = response.articles.iter().map(|a| a.id()).collect();
    assert_eq!(ids, vec!["t2", "t1"]);
    for view in &response.articles {
        assert_eq!(view.article.llm_summary.as_deref(), Some("Chip news in brief."));
    }
}

#[tokio::test]
async fn test_llm_outage_degrades_to_mock_completions() {
    let (_temp_dir, db) = setup();

    // Nothing listens on the discard port
    let service =
        SmartQueryService::from_config(Arc::new(db.clone()), &config_with_llm("http://127.0.0.1:9"))
            .unwrap();
    let response = service
        .process_smart_query(SmartQueryRequest::new("latest tech stories").with_analysis(true))
        .await
        .unwrap();

    let analysis = response.analysis.unwrap();
    assert_eq!(analysis.intent, Intent::Category);
    assert_eq!(analysis.parameters.category.as_deref(), Some("technology"));
    assert_eq!(response.total, 2);
    for view in &response.articles {
        assert_eq!(view.article.llm_summary.as_deref(), Some(MOCK_SUMMARY));
    }
}

#[tokio::test]
async fn test_heuristic_query_without_llm() {
    let (_temp_dir, db) = setup();
    let config = Config {
        llm_service: LLMServiceConfig {
            api_key: None,
            ..LLMServiceConfig::default()
        },
        ..Config::default()
    };
    let service = SmartQueryService::from_config(Arc::new(db.clone()), &config).unwrap();

    let response = service
        .process_smart_query(
            SmartQueryRequest::new("Latest technology news")
                .with_limit(1)
                .with_analysis(true),
        )
        .await
        .unwrap();

    let analysis = response.analysis.unwrap();
    assert_eq!(analysis.intent, Intent::Category);
    assert_eq!(analysis.confidence, 0.6);
    assert_eq!(response.total, 1);
    assert_eq!(response.articles[0].id(), "t2");
    assert!(response.articles[0].article.llm_summary.is_none());

    // Summaries are never written back
    let stored = db.get_article("t2").unwrap().unwrap();
    assert!(stored.llm_summary.is_none());
}

#[tokio::test]
async fn test_concurrent_queries_share_the_store() {
    let (_temp_dir, db) = setup();
    let service = Arc::new(SmartQueryService::from_parts(
        Arc::new(db),
        None,
        Default::default(),
    ));

    let handles: Vec<_> = ["sports", "world", "technology", "business"]
        .into_iter()
        .map(|query| {
            let service = service.clone();
            tokio::spawn(async move {
                service
                    .process_smart_query(SmartQueryRequest::new(query))
                    .await
                    .unwrap()
            })
        })
        .collect();

    let mut totals = Vec::new();
    for handle in handles {
        totals.push(handle.await.unwrap().total);
    }
    assert_eq!(totals, vec![1, 1, 2, 1]);
}
