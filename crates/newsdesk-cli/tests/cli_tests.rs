//! Integration tests for the newsdesk binary

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const NEWS_DATA: &str = r#"[
    {"id": "t1", "title": "Chipmaker expands fab", "description": "New plant in Arizona",
     "url": "https://news.example.com/t1", "publication_date": "2025-03-20T08:00:00Z",
     "source_name": "Reuters", "category": ["technology"], "relevance_score": 0.9,
     "latitude": 33.45, "longitude": -112.07},
    {"id": "s1", "title": "Cup final recap", "description": "Late winner decides it",
     "url": "https://news.example.com/s1", "publication_date": "2025-03-21T20:00:00Z",
     "source_name": "ESPN", "category": ["sports"], "relevance_score": 0.7,
     "latitude": 51.55, "longitude": -0.28},
    {"id": "s2", "title": "Transfer window opens", "description": "Clubs line up bids",
     "url": "https://news.example.com/s2", "publication_date": "2025-03-22T09:00:00Z",
     "source_name": "ESPN", "category": ["sports"], "relevance_score": 0.5,
     "latitude": 53.48, "longitude": -2.24},
    {"id": "s3", "title": "Marathon record falls", "description": "Course record in Boston",
     "url": "https://news.example.com/s3", "publication_date": "2025-03-23T15:00:00Z",
     "source_name": "AP", "category": ["sports", "national"], "relevance_score": 0.6,
     "latitude": 42.35, "longitude": -71.06},
    {"id": "w1", "title": "Elon Musk visits Palo Alto campus", "description": "Tour of the lab",
     "url": "https://news.example.com/w1", "publication_date": "2025-03-24T11:00:00Z",
     "source_name": "AP", "category": ["business"], "relevance_score": 0.8,
     "latitude": 37.44, "longitude": -122.14},
    {"title": "Broken record", "source_name": "AP", "category": ["world"]}
]"#;

struct Fixture {
    _data_dir: TempDir,
    db_dir: TempDir,
    data_file: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let data_dir = TempDir::new().unwrap();
        let db_dir = TempDir::new().unwrap();
        let data_file = data_dir.path().join("news.json");
        fs::write(&data_file, NEWS_DATA).unwrap();
        Self {
            _data_dir: data_dir,
            db_dir,
            data_file,
        }
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("newsdesk").unwrap();
        cmd.env("NEWSDESK_DB", self.db_dir.path().join("news.sqlite"))
            .env_remove("NEWSDESK_LLM_API_KEY")
            .arg("--config")
            .arg(self.config_file());
        cmd
    }

    /// Config path passed to every command; only exists once written
    fn config_file(&self) -> PathBuf {
        self.db_dir.path().join("config.yml")
    }

    fn ingested() -> Self {
        let fixture = Self::new();
        fixture
            .cmd()
            .arg("ingest")
            .arg(&fixture.data_file)
            .assert()
            .success();
        fixture
    }

    fn json(&self, args: &[&str]) -> serde_json::Value {
        let output = self
            .cmd()
            .args(["--format", "json"])
            .args(args)
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        serde_json::from_slice(&output).unwrap()
    }
}

#[test]
fn test_ingest_reports_counts() {
    let fixture = Fixture::new();
    fixture
        .cmd()
        .arg("ingest")
        .arg(&fixture.data_file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Ingested 5 of 6 articles"))
        .stdout(predicate::str::contains("Skipped 1"));

    let report = fixture.json(&["ingest", fixture.data_file.to_str().unwrap(), "--clear"]);
    assert_eq!(report["cleared"], 5);
    assert_eq!(report["inserted"], 5);
}

#[test]
fn test_status() {
    let fixture = Fixture::ingested();
    fixture
        .cmd()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Articles:        5"));

    let stats = fixture.json(&["status"]);
    assert_eq!(stats["categories"]["sports"], 3);
    assert_eq!(stats["source_count"], 3);
}

#[test]
fn test_ask_sports_with_limit() {
    let fixture = Fixture::ingested();
    let response = fixture.json(&["ask", "sports", "-n", "3", "--analysis"]);

    assert_eq!(response["total"], 3);
    assert_eq!(response["cache_hit"], false);
    assert_eq!(response["analysis"]["intent"], "category");
    assert_eq!(response["routing_strategy"]["strategy_type"], "single");
    for article in response["articles"].as_array().unwrap() {
        let categories = article["category"].as_array().unwrap();
        assert!(categories.contains(&serde_json::json!("sports")));
    }
}

#[test]
fn test_ask_without_limit_uses_configured_default() {
    let fixture = Fixture::ingested();
    fs::write(fixture.config_file(), "query:\n  default_limit: 2\n").unwrap();

    let response = fixture.json(&["ask", "sports"]);
    assert_eq!(response["total"], 2);

    let response = fixture.json(&["ask", "sports", "-n", "3"]);
    assert_eq!(response["total"], 3);
}

#[test]
fn test_ask_free_text_falls_back_to_search() {
    let fixture = Fixture::ingested();
    let response = fixture.json(&[
        "ask",
        "Show me news about Elon Musk near Palo Alto",
        "--analysis",
    ]);

    assert_eq!(response["analysis"]["intent"], "search");
    assert_eq!(response["routing_strategy"]["primary_endpoint"], "search");
    assert!(response["total"].as_u64().unwrap() <= 5);
    assert_eq!(
        response["query"],
        "Show me news about Elon Musk near Palo Alto"
    );
}

#[test]
fn test_ask_validation_exit_code() {
    let fixture = Fixture::ingested();
    fixture
        .cmd()
        .args(["ask", "   "])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Query cannot be empty"));

    fixture
        .cmd()
        .args(["ask", "sports", "-n", "50"])
        .assert()
        .code(3);

    fixture
        .cmd()
        .args(["ask", "news", "--lat", "95", "--lon", "0"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Latitude"));
}

#[test]
fn test_direct_retrieval_commands() {
    let fixture = Fixture::ingested();

    let sports = fixture.json(&["category", "sports", "-n", "2"]);
    let ids: Vec<&str> = sports
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["s3", "s2"]);

    let espn = fixture.json(&["source", "espn"]);
    assert_eq!(espn.as_array().unwrap().len(), 2);

    let scored = fixture.json(&["score", "--min", "0.75"]);
    let ids: Vec<&str> = scored
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["t1", "w1"]);

    fixture
        .cmd()
        .args(["search", "cup", "final"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cup final recap"));
}

#[test]
fn test_nearby_command() {
    let fixture = Fixture::ingested();

    let near = fixture.json(&["nearby", "--lat", "37.40", "--lon", "-122.10", "--radius", "25"]);
    let results = near.as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["id"], "w1");
    assert!(results[0]["distance_km"].as_f64().unwrap() < 10.0);

    fixture
        .cmd()
        .args(["nearby", "--lat", "37.4", "--lon", "-190"])
        .assert()
        .code(3);
}
