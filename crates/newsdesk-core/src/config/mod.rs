//! Configuration management

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Database path override (falls back to `NEWSDESK_DB`, then the cache dir)
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// LLM service configuration
    #[serde(default)]
    pub llm_service: LLMServiceConfig,

    /// Smart query tuning
    #[serde(default)]
    pub query: QueryConfig,
}

/// LLM service configuration for the completion gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMServiceConfig {
    /// Base URL of the chat/completions service
    pub url: String,

    /// Model name for chat completions
    #[serde(default = "default_chat_model")]
    pub model: String,

    /// API key. The gateway is only considered configured when this is set.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Additional fully-qualified completion URLs tried after the derived ones
    #[serde(default = "default_extra_endpoints")]
    pub extra_endpoints: Vec<String>,

    /// Per-attempt request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl LLMServiceConfig {
    /// Whether enough is configured to talk to a real service
    pub fn is_configured(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

impl Default for LLMServiceConfig {
    fn default() -> Self {
        Self {
            url: std::env::var("NEWSDESK_LLM_URL")
                .unwrap_or_else(|_| "https://api.cursor.sh".to_string()),
            model: default_chat_model(),
            api_key: std::env::var("NEWSDESK_LLM_API_KEY").ok(),
            extra_endpoints: default_extra_endpoints(),
            timeout_secs: default_timeout(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

fn default_chat_model() -> String {
    std::env::var("NEWSDESK_LLM_MODEL").unwrap_or_else(|_| "gpt-4".to_string())
}

fn default_extra_endpoints() -> Vec<String> {
    vec!["https://api.openai.com/v1/chat/completions".to_string()]
}

fn default_timeout() -> u64 {
    30
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_temperature() -> f32 {
    0.3
}

/// Limits and budgets for the smart query pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    pub default_limit: usize,
    pub min_limit: usize,
    pub max_limit: usize,
    pub max_query_chars: usize,
    /// Hard cap applied to any single retrieval call
    pub retrieval_cap: usize,
    /// The primary call of a mixed strategy receives `limit / mixed_primary_divisor`
    pub mixed_primary_divisor: usize,
    /// Per-call cap for secondary endpoints of a mixed strategy
    pub secondary_cap: usize,
    pub store_timeout_ms: u64,
    pub summary_timeout_secs: u64,
    pub analysis_timeout_secs: u64,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_limit: 5,
            min_limit: 1,
            max_limit: 20,
            max_query_chars: 500,
            retrieval_cap: 100,
            mixed_primary_divisor: 2,
            secondary_cap: 3,
            store_timeout_ms: 5000,
            summary_timeout_secs: 30,
            analysis_timeout_secs: 60,
        }
    }
}

impl QueryConfig {
    /// Clamp a requested limit into the configured range
    pub fn clamp_limit(&self, limit: usize) -> usize {
        limit.clamp(self.min_limit, self.max_limit.max(self.min_limit))
    }

    /// Clamp a direct retrieval limit into `1..=retrieval_cap`
    pub fn clamp_retrieval(&self, limit: usize) -> usize {
        limit.clamp(1, self.retrieval_cap.max(1))
    }
}

impl Config {
    /// Load config from default path
    pub fn load() -> Result<Self> {
        Self::load_from(Self::default_path())
    }

    /// Load config from an explicit path, using defaults when the file is absent
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_yaml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(crate::CONFIG_DIR_NAME)
            .join("config.yml")
    }

    /// Resolve the database path: config, then `NEWSDESK_DB`, then the cache dir
    pub fn database_path(&self) -> PathBuf {
        if let Some(ref path) = self.database_path {
            return path.clone();
        }
        std::env::var("NEWSDESK_DB")
            .map(PathBuf::from)
            .unwrap_or_else(|_| crate::Database::default_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(dir.path().join("absent.yml")).unwrap();
        assert_eq!(config.query.default_limit, 5);
        assert_eq!(config.query.secondary_cap, 3);
        assert_eq!(config.llm_service.timeout_secs, 30);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yml");
        std::fs::write(
            &path,
            "llm_service:\n  url: http://localhost:9000\n  api_key: secret\nquery:\n  max_limit: 10\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.llm_service.url, "http://localhost:9000");
        assert!(config.llm_service.is_configured());
        assert_eq!(config.llm_service.max_tokens, 1000);
        assert_eq!(config.query.max_limit, 10);
        assert_eq!(config.query.min_limit, 1);
    }

    #[test]
    fn test_clamp_limit() {
        let query = QueryConfig::default();
        assert_eq!(query.clamp_limit(0), 1);
        assert_eq!(query.clamp_limit(7), 7);
        assert_eq!(query.clamp_limit(500), 20);
        assert_eq!(query.clamp_retrieval(0), 1);
        assert_eq!(query.clamp_retrieval(250), 100);
    }

    #[test]
    fn test_blank_api_key_is_not_configured() {
        let config = LLMServiceConfig {
            api_key: Some("  ".to_string()),
            ..LLMServiceConfig::default()
        };
        assert!(!config.is_configured());
    }
}
