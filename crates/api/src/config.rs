use anyhow::{Context, Result};
use lookups::LookupConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub listen_addr: String,
    pub results_dir: String,
    pub llm: LlmConfig,
    pub neo4j: Neo4jConfig,
    pub lookups: LookupConfig,
    pub concurrency: ConcurrencyConfig,
    pub retry: RetryConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub base_url: String,
    pub extraction_model: String,
    pub assessment_model: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Neo4jConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConcurrencyConfig {
    /// Upper bound on subjects enriched at once within one branch.
    pub max_concurrent_subjects: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_retries: usize,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub enabled: bool,
    pub max_entries: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:3000".to_string(),
            results_dir: "data/results".to_string(),
            llm: LlmConfig::default(),
            neo4j: Neo4jConfig::default(),
            lookups: LookupConfig::default(),
            concurrency: ConcurrencyConfig::default(),
            retry: RetryConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            extraction_model: "llama3".to_string(),
            assessment_model: "llama3".to_string(),
            request_timeout_secs: 120,
        }
    }
}

impl Default for Neo4jConfig {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".to_string(),
            user: "neo4j".to_string(),
            password: "yourpassword".to_string(),
        }
    }
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self {
            max_concurrent_subjects: 5,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff_ms: 1000,
            max_backoff_ms: 10000,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: 10000,
        }
    }
}

impl AppConfig {
    /// Load from a JSON file when a path is given, defaults otherwise.
    /// Environment variables override connection settings either way.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut config = match path {
            Some(p) => {
                let raw = std::fs::read_to_string(p)
                    .with_context(|| format!("Failed to read config file {}", p))?;
                serde_json::from_str(&raw)
                    .with_context(|| format!("Failed to parse config file {}", p))?
            }
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(v) = std::env::var("NEO4J_URI") {
            self.neo4j.uri = v;
        }
        if let Ok(v) = std::env::var("NEO4J_USER") {
            self.neo4j.user = v;
        }
        if let Ok(v) = std::env::var("NEO4J_PASSWORD") {
            self.neo4j.password = v;
        }
        if let Ok(v) = std::env::var("OLLAMA_URL") {
            self.llm.base_url = v;
        }
        if let Ok(v) = std::env::var("RESULTS_DIR") {
            self.results_dir = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.concurrency.max_concurrent_subjects, 5);
        assert_eq!(config.retry.max_retries, 3);
        assert!(config.cache.enabled);
        assert_eq!(config.lookups.news_window_years, 3);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"results_dir": "/var/aml/results"}"#).unwrap();
        assert_eq!(config.results_dir, "/var/aml/results");
        assert_eq!(config.listen_addr, "0.0.0.0:3000");
        assert_eq!(config.llm.extraction_model, "llama3");
    }
}
