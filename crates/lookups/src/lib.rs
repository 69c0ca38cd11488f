pub mod cache;
pub mod knowledge_graph;
pub mod news;
pub mod pep;
pub mod registry;
pub mod retry;
pub mod sanctions;

pub use cache::FindingsCache;
pub use retry::RetryPolicy;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// The external sources a subject can be checked against. The `key` values
/// are the findings-map keys the rest of the pipeline (and the persisted
/// documents) use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    Registry,
    Sanctions,
    KnowledgeGraph,
    Pep,
    News,
}

impl Source {
    pub fn key(&self) -> &'static str {
        match self {
            Source::Registry => "opencorporates",
            Source::Sanctions => "sanctions",
            Source::KnowledgeGraph => "wikidata",
            Source::Pep => "pep",
            Source::News => "news",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectKind {
    Organization,
    Person,
}

impl SubjectKind {
    /// The kind string screening sources expect.
    pub fn screening_kind(&self) -> &'static str {
        match self {
            SubjectKind::Organization => "Company",
            SubjectKind::Person => "Person",
        }
    }
}

/// Explicit record of a failed lookup. Serialized into the findings map in
/// place of the source payload so failures stay inspectable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FailureMarker {
    pub status: String,
    pub error: String,
}

/// One source's outcome for one subject: either the source's payload
/// (opaque JSON) or a failure marker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Finding {
    Failed(FailureMarker),
    Ok(Value),
}

impl Finding {
    pub fn failed(error: impl std::fmt::Display) -> Self {
        Finding::Failed(FailureMarker {
            status: "failed".to_string(),
            error: error.to_string(),
        })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Finding::Failed(_))
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            Finding::Ok(value) => Some(value),
            Finding::Failed(_) => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupConfig {
    pub registry_url: String,
    pub sanctions_url: String,
    pub knowledge_graph_url: String,
    pub pep_url: String,
    pub news_url: String,
    pub request_timeout_secs: u64,
    /// Adverse-media recency window in years.
    pub news_window_years: u32,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            registry_url: "http://localhost:8081".to_string(),
            sanctions_url: "http://localhost:8082".to_string(),
            knowledge_graph_url: "http://localhost:8083".to_string(),
            pep_url: "http://localhost:8084".to_string(),
            news_url: "http://localhost:8085".to_string(),
            request_timeout_secs: 30,
            news_window_years: 3,
        }
    }
}

impl LookupConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Uniform client over all enrichment sources. `lookup` never returns an
/// error: any failure becomes a `Finding::Failed` marker so one broken
/// source cannot take down a subject's enrichment.
pub struct LookupClient {
    http: reqwest::Client,
    config: LookupConfig,
    retry: RetryPolicy,
    cache: FindingsCache,
}

impl LookupClient {
    pub fn new(config: LookupConfig, retry: RetryPolicy, cache: FindingsCache) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
            retry,
            cache,
        }
    }

    pub async fn lookup(
        &self,
        source: Source,
        kind: SubjectKind,
        name: &str,
        transaction_id: &str,
    ) -> Finding {
        if let Some(hit) = self.cache.get(source, kind, name) {
            debug!(source = source.key(), subject = name, "Lookup served from cache");
            return hit;
        }

        let outcome = self
            .retry
            .retry(source.key(), || self.dispatch(source, kind, name))
            .await;

        match outcome {
            Ok(value) => {
                let finding = Finding::Ok(value);
                self.cache.set(source, kind, name, finding.clone());
                finding
            }
            Err(e) => {
                warn!(
                    source = source.key(),
                    subject = name,
                    transaction_id,
                    error = %e,
                    "Lookup failed, recording failure marker"
                );
                Finding::failed(e)
            }
        }
    }

    async fn dispatch(
        &self,
        source: Source,
        kind: SubjectKind,
        name: &str,
    ) -> anyhow::Result<Value> {
        match source {
            Source::Registry => registry::search_company(&self.http, &self.config, name).await,
            Source::Sanctions => sanctions::screen(&self.http, &self.config, kind, name).await,
            Source::KnowledgeGraph => {
                knowledge_graph::query_entity(&self.http, &self.config, name).await
            }
            Source::Pep => pep::check(&self.http, &self.config, name).await,
            Source::News => news::check(&self.http, &self.config, name).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_failure_marker_serialization() {
        let finding = Finding::failed("connection refused");
        let json = serde_json::to_value(&finding).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["error"], "connection refused");
    }

    #[test]
    fn test_ok_finding_serializes_transparently() {
        let finding = Finding::Ok(json!({"results": [{"name": "Acme Corp"}]}));
        let json = serde_json::to_value(&finding).unwrap();
        assert_eq!(json["results"][0]["name"], "Acme Corp");
    }

    #[test]
    fn test_finding_roundtrip_keeps_variant() {
        let failed: Finding =
            serde_json::from_value(json!({"status": "failed", "error": "boom"})).unwrap();
        assert!(failed.is_failed());

        let ok: Finding = serde_json::from_value(json!({"status": "ok", "hits": []})).unwrap();
        assert!(!ok.is_failed());
    }

    #[test]
    fn test_screening_kind() {
        assert_eq!(SubjectKind::Organization.screening_kind(), "Company");
        assert_eq!(SubjectKind::Person.screening_kind(), "Person");
    }

    #[test]
    fn test_source_keys_are_distinct() {
        let keys = [
            Source::Registry.key(),
            Source::Sanctions.key(),
            Source::KnowledgeGraph.key(),
            Source::Pep.key(),
            Source::News.key(),
        ];
        let unique: std::collections::HashSet<_> = keys.iter().collect();
        assert_eq!(unique.len(), keys.len());
    }
}
