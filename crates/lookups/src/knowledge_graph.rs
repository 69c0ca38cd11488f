use anyhow::{Context, Result};
use serde_json::Value;

use crate::LookupConfig;

/// Knowledge-graph entity query (Wikidata-style API).
///
/// Successful payloads may carry an `associated_people` array of
/// `{name, relation}` records; those are the seed for transitive person
/// discovery downstream.
pub async fn query_entity(
    client: &reqwest::Client,
    config: &LookupConfig,
    name: &str,
) -> Result<Value> {
    let url = format!("{}/entity", config.knowledge_graph_url);

    let response = client
        .get(&url)
        .query(&[("name", name)])
        .timeout(config.request_timeout())
        .send()
        .await
        .context("Failed to send knowledge-graph query")?;

    if !response.status().is_success() {
        anyhow::bail!("Knowledge-graph query failed: {}", response.status());
    }

    response
        .json()
        .await
        .context("Failed to parse knowledge-graph response")
}
