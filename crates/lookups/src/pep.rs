use anyhow::{Context, Result};
use serde_json::Value;

use crate::LookupConfig;

/// Politically-exposed-person register search.
pub async fn check(client: &reqwest::Client, config: &LookupConfig, name: &str) -> Result<Value> {
    let url = format!("{}/search", config.pep_url);

    let response = client
        .get(&url)
        .query(&[("name", name)])
        .timeout(config.request_timeout())
        .send()
        .await
        .context("Failed to send PEP check request")?;

    if !response.status().is_success() {
        anyhow::bail!("PEP check failed: {}", response.status());
    }

    response.json().await.context("Failed to parse PEP response")
}
