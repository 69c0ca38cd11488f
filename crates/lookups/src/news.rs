use anyhow::{Context, Result};
use serde_json::Value;

use crate::LookupConfig;

/// Adverse-media search, bounded to the configured recency window.
pub async fn check(client: &reqwest::Client, config: &LookupConfig, name: &str) -> Result<Value> {
    let url = format!("{}/search", config.news_url);
    let window = config.news_window_years.to_string();

    let response = client
        .get(&url)
        .query(&[("q", name), ("years", window.as_str())])
        .timeout(config.request_timeout())
        .send()
        .await
        .context("Failed to send adverse news request")?;

    if !response.status().is_success() {
        anyhow::bail!("Adverse news search failed: {}", response.status());
    }

    response
        .json()
        .await
        .context("Failed to parse adverse news response")
}
