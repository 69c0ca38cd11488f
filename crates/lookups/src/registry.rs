use anyhow::{Context, Result};
use serde_json::Value;

use crate::LookupConfig;

/// Corporate-registry company search (OpenCorporates-style API).
pub async fn search_company(
    client: &reqwest::Client,
    config: &LookupConfig,
    name: &str,
) -> Result<Value> {
    let url = format!("{}/companies/search", config.registry_url);

    let response = client
        .get(&url)
        .query(&[("q", name)])
        .timeout(config.request_timeout())
        .send()
        .await
        .context("Failed to send registry search request")?;

    if !response.status().is_success() {
        anyhow::bail!("Registry search failed: {}", response.status());
    }

    response
        .json()
        .await
        .context("Failed to parse registry response")
}
