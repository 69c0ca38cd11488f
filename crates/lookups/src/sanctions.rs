use anyhow::{Context, Result};
use serde_json::Value;

use crate::{LookupConfig, SubjectKind};

/// Consolidated sanctions-list screening. The remote side distinguishes
/// company and person matching, so the subject kind is part of the query.
pub async fn screen(
    client: &reqwest::Client,
    config: &LookupConfig,
    kind: SubjectKind,
    name: &str,
) -> Result<Value> {
    let url = format!("{}/search", config.sanctions_url);

    let response = client
        .get(&url)
        .query(&[("q", name), ("schema", kind.screening_kind())])
        .timeout(config.request_timeout())
        .send()
        .await
        .context("Failed to send sanctions screening request")?;

    if !response.status().is_success() {
        anyhow::bail!("Sanctions screening failed: {}", response.status());
    }

    response
        .json()
        .await
        .context("Failed to parse sanctions response")
}
