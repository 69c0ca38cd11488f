use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Clone)]
pub struct OllamaClient {
    base_url: String,
    model: String,
    timeout: Duration,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    stream: bool,
    format: String, // "json" for structured output
}

#[derive(Deserialize)]
struct OllamaResponse {
    response: String,
}

impl OllamaClient {
    pub fn new(base_url: String, model: String, timeout_secs: u64) -> Self {
        Self {
            base_url,
            model,
            timeout: Duration::from_secs(timeout_secs),
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);

        let request = OllamaRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
            format: "json".to_string(), // Force JSON output
        };

        let response = self.client
            .post(&url)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .context("Failed to send request to LLM")?;

        if !response.status().is_success() {
            anyhow::bail!("LLM request failed: {}", response.status());
        }

        let ollama_response: OllamaResponse = response
            .json()
            .await
            .context("Failed to parse LLM response")?;

        Ok(ollama_response.response)
    }

    /// Generate with retry for invalid JSON. Returns the recovered JSON
    /// payload, not the raw model output.
    pub async fn generate_json_with_retry(
        &self,
        prompt: &str,
        max_retries: usize,
    ) -> Result<String> {
        for attempt in 0..max_retries {
            let response = self.generate(prompt).await?;
            let payload = extract_json_payload(&response);

            if serde_json::from_str::<serde_json::Value>(&payload).is_ok() {
                return Ok(payload);
            }

            // If invalid, retry with correction prompt
            if attempt < max_retries - 1 {
                let retry_prompt = format!(
                    "The following JSON is invalid:\n{}\n\nFix this JSON. Output only valid JSON.",
                    response
                );

                let corrected = self.generate(&retry_prompt).await?;
                let payload = extract_json_payload(&corrected);
                if serde_json::from_str::<serde_json::Value>(&payload).is_ok() {
                    return Ok(payload);
                }
            }
        }

        anyhow::bail!("Failed to get valid JSON after {} retries", max_retries)
    }
}

/// Recover the JSON object from a model response that may wrap it in
/// ```json fences or surround it with prose.
pub fn extract_json_payload(text: &str) -> String {
    let fence = Regex::new(r"(?s)```json\s*(.*?)\s*```").unwrap();
    if let Some(captures) = fence.captures(text) {
        return captures[1].to_string();
    }

    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if end > start {
            return text[start..=end].to_string();
        }
    }

    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_from_fenced_response() {
        let text = "Here is the result:\n```json\n{\"risk_score\": 0.2}\n```\nDone.";
        assert_eq!(extract_json_payload(text), "{\"risk_score\": 0.2}");
    }

    #[test]
    fn test_payload_from_prose_wrapped_response() {
        let text = "Sure! {\"entities\": []} Hope that helps.";
        assert_eq!(extract_json_payload(text), "{\"entities\": []}");
    }

    #[test]
    fn test_payload_passthrough_for_bare_json() {
        let text = "{\"a\": {\"b\": 1}}";
        assert_eq!(extract_json_payload(text), text);
    }
}
