pub mod prompt;
pub mod schema;

pub use schema::{RiskAssessment, error_artifact};

use anyhow::{Context, Result};
use extract::OllamaClient;
use serde_json::Value;
use tracing::info;

pub struct Assessor {
    llm_client: OllamaClient,
}

impl Assessor {
    pub fn new(llm_client: OllamaClient) -> Self {
        Self { llm_client }
    }

    /// Produce the final risk assessment from the aggregated evidence.
    ///
    /// Errors are the caller's signal to substitute a degraded assessment;
    /// this function never fabricates scores on its own.
    pub async fn assess(
        &self,
        transaction_text: &str,
        transaction_id: &str,
        evidence: &Value,
    ) -> Result<RiskAssessment> {
        info!(transaction_id, "Generating risk assessment");

        let prompt = prompt::build_assessment_prompt(transaction_text, evidence);
        let json_str = self.llm_client
            .generate_json_with_retry(&prompt, 3)
            .await
            .context("Failed to generate risk assessment")?;

        let mut assessment: RiskAssessment = serde_json::from_str(&json_str)
            .context("Failed to parse risk assessment")?;

        if assessment.transaction_id.is_empty() {
            assessment.transaction_id = transaction_id.to_string();
        }
        if assessment.timestamp.is_empty() {
            assessment.timestamp = schema::now_iso();
        }
        assessment.clamp_scores();

        info!(
            transaction_id,
            risk_score = assessment.risk_score,
            confidence_score = assessment.confidence_score,
            "Risk assessment generated"
        );

        Ok(assessment)
    }
}
