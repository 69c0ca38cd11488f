use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Final output of a pipeline run. Scores are clamped to 0.0..=1.0.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskAssessment {
    #[serde(default)]
    pub transaction_id: String,
    pub risk_score: f64,
    pub confidence_score: f64,
    #[serde(default)]
    pub extracted_entities: Vec<String>,
    #[serde(default)]
    pub entity_types: Vec<String>,
    #[serde(default)]
    pub supporting_evidence: Vec<String>,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub status: String,
}

impl RiskAssessment {
    /// Safe-default assessment substituted when the real call fails:
    /// neutral risk, zero confidence, so downstream consumers still get a
    /// complete, well-shaped result.
    pub fn degraded(transaction_id: &str, error: &anyhow::Error) -> Self {
        Self {
            transaction_id: transaction_id.to_string(),
            risk_score: 0.5,
            confidence_score: 0.0,
            extracted_entities: Vec::new(),
            entity_types: Vec::new(),
            supporting_evidence: vec!["Error during risk assessment".to_string()],
            reason: format!("Could not complete risk assessment due to error: {error}"),
            timestamp: now_iso(),
            status: "failed".to_string(),
        }
    }

    pub fn clamp_scores(&mut self) {
        self.risk_score = self.risk_score.clamp(0.0, 1.0);
        self.confidence_score = self.confidence_score.clamp(0.0, 1.0);
    }
}

/// The document persisted as `error.json` when assessment fails: the
/// degraded assessment plus the raw error detail.
pub fn error_artifact(assessment: &RiskAssessment, error: &anyhow::Error) -> Value {
    let mut artifact = serde_json::to_value(assessment).unwrap_or_else(|_| Value::Null);
    if let Value::Object(map) = &mut artifact {
        map.insert("error".to_string(), Value::String(error.to_string()));
    }
    artifact
}

pub fn now_iso() -> String {
    chrono::Utc::now().to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degraded_assessment_defaults() {
        let err = anyhow::anyhow!("model unavailable");
        let assessment = RiskAssessment::degraded("txn-42", &err);

        assert_eq!(assessment.transaction_id, "txn-42");
        assert_eq!(assessment.risk_score, 0.5);
        assert_eq!(assessment.confidence_score, 0.0);
        assert_eq!(assessment.status, "failed");
        assert!(assessment.reason.contains("model unavailable"));
        assert!(!assessment.timestamp.is_empty());
    }

    #[test]
    fn test_error_artifact_carries_error_field() {
        let err = anyhow::anyhow!("model unavailable");
        let assessment = RiskAssessment::degraded("txn-42", &err);
        let artifact = error_artifact(&assessment, &err);

        assert_eq!(artifact["transaction_id"], "txn-42");
        assert_eq!(artifact["error"], "model unavailable");
        assert_eq!(artifact["status"], "failed");
    }

    #[test]
    fn test_clamp_scores() {
        let mut assessment = RiskAssessment {
            transaction_id: "t1".to_string(),
            risk_score: 1.7,
            confidence_score: -0.3,
            extracted_entities: vec![],
            entity_types: vec![],
            supporting_evidence: vec![],
            reason: String::new(),
            timestamp: String::new(),
            status: String::new(),
        };
        assessment.clamp_scores();
        assert_eq!(assessment.risk_score, 1.0);
        assert_eq!(assessment.confidence_score, 0.0);
    }

    #[test]
    fn test_status_omitted_when_empty() {
        let assessment = RiskAssessment {
            transaction_id: "t1".to_string(),
            risk_score: 0.2,
            confidence_score: 0.9,
            extracted_entities: vec![],
            entity_types: vec![],
            supporting_evidence: vec![],
            reason: String::new(),
            timestamp: String::new(),
            status: String::new(),
        };
        let json = serde_json::to_value(&assessment).unwrap();
        assert!(json.get("status").is_none());
    }
}
