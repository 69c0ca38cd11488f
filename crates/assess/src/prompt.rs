use serde_json::Value;

pub fn build_assessment_prompt(transaction_text: &str, evidence: &Value) -> String {
    let evidence_json =
        serde_json::to_string_pretty(evidence).unwrap_or_else(|_| evidence.to_string());

    format!(
        r#"You are a financial crime expert specialized in Anti-Money Laundering (AML) risk assessment. Analyze the following transaction data through these specific lenses:

TRANSACTION:
{}

EXTRACTED ENTITIES AND VERIFICATION RESULTS:
{}

Mandatory Analysis Framework:

1. **Blacklist & Shell Company Check**
- Flag shell company patterns: anonymous ownership, nominee directors, lack of physical address
- Verify entity registration status and dissolution records

2. **Sanctions Screening**
- Cross-check all parties against global sanctions lists
- Highlight full/partial name matches with SDN lists

3. **PEP & Associates Analysis**
- Identify PEP status (current/historical)
- Map close associates through family/ownership relationships

4. **Jurisdictional Risk**
- FATF greylist/blacklist status
- High-risk geography patterns (tax havens, conflict zones)

5. **Adverse Media**
- Recent negative coverage and fraud/regulatory action mentions
- Industry-specific risk patterns

6. **Transaction Contextualization**
- Historical counterparty relationships and pattern deviations
- High-risk transaction types (layering, structuring, round amounts)

7. **Composite Risk Scoring**
- Weighted evaluation of all factors
- Explicit confidence scoring for missing data

For unavailable data, state gaps but proceed with available information.

Deliver assessment in this JSON structure:
{{
  "extracted_entities": ["string"],
  "entity_types": ["string"],
  "risk_score": float (overall risk between 0 and 1, 0 = low risk, 1 = high risk),
  "supporting_evidence": ["string"],
  "confidence_score": float,
  "reason": "Multi-factor analysis: [1-2 sentence summary]. Highest risk contributors: [top factors]"
}}

The "extracted_entities" should include all organizations and people from the data.
The "entity_types" should reflect the type of each entity.
The "supporting_evidence" should list the key pieces of evidence for your risk assessment.
Output ONLY the JSON object, no markdown, no explanations."#,
        transaction_text, evidence_json
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_prompt_embeds_transaction_and_evidence() {
        let evidence = json!({"organizations": {"Acme Corp": {"sanctions": {"hits": []}}}});
        let prompt = build_assessment_prompt("Acme Corp paid Globex Inc", &evidence);

        assert!(prompt.contains("Acme Corp paid Globex Inc"));
        assert!(prompt.contains("\"Acme Corp\""));
        assert!(prompt.contains("risk_score"));
        assert!(prompt.contains("Sanctions Screening"));
    }
}
