pub fn build_extraction_prompt(transaction_text: &str) -> String {
    format!(
        r#"You are a financial crime expert. Extract entities from the following transaction data:

{}

INSTRUCTIONS:
1. Identify organizations involved (sender and recipient companies/entities)
2. Identify people mentioned (directors, approvers, beneficiaries)
3. Capture transaction details (amount, currency, purpose, date)
4. List jurisdictions mentioned (countries, territories)
5. Output ONLY valid JSON, nothing else

SCHEMA:
{{
  "transaction_id": "string",
  "organizations": [
    {{"name": "string", "role": "sender|recipient|intermediary", "jurisdiction": "string", "entity_type": "corporation|shell_company|non_profit|government_agency|financial_institution"}}
  ],
  "people": [
    {{"name": "string", "role": "director|approver|beneficiary|other", "country": "string"}}
  ],
  "transaction": {{"amount": "string", "currency": "string", "purpose": "string", "date": "string"}},
  "jurisdictions": ["string"]
}}

RULES:
- Use the entity names exactly as they appear in the text
- Every organization and person must have a non-empty name
- Leave unknown fields as empty strings rather than guessing
- Output ONLY the JSON object, no markdown, no explanations

JSON OUTPUT:"#,
        transaction_text
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_transaction_text() {
        let prompt = build_extraction_prompt("Acme Corp paid Globex Inc $1,000,000");
        assert!(prompt.contains("Acme Corp paid Globex Inc"));
        assert!(prompt.contains("\"organizations\""));
        assert!(prompt.contains("sender|recipient|intermediary"));
    }
}
