use serde::{Deserialize, Serialize};

pub const ORGANIZATION_ROLES: &[&str] = &["sender", "recipient", "intermediary"];
pub const PERSON_ROLES: &[&str] = &["director", "approver", "beneficiary", "other"];
pub const ENTITY_TYPES: &[&str] = &[
    "corporation",
    "shell_company",
    "non_profit",
    "government_agency",
    "financial_institution",
];

/// One organization named in the transaction text.
///
/// `role` and `entity_type` are open strings: the extraction model is asked
/// for the enumerated values above, but anything else it returns is kept
/// as-is and logged rather than rejected.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Organization {
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub jurisdiction: String,
    #[serde(default)]
    pub entity_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Person {
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub country: String,
}

/// Amount/currency/purpose/date as reported by the extraction model.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TransactionDetails {
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub purpose: String,
    #[serde(default)]
    pub date: String,
}

/// Structured output of entity extraction for one transaction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EntitySet {
    #[serde(default)]
    pub transaction_id: String,
    #[serde(default)]
    pub organizations: Vec<Organization>,
    #[serde(default)]
    pub people: Vec<Person>,
    #[serde(default)]
    pub transaction: TransactionDetails,
    #[serde(default)]
    pub jurisdictions: Vec<String>,
}

impl EntitySet {
    /// All extracted entity names, organizations first, as-extracted casing.
    pub fn entity_names(&self) -> Vec<String> {
        self.organizations
            .iter()
            .map(|o| o.name.clone())
            .chain(self.people.iter().map(|p| p.name.clone()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.organizations.is_empty() && self.people.is_empty()
    }
}

pub fn is_known_organization_role(role: &str) -> bool {
    ORGANIZATION_ROLES.contains(&role)
}

pub fn is_known_person_role(role: &str) -> bool {
    PERSON_ROLES.contains(&role)
}

pub fn is_known_entity_type(entity_type: &str) -> bool {
    ENTITY_TYPES.contains(&entity_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_unknown_role() {
        let json = r#"{
            "transaction_id": "t1",
            "organizations": [
                {"name": "Acme Corp", "role": "guarantor", "jurisdiction": "UK", "entity_type": "corporation"}
            ],
            "people": [{"name": "Jane Doe", "role": "director", "country": "UK"}],
            "transaction": {"amount": "1000000", "currency": "USD", "purpose": "consulting", "date": "2024-01-01"},
            "jurisdictions": ["UK"]
        }"#;

        let entities: EntitySet = serde_json::from_str(json).unwrap();
        assert_eq!(entities.organizations[0].role, "guarantor");
        assert!(!is_known_organization_role(&entities.organizations[0].role));
        assert!(is_known_person_role(&entities.people[0].role));
    }

    #[test]
    fn test_missing_sections_default() {
        let entities: EntitySet = serde_json::from_str(r#"{"organizations": []}"#).unwrap();
        assert!(entities.is_empty());
        assert!(entities.jurisdictions.is_empty());
        assert_eq!(entities.transaction, TransactionDetails::default());
    }

    #[test]
    fn test_entity_names_orders_organizations_first() {
        let entities = EntitySet {
            transaction_id: "t1".to_string(),
            organizations: vec![Organization {
                name: "Acme Corp".to_string(),
                role: "sender".to_string(),
                jurisdiction: String::new(),
                entity_type: String::new(),
            }],
            people: vec![Person {
                name: "Jane Doe".to_string(),
                role: "director".to_string(),
                country: String::new(),
            }],
            transaction: TransactionDetails::default(),
            jurisdictions: vec![],
        };

        assert_eq!(entities.entity_names(), vec!["Acme Corp", "Jane Doe"]);
    }
}
