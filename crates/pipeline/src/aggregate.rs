use enrich::SubjectResult;
use extract::EntitySet;
use lookups::Finding;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use store::HistoryMap;
use tracing::warn;

use crate::context::TransactionContext;

pub type FindingsMap = BTreeMap<String, Finding>;

/// Everything the risk assessor sees: the original extraction, entity
/// history, and the three name-keyed findings maps. BTreeMaps throughout so
/// the serialized bundle is byte-stable for identical inputs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvidenceBundle {
    pub transaction_id: String,
    pub transaction_data: String,
    pub entities: EntitySet,
    pub entity_history: BTreeMap<String, Value>,
    pub organizations: BTreeMap<String, FindingsMap>,
    pub people: BTreeMap<String, FindingsMap>,
    pub discovered_people: BTreeMap<String, FindingsMap>,
}

/// Fan-in join over the three enrichment branches. Runs unconditionally
/// once every branch has reached a terminal state: an absent or failed
/// branch (`None`) simply contributes an empty map. Every subject that was
/// dispatched appears under its name, whatever happened to its individual
/// lookups.
pub fn aggregate(
    ctx: &TransactionContext,
    entities: &EntitySet,
    history: &HistoryMap,
    org_results: Option<Vec<SubjectResult>>,
    people_results: Option<Vec<SubjectResult>>,
    discovered_results: Option<Vec<SubjectResult>>,
) -> EvidenceBundle {
    EvidenceBundle {
        transaction_id: ctx.transaction_id.clone(),
        transaction_data: ctx.transaction_data.clone(),
        entities: entities.clone(),
        entity_history: history
            .iter()
            .map(|(name, record)| (name.clone(), record.clone()))
            .collect(),
        organizations: key_by_name(org_results, "organization"),
        people: key_by_name(people_results, "person"),
        discovered_people: key_by_name(discovered_results, "discovered person"),
    }
}

fn key_by_name(
    results: Option<Vec<SubjectResult>>,
    branch: &'static str,
) -> BTreeMap<String, FindingsMap> {
    let mut map = BTreeMap::new();
    for result in results.unwrap_or_default() {
        if result.name.trim().is_empty() {
            warn!(branch, "Dropping enrichment result with empty subject name");
            continue;
        }
        map.insert(result.name, result.findings);
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use extract::{Organization, Person, TransactionDetails};
    use lookups::SubjectKind;

    fn test_ctx() -> TransactionContext {
        TransactionContext::new("t1", "Acme Corp paid Globex Inc $1,000,000", None).unwrap()
    }

    fn test_entities() -> EntitySet {
        EntitySet {
            transaction_id: "t1".to_string(),
            organizations: vec![
                org_entity("Acme Corp"),
                org_entity("Globex Inc"),
            ],
            people: vec![Person {
                name: "Jane Doe".to_string(),
                role: "director".to_string(),
                country: "UK".to_string(),
            }],
            transaction: TransactionDetails::default(),
            jurisdictions: vec!["UK".to_string()],
        }
    }

    fn org_entity(name: &str) -> Organization {
        Organization {
            name: name.to_string(),
            role: "sender".to_string(),
            jurisdiction: String::new(),
            entity_type: "corporation".to_string(),
        }
    }

    fn all_failed_result(name: &str, kind: SubjectKind) -> SubjectResult {
        let sources: &[&str] = match kind {
            SubjectKind::Organization => &["opencorporates", "sanctions", "wikidata", "news"],
            SubjectKind::Person => &["pep", "sanctions", "news"],
        };
        let findings = sources
            .iter()
            .map(|s| (s.to_string(), Finding::failed("source unavailable")))
            .collect();
        SubjectResult {
            name: name.to_string(),
            kind,
            findings,
            discovered: Vec::new(),
        }
    }

    #[test]
    fn test_every_dispatched_subject_is_keyed_even_when_all_lookups_failed() {
        let bundle = aggregate(
            &test_ctx(),
            &test_entities(),
            &HistoryMap::new(),
            Some(vec![
                all_failed_result("Acme Corp", SubjectKind::Organization),
                all_failed_result("Globex Inc", SubjectKind::Organization),
            ]),
            Some(vec![all_failed_result("Jane Doe", SubjectKind::Person)]),
            Some(vec![]),
        );

        assert!(bundle.organizations.contains_key("Acme Corp"));
        assert!(bundle.organizations.contains_key("Globex Inc"));
        assert!(bundle.people.contains_key("Jane Doe"));
        assert!(bundle.discovered_people.is_empty());
        assert!(bundle.organizations["Acme Corp"]["sanctions"].is_failed());
    }

    #[test]
    fn test_partial_failure_keeps_all_sources_for_subject() {
        let mut findings = FindingsMap::new();
        findings.insert("opencorporates".to_string(), Finding::Ok(serde_json::json!({"results": []})));
        findings.insert("wikidata".to_string(), Finding::Ok(serde_json::json!({"associated_people": []})));
        findings.insert("news".to_string(), Finding::Ok(serde_json::json!({"articles": []})));
        findings.insert("sanctions".to_string(), Finding::failed("timed out"));

        let bundle = aggregate(
            &test_ctx(),
            &test_entities(),
            &HistoryMap::new(),
            Some(vec![SubjectResult {
                name: "Acme Corp".to_string(),
                kind: SubjectKind::Organization,
                findings,
                discovered: Vec::new(),
            }]),
            None,
            None,
        );

        let acme = &bundle.organizations["Acme Corp"];
        assert!(!acme["opencorporates"].is_failed());
        assert!(!acme["wikidata"].is_failed());
        assert!(!acme["news"].is_failed());
        assert!(acme["sanctions"].is_failed());
    }

    #[test]
    fn test_absent_branches_normalize_to_empty_maps() {
        let bundle = aggregate(
            &test_ctx(),
            &test_entities(),
            &HistoryMap::new(),
            None,
            None,
            None,
        );

        assert!(bundle.organizations.is_empty());
        assert!(bundle.people.is_empty());
        assert!(bundle.discovered_people.is_empty());
        assert_eq!(bundle.transaction_id, "t1");
    }

    #[test]
    fn test_empty_name_results_are_dropped() {
        let bundle = aggregate(
            &test_ctx(),
            &test_entities(),
            &HistoryMap::new(),
            Some(vec![
                all_failed_result("", SubjectKind::Organization),
                all_failed_result("Acme Corp", SubjectKind::Organization),
            ]),
            None,
            None,
        );

        assert_eq!(bundle.organizations.len(), 1);
        assert!(bundle.organizations.contains_key("Acme Corp"));
    }

    #[test]
    fn test_aggregation_is_idempotent() {
        let mut history = HistoryMap::new();
        history.insert(
            "Acme Corp".to_string(),
            serde_json::json!({"prior_transactions": [{"transaction_id": "t0"}]}),
        );

        let make = || {
            aggregate(
                &TransactionContext {
                    transaction_id: "t1".to_string(),
                    transaction_data: "text".to_string(),
                    callback_url: None,
                    run_id: "fixed".to_string(),
                },
                &test_entities(),
                &history,
                Some(vec![all_failed_result("Acme Corp", SubjectKind::Organization)]),
                Some(vec![all_failed_result("Jane Doe", SubjectKind::Person)]),
                Some(vec![]),
            )
        };

        let first = serde_json::to_vec(&make()).unwrap();
        let second = serde_json::to_vec(&make()).unwrap();
        assert_eq!(first, second);
    }
}
