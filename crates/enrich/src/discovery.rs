use lookups::Finding;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use tracing::{info, warn};

use crate::subject::SubjectResult;

/// A person surfaced transitively through an organization's enrichment,
/// not present in the original extraction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiscoveredPerson {
    pub name: String,
    /// Provenance tag, e.g. "wikidata".
    #[serde(default)]
    pub source: String,
    /// Free-text description of how this person relates to the
    /// originating organization.
    #[serde(default)]
    pub entity_connection: String,
}

/// Read the knowledge-graph finding's `associated_people` list into
/// discovered-person records. Failed or shapeless findings yield nothing.
pub fn associates_from_finding(organization: &str, finding: &Finding) -> Vec<DiscoveredPerson> {
    let Some(value) = finding.value() else {
        return Vec::new();
    };
    let Some(people) = value.get("associated_people").and_then(Value::as_array) else {
        return Vec::new();
    };

    people
        .iter()
        .filter_map(|person| {
            let name = person.get("name").and_then(Value::as_str)?.trim();
            if name.is_empty() {
                return None;
            }
            let relation = person
                .get("relation")
                .and_then(Value::as_str)
                .unwrap_or_default();
            Some(DiscoveredPerson {
                name: name.to_string(),
                source: "wikidata".to_string(),
                entity_connection: if relation.is_empty() {
                    format!("associated with {}", organization)
                } else {
                    relation.to_string()
                },
            })
        })
        .collect()
}

/// Collect every discovered person across all organization results into one
/// candidate list: first-seen order, case-folded-name dedup (first
/// occurrence with a given folded name wins). An empty result is the normal
/// no-new-people outcome, not an error.
pub fn expand_discoveries(org_results: &[SubjectResult]) -> Vec<DiscoveredPerson> {
    let mut seen_names = HashSet::new();
    let mut discovered = Vec::new();

    for result in org_results {
        for person in &result.discovered {
            let folded = person.name.to_lowercase();
            if folded.is_empty() {
                warn!(organization = %result.name, "Dropping discovered person with empty name");
                continue;
            }
            if seen_names.insert(folded) {
                discovered.push(person.clone());
            }
        }
    }

    info!(count = discovered.len(), "Discovered additional people from organization enrichment");
    discovered
}

#[cfg(test)]
mod tests {
    use super::*;
    use lookups::SubjectKind;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn org_result(name: &str, discovered: Vec<DiscoveredPerson>) -> SubjectResult {
        SubjectResult {
            name: name.to_string(),
            kind: SubjectKind::Organization,
            findings: BTreeMap::new(),
            discovered,
        }
    }

    fn person(name: &str) -> DiscoveredPerson {
        DiscoveredPerson {
            name: name.to_string(),
            source: "wikidata".to_string(),
            entity_connection: String::new(),
        }
    }

    #[test]
    fn test_dedup_is_case_insensitive_first_seen_wins() {
        let results = vec![
            org_result("Acme Corp", vec![person("Jane Doe"), person("JANE DOE")]),
            org_result("Globex Inc", vec![person("John Roe"), person("jane doe")]),
        ];

        let discovered = expand_discoveries(&results);
        let names: Vec<_> = discovered.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Jane Doe", "John Roe"]);
    }

    #[test]
    fn test_empty_discovery_is_a_clean_no_op() {
        let results = vec![org_result("Acme Corp", vec![])];
        assert!(expand_discoveries(&results).is_empty());
        assert!(expand_discoveries(&[]).is_empty());
    }

    #[test]
    fn test_associates_from_finding() {
        let finding = Finding::Ok(json!({
            "entity": "Acme Corp",
            "associated_people": [
                {"name": "Jane Doe", "relation": "board member"},
                {"name": "  ", "relation": "ignored"},
                {"name": "John Roe"}
            ]
        }));

        let discovered = associates_from_finding("Acme Corp", &finding);
        assert_eq!(discovered.len(), 2);
        assert_eq!(discovered[0].name, "Jane Doe");
        assert_eq!(discovered[0].source, "wikidata");
        assert_eq!(discovered[0].entity_connection, "board member");
        assert_eq!(discovered[1].entity_connection, "associated with Acme Corp");
    }

    #[test]
    fn test_associates_from_failed_finding_is_empty() {
        let finding = Finding::failed("source unavailable");
        assert!(associates_from_finding("Acme Corp", &finding).is_empty());
    }
}
