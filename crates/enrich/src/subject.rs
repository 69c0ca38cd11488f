use lookups::{Finding, LookupClient, Source, SubjectKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use store::{HistoryMap, KnowledgeBase};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::discovery::{DiscoveredPerson, associates_from_finding};

/// One entity queued for enrichment.
#[derive(Debug, Clone)]
pub enum Subject {
    Organization { name: String },
    Person { name: String },
    Discovered(DiscoveredPerson),
}

impl Subject {
    pub fn name(&self) -> &str {
        match self {
            Subject::Organization { name } | Subject::Person { name } => name,
            Subject::Discovered(person) => &person.name,
        }
    }
}

/// The work product for one enriched subject. Findings are keyed by source
/// name; a BTreeMap keeps downstream serialization stable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubjectResult {
    pub name: String,
    pub kind: SubjectKind,
    pub findings: BTreeMap<String, Finding>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub discovered: Vec<DiscoveredPerson>,
}

/// Run all applicable lookups for one organization. Individual lookup
/// failures land in the findings map as failure markers; this function
/// itself cannot fail.
pub async fn enrich_organization(
    client: &LookupClient,
    knowledge_base: &KnowledgeBase,
    name: &str,
    transaction_id: &str,
    history: &HistoryMap,
) -> SubjectResult {
    info!(organization = name, transaction_id, "Processing organization");

    let kind = SubjectKind::Organization;
    let (registry, sanctions, knowledge_graph, news) = tokio::join!(
        client.lookup(Source::Registry, kind, name, transaction_id),
        client.lookup(Source::Sanctions, kind, name, transaction_id),
        client.lookup(Source::KnowledgeGraph, kind, name, transaction_id),
        client.lookup(Source::News, kind, name, transaction_id),
    );

    let discovered = associates_from_finding(name, &knowledge_graph);

    let mut findings = BTreeMap::new();
    findings.insert(Source::Registry.key().to_string(), registry);
    findings.insert(Source::Sanctions.key().to_string(), sanctions);
    findings.insert(Source::KnowledgeGraph.key().to_string(), knowledge_graph);
    findings.insert(Source::News.key().to_string(), news);

    persist_findings(knowledge_base, transaction_id, name, &findings).await;
    attach_history(&mut findings, history, name);

    SubjectResult {
        name: name.to_string(),
        kind,
        findings,
        discovered,
    }
}

/// Run all applicable lookups for one person. For discovered people the
/// provenance (source tag, connection to the originating organization) is
/// recorded alongside the findings.
pub async fn enrich_person(
    client: &LookupClient,
    knowledge_base: &KnowledgeBase,
    name: &str,
    transaction_id: &str,
    history: &HistoryMap,
    provenance: Option<&DiscoveredPerson>,
) -> SubjectResult {
    info!(person = name, transaction_id, "Processing person");

    let kind = SubjectKind::Person;
    let (pep, sanctions, news) = tokio::join!(
        client.lookup(Source::Pep, kind, name, transaction_id),
        client.lookup(Source::Sanctions, kind, name, transaction_id),
        client.lookup(Source::News, kind, name, transaction_id),
    );

    let mut findings = BTreeMap::new();
    findings.insert(Source::Pep.key().to_string(), pep);
    findings.insert(Source::Sanctions.key().to_string(), sanctions);
    findings.insert(Source::News.key().to_string(), news);

    persist_findings(knowledge_base, transaction_id, name, &findings).await;
    attach_history(&mut findings, history, name);

    if let Some(person) = provenance {
        findings.insert(
            "source".to_string(),
            Finding::Ok(Value::String(person.source.clone())),
        );
        findings.insert(
            "entity_connection".to_string(),
            Finding::Ok(Value::String(person.entity_connection.clone())),
        );
    }

    SubjectResult {
        name: name.to_string(),
        kind,
        findings,
        discovered: Vec::new(),
    }
}

/// Enrich a batch of subjects: one task each, bounded by `max_concurrent`,
/// failure-isolated. Input order is preserved in the output; a task that
/// dies is logged and dropped rather than failing the batch.
pub async fn enrich_subjects(
    client: Arc<LookupClient>,
    knowledge_base: Arc<KnowledgeBase>,
    subjects: Vec<Subject>,
    transaction_id: String,
    history: Arc<HistoryMap>,
    max_concurrent: usize,
) -> Vec<SubjectResult> {
    let subjects: Vec<Subject> = subjects
        .into_iter()
        .filter(|subject| {
            if subject.name().trim().is_empty() {
                warn!(transaction_id = %transaction_id, "Skipping subject with empty name");
                false
            } else {
                true
            }
        })
        .collect();

    let total = subjects.len();
    let semaphore = Arc::new(Semaphore::new(max_concurrent.max(1)));
    let mut tasks = JoinSet::new();

    for (index, subject) in subjects.into_iter().enumerate() {
        let client = client.clone();
        let knowledge_base = knowledge_base.clone();
        let history = history.clone();
        let transaction_id = transaction_id.clone();
        let semaphore = semaphore.clone();

        tasks.spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok();
            let result = match subject {
                Subject::Organization { name } => {
                    enrich_organization(&client, &knowledge_base, &name, &transaction_id, &history)
                        .await
                }
                Subject::Person { name } => {
                    enrich_person(&client, &knowledge_base, &name, &transaction_id, &history, None)
                        .await
                }
                Subject::Discovered(person) => {
                    enrich_person(
                        &client,
                        &knowledge_base,
                        &person.name,
                        &transaction_id,
                        &history,
                        Some(&person),
                    )
                    .await
                }
            };
            (index, result)
        });
    }

    let mut slots: Vec<Option<SubjectResult>> = vec![None; total];
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, result)) => slots[index] = Some(result),
            Err(e) => warn!(error = %e, "Subject enrichment task failed"),
        }
    }

    slots.into_iter().flatten().collect()
}

fn attach_history(findings: &mut BTreeMap<String, Finding>, history: &HistoryMap, name: &str) {
    if let Some(record) = history.get(name) {
        findings.insert("history".to_string(), Finding::Ok(record.clone()));
    }
}

/// Audit trail: raw successful source responses are written per subject.
/// Persistence problems never affect the enrichment result.
async fn persist_findings(
    knowledge_base: &KnowledgeBase,
    transaction_id: &str,
    subject: &str,
    findings: &BTreeMap<String, Finding>,
) {
    for (source_key, finding) in findings {
        let Some(value) = finding.value() else { continue };
        if let Err(e) = knowledge_base
            .save_lookup_response(transaction_id, source_key, subject, value)
            .await
        {
            warn!(
                transaction_id,
                subject,
                source = source_key.as_str(),
                error = %e,
                "Failed to persist lookup response"
            );
        }
    }
}
