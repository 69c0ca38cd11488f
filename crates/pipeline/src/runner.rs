use anyhow::{Context, Result};
use assess::{Assessor, RiskAssessment};
use enrich::Subject;
use extract::Extractor;
use lookups::LookupClient;
use serde_json::{Value, json};
use std::fmt;
use std::sync::Arc;
use store::{GraphStore, KnowledgeBase};
use tracing::{error, info, warn};

use crate::aggregate::aggregate;
use crate::context::TransactionContext;
use crate::notify;

/// Logical pipeline stages, in order. Every transition is logged; failures
/// past extraction are recorded and the run still walks the remaining
/// stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Started,
    EntitiesExtracted,
    HistoryRetrieved,
    SubjectsEnriched,
    DiscoveryExpanded,
    Aggregated,
    RiskAssessed,
    Finalized,
    Notified,
    Done,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Started => "started",
            Stage::EntitiesExtracted => "entities_extracted",
            Stage::HistoryRetrieved => "history_retrieved",
            Stage::SubjectsEnriched => "subjects_enriched",
            Stage::DiscoveryExpanded => "discovery_expanded",
            Stage::Aggregated => "aggregated",
            Stage::RiskAssessed => "risk_assessed",
            Stage::Finalized => "finalized",
            Stage::Notified => "notified",
            Stage::Done => "done",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct Pipeline {
    pub extractor: Extractor,
    pub assessor: Assessor,
    pub lookups: Arc<LookupClient>,
    pub knowledge_base: Arc<KnowledgeBase>,
    pub graph: Arc<GraphStore>,
    pub max_concurrent_subjects: usize,
}

impl Pipeline {
    /// Run the full case-enrichment pipeline for one transaction.
    ///
    /// Only input validation (done in `TransactionContext::new`) and entity
    /// extraction abort the run. Everything after that degrades: lookup
    /// failures become markers, assessment failure becomes a degraded
    /// assessment, finalization branches fail independently. The caller
    /// gets an assessment back unless extraction itself was impossible.
    pub async fn run(&self, ctx: TransactionContext) -> Result<RiskAssessment> {
        let txn = ctx.transaction_id.as_str();
        self.enter(Stage::Started, &ctx);

        self.knowledge_base
            .init_transaction(txn)
            .await
            .context("Failed to initialize knowledge base folder")?;
        self.knowledge_base
            .save_text(txn, "transaction.txt", &ctx.transaction_data)
            .await
            .context("Failed to persist transaction text")?;

        // Extraction is the one non-fatal-exempt stage: no entities, no run.
        let entities = match self.extractor.extract(&ctx.transaction_data, txn).await {
            Ok(entities) => entities,
            Err(e) => {
                error!(transaction_id = txn, error = %e, "Entity extraction failed, aborting run");
                let record = json!({
                    "transaction_id": txn,
                    "stage": Stage::EntitiesExtracted.as_str(),
                    "status": "failed",
                    "error": e.to_string(),
                });
                if let Err(save_err) = self
                    .knowledge_base
                    .save_document(txn, "error.json", &record)
                    .await
                {
                    warn!(transaction_id = txn, error = %save_err, "Failed to persist error record");
                }
                return Err(e);
            }
        };
        self.save_best_effort(txn, "entities.json", &entities).await;
        self.enter(Stage::EntitiesExtracted, &ctx);

        let history = Arc::new(self.graph.entity_history(txn, &entities).await);
        self.enter(Stage::HistoryRetrieved, &ctx);

        let org_subjects: Vec<Subject> = entities
            .organizations
            .iter()
            .map(|o| Subject::Organization { name: o.name.clone() })
            .collect();
        let person_subjects: Vec<Subject> = entities
            .people
            .iter()
            .map(|p| Subject::Person { name: p.name.clone() })
            .collect();

        let (org_results, people_results) = tokio::join!(
            enrich::enrich_subjects(
                self.lookups.clone(),
                self.knowledge_base.clone(),
                org_subjects,
                txn.to_string(),
                history.clone(),
                self.max_concurrent_subjects,
            ),
            enrich::enrich_subjects(
                self.lookups.clone(),
                self.knowledge_base.clone(),
                person_subjects,
                txn.to_string(),
                history.clone(),
                self.max_concurrent_subjects,
            ),
        );
        self.enter(Stage::SubjectsEnriched, &ctx);

        // Second enrichment round for people surfaced by organization
        // lookups. An empty expansion is the normal quiet case.
        let discovered = enrich::expand_discoveries(&org_results);
        let discovered_subjects: Vec<Subject> =
            discovered.into_iter().map(Subject::Discovered).collect();
        let discovered_results = enrich::enrich_subjects(
            self.lookups.clone(),
            self.knowledge_base.clone(),
            discovered_subjects,
            txn.to_string(),
            history.clone(),
            self.max_concurrent_subjects,
        )
        .await;
        self.enter(Stage::DiscoveryExpanded, &ctx);

        let bundle = aggregate(
            &ctx,
            &entities,
            &history,
            Some(org_results),
            Some(people_results),
            Some(discovered_results),
        );
        self.save_best_effort(txn, "raw_assessment_data.json", &bundle).await;
        self.enter(Stage::Aggregated, &ctx);

        let evidence = serde_json::to_value(&bundle).unwrap_or(Value::Null);
        let assessment = match self
            .assessor
            .assess(&ctx.transaction_data, txn, &evidence)
            .await
        {
            Ok(assessment) => assessment,
            Err(e) => {
                error!(transaction_id = txn, error = %e, "Risk assessment failed, substituting degraded assessment");
                let degraded = RiskAssessment::degraded(txn, &e);
                self.save_best_effort(txn, "error.json", &assess::error_artifact(&degraded, &e))
                    .await;
                degraded
            }
        };
        self.save_best_effort(txn, "risk_assessment.json", &assessment).await;
        self.enter(Stage::RiskAssessed, &ctx);

        // Independent terminal side effects: each in its own failure
        // boundary, all attempted before notification.
        let (kb_organized, graph_stored) = tokio::join!(
            self.knowledge_base.migrate_transaction(txn),
            async {
                match self.graph.store_results(txn, &assessment, &entities).await {
                    Ok(()) => true,
                    Err(e) => {
                        warn!(transaction_id = txn, error = %e, "Failed to store results in graph");
                        false
                    }
                }
            },
        );
        info!(
            transaction_id = txn,
            kb_organized, graph_stored, "Finalization branches attempted"
        );
        self.enter(Stage::Finalized, &ctx);

        notify::send_callback(&ctx, &assessment).await;
        self.enter(Stage::Notified, &ctx);

        self.enter(Stage::Done, &ctx);
        Ok(assessment)
    }

    fn enter(&self, stage: Stage, ctx: &TransactionContext) {
        info!(
            transaction_id = %ctx.transaction_id,
            run_id = %ctx.run_id,
            stage = stage.as_str(),
            "Pipeline stage"
        );
    }

    async fn save_best_effort<T: serde::Serialize>(
        &self,
        transaction_id: &str,
        name: &str,
        document: &T,
    ) {
        if let Err(e) = self
            .knowledge_base
            .save_document(transaction_id, name, document)
            .await
        {
            warn!(transaction_id, document = name, error = %e, "Failed to persist document");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_names() {
        assert_eq!(Stage::Started.as_str(), "started");
        assert_eq!(Stage::DiscoveryExpanded.to_string(), "discovery_expanded");
        assert_eq!(Stage::Done.as_str(), "done");
    }
}
