use anyhow::{Context, Result};
use neo4rs::{Graph, Query};
use serde_json::{Value, json};
use std::collections::HashMap;
use tracing::{info, warn};

use assess::RiskAssessment;
use extract::EntitySet;

/// Prior-knowledge records keyed by entity name, as extracted.
pub type HistoryMap = HashMap<String, Value>;

pub struct GraphStore {
    graph: Graph,
}

impl GraphStore {
    pub fn new(graph: Graph) -> Self {
        Self { graph }
    }

    /// Initialize schema: create indexes
    pub async fn init_schema(&self) -> Result<()> {
        let query = Query::new(
            "CREATE INDEX entity_name_index IF NOT EXISTS FOR (e:Entity) ON (e.name)".to_string(),
        );
        self.graph.run(query).await
            .context("Failed to create index on Entity.name")?;

        let query = Query::new(
            "CREATE INDEX transaction_id_index IF NOT EXISTS FOR (t:Transaction) ON (t.id)"
                .to_string(),
        );
        self.graph.run(query).await
            .context("Failed to create index on Transaction.id")?;

        info!("Graph store indexes created");
        Ok(())
    }

    /// Retrieve prior-transaction history for every extracted entity.
    ///
    /// History is advisory: any query failure degrades to an empty (or
    /// partial) map rather than failing the run.
    pub async fn entity_history(&self, transaction_id: &str, entities: &EntitySet) -> HistoryMap {
        let mut history = HistoryMap::new();

        for name in entities.entity_names() {
            match self.history_for(&name).await {
                Ok(Some(record)) => {
                    history.insert(name, record);
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(
                        transaction_id,
                        entity = %name,
                        error = %e,
                        "History lookup failed, continuing without it"
                    );
                }
            }
        }

        info!(
            transaction_id,
            entities_with_history = history.len(),
            "Retrieved entity history"
        );
        history
    }

    async fn history_for(&self, name: &str) -> Result<Option<Value>> {
        let query = Query::new(
            r#"
            MATCH (e:Entity {name: $name})<-[:INVOLVES]-(t:Transaction)
            RETURN t.id as id, t.risk_score as risk_score, t.timestamp as timestamp
            ORDER BY t.timestamp DESC
            LIMIT 25
            "#
            .to_string(),
        )
        .param("name", name.to_string());

        let mut result = self.graph.execute(query).await?;
        let mut prior = Vec::new();

        while let Some(row) = result.next().await? {
            let id = row.get::<String>("id").unwrap_or_default();
            let risk_score = row.get::<f64>("risk_score").unwrap_or(0.0);
            let timestamp = row.get::<String>("timestamp").unwrap_or_default();
            prior.push(json!({
                "transaction_id": id,
                "risk_score": risk_score,
                "timestamp": timestamp,
            }));
        }

        if prior.is_empty() {
            Ok(None)
        } else {
            Ok(Some(json!({ "prior_transactions": prior })))
        }
    }

    /// Write the finished assessment back to the graph: a Transaction node
    /// plus an INVOLVES edge per extracted entity (MERGE keeps re-runs
    /// idempotent).
    pub async fn store_results(
        &self,
        transaction_id: &str,
        assessment: &RiskAssessment,
        entities: &EntitySet,
    ) -> Result<()> {
        let query = Query::new(
            r#"
            MERGE (t:Transaction {id: $id})
            SET t.risk_score = $risk_score,
                t.confidence_score = $confidence_score,
                t.reason = $reason,
                t.timestamp = $timestamp
            "#
            .to_string(),
        )
        .param("id", transaction_id.to_string())
        .param("risk_score", assessment.risk_score)
        .param("confidence_score", assessment.confidence_score)
        .param("reason", assessment.reason.clone())
        .param("timestamp", assessment.timestamp.clone());

        self.graph.run(query).await
            .context("Failed to store transaction node")?;

        for org in &entities.organizations {
            self.link_entity(transaction_id, &org.name, "organization", &org.role)
                .await?;
        }
        for person in &entities.people {
            self.link_entity(transaction_id, &person.name, "person", &person.role)
                .await?;
        }

        info!(transaction_id, "Stored transaction results in graph");
        Ok(())
    }

    async fn link_entity(
        &self,
        transaction_id: &str,
        name: &str,
        kind: &str,
        role: &str,
    ) -> Result<()> {
        if name.is_empty() {
            return Ok(());
        }

        let query = Query::new(
            r#"
            MERGE (e:Entity {name: $name})
            SET e.kind = $kind
            "#
            .to_string(),
        )
        .param("name", name.to_string())
        .param("kind", kind.to_string());

        self.graph.run(query).await
            .context("Failed to store entity node")?;

        let query = Query::new(
            r#"
            MATCH (t:Transaction {id: $id})
            MATCH (e:Entity {name: $name})
            MERGE (t)-[r:INVOLVES]->(e)
            SET r.role = $role
            "#
            .to_string(),
        )
        .param("id", transaction_id.to_string())
        .param("name", name.to_string())
        .param("role", role.to_string());

        self.graph.run(query).await
            .context("Failed to link entity to transaction")?;

        Ok(())
    }
}
