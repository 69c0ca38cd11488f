pub mod schema;
pub mod llm;
pub mod prompt;

pub use schema::{EntitySet, Organization, Person, TransactionDetails};
pub use llm::OllamaClient;

use anyhow::{Context, Result};
use tracing::{info, warn};

pub struct Extractor {
    llm_client: OllamaClient,
}

impl Extractor {
    pub fn new(llm_client: OllamaClient) -> Self {
        Self { llm_client }
    }

    /// Extract organizations and people from raw transaction text.
    ///
    /// Extraction failure is fatal to the caller: without entities nothing
    /// downstream can proceed meaningfully.
    pub async fn extract(&self, transaction_text: &str, transaction_id: &str) -> Result<EntitySet> {
        if transaction_text.trim().is_empty() {
            anyhow::bail!("Transaction text is empty");
        }

        info!(transaction_id, "Extracting entities");

        let prompt = prompt::build_extraction_prompt(transaction_text);
        let json_str = self.llm_client
            .generate_json_with_retry(&prompt, 3)
            .await
            .context("Failed to extract entities after retries")?;

        let mut entities: EntitySet = serde_json::from_str(&json_str)
            .context("Failed to parse extraction result")?;

        // The model sometimes invents its own id; the caller's id wins.
        entities.transaction_id = transaction_id.to_string();

        self.log_unknown_labels(&entities, transaction_id);

        info!(
            transaction_id,
            organizations = entities.organizations.len(),
            people = entities.people.len(),
            "Extracted entities"
        );

        Ok(entities)
    }

    fn log_unknown_labels(&self, entities: &EntitySet, transaction_id: &str) {
        for org in &entities.organizations {
            if !org.role.is_empty() && !schema::is_known_organization_role(&org.role) {
                warn!(transaction_id, organization = %org.name, role = %org.role, "Unknown organization role");
            }
            if !org.entity_type.is_empty() && !schema::is_known_entity_type(&org.entity_type) {
                warn!(transaction_id, organization = %org.name, entity_type = %org.entity_type, "Unknown entity type");
            }
        }
        for person in &entities.people {
            if !person.role.is_empty() && !schema::is_known_person_role(&person.role) {
                warn!(transaction_id, person = %person.name, role = %person.role, "Unknown person role");
            }
        }
    }
}
