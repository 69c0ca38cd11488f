use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use tracing::{error, info, warn};

/// Per-transaction document store on disk.
///
/// Active runs live under `<root>/transactions/<id>/`; finalization moves a
/// completed transaction under `<root>/knowledge_base/<id>/`. Reads check
/// both locations so late queries keep working after migration.
pub struct KnowledgeBase {
    root: PathBuf,
}

impl KnowledgeBase {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn transaction_dir(&self, transaction_id: &str) -> PathBuf {
        self.root.join("transactions").join(sanitize(transaction_id))
    }

    fn migrated_dir(&self, transaction_id: &str) -> PathBuf {
        self.root.join("knowledge_base").join(sanitize(transaction_id))
    }

    /// Create the transaction's folder structure. Called once at run start.
    pub async fn init_transaction(&self, transaction_id: &str) -> Result<()> {
        let dir = self.transaction_dir(transaction_id);
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create transaction folder {}", dir.display()))?;
        Ok(())
    }

    pub async fn save_text(&self, transaction_id: &str, name: &str, text: &str) -> Result<()> {
        let path = self.transaction_dir(transaction_id).join(name);
        tokio::fs::write(&path, text)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    pub async fn save_document<T: Serialize>(
        &self,
        transaction_id: &str,
        name: &str,
        document: &T,
    ) -> Result<()> {
        let path = self.transaction_dir(transaction_id).join(name);
        let json = serde_json::to_string_pretty(document)
            .with_context(|| format!("Failed to serialize {}", name))?;
        tokio::fs::write(&path, json)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    /// Load a document, looking first in the active transaction folder and
    /// then in the migrated knowledge base.
    pub async fn load_document(&self, transaction_id: &str, name: &str) -> Result<Value> {
        let active = self.transaction_dir(transaction_id).join(name);
        let migrated = self.migrated_dir(transaction_id).join(name);

        let path = if active.exists() { active } else { migrated };
        let json = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&json).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Persist one source's raw response for audit, under
    /// `lookups/<source>/<subject>.json`.
    pub async fn save_lookup_response(
        &self,
        transaction_id: &str,
        source_key: &str,
        subject: &str,
        response: &Value,
    ) -> Result<()> {
        let dir = self
            .transaction_dir(transaction_id)
            .join("lookups")
            .join(source_key);
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create {}", dir.display()))?;

        let path = dir.join(format!("{}.json", sanitize(subject)));
        let json = serde_json::to_string_pretty(response)
            .context("Failed to serialize lookup response")?;
        tokio::fs::write(&path, json)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    /// Move a completed transaction's folder into the knowledge base.
    /// Best-effort: failures are logged and reported, never propagated.
    pub async fn migrate_transaction(&self, transaction_id: &str) -> bool {
        let from = self.transaction_dir(transaction_id);
        if !from.exists() {
            warn!(transaction_id, "No transaction folder to migrate");
            return false;
        }

        let dest_root = self.root.join("knowledge_base");
        if let Err(e) = tokio::fs::create_dir_all(&dest_root).await {
            error!(transaction_id, error = %e, "Failed to create knowledge base folder");
            return false;
        }

        let to = self.migrated_dir(transaction_id);
        match tokio::fs::rename(&from, &to).await {
            Ok(()) => {
                info!(transaction_id, "Organized transaction into knowledge base");
                true
            }
            Err(e) => {
                error!(transaction_id, error = %e, "Failed to organize knowledge base");
                false
            }
        }
    }
}

/// Subject names and ids come from model output; keep them filesystem-safe.
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '.' { c } else { '_' })
        .collect()
}
