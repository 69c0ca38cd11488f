use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Immutable identifiers for one pipeline run, cloned into every task that
/// needs them. Validation happens here, before any side effect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionContext {
    pub transaction_id: String,
    pub transaction_data: String,
    pub callback_url: Option<String>,
    pub run_id: String,
}

impl TransactionContext {
    pub fn new(
        transaction_id: impl Into<String>,
        transaction_data: impl Into<String>,
        callback_url: Option<String>,
    ) -> Result<Self> {
        let transaction_id = transaction_id.into();
        let transaction_data = transaction_data.into();

        if transaction_id.trim().is_empty() {
            bail!("Transaction ID not provided");
        }
        if transaction_data.trim().is_empty() {
            bail!("Transaction data not provided");
        }

        Ok(Self {
            transaction_id,
            transaction_data,
            callback_url: callback_url.filter(|url| !url.trim().is_empty()),
            run_id: Uuid::new_v4().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_context() {
        let ctx = TransactionContext::new("t1", "Acme Corp paid Globex Inc", None).unwrap();
        assert_eq!(ctx.transaction_id, "t1");
        assert!(ctx.callback_url.is_none());
        assert!(!ctx.run_id.is_empty());
    }

    #[test]
    fn test_missing_id_is_fatal() {
        assert!(TransactionContext::new("  ", "some text", None).is_err());
    }

    #[test]
    fn test_missing_text_is_fatal() {
        assert!(TransactionContext::new("t1", "", None).is_err());
    }

    #[test]
    fn test_blank_callback_url_is_dropped() {
        let ctx = TransactionContext::new("t1", "text", Some("  ".to_string())).unwrap();
        assert!(ctx.callback_url.is_none());
    }
}
