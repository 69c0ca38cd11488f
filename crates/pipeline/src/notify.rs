use assess::RiskAssessment;
use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};

use crate::context::TransactionContext;

const CALLBACK_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Serialize)]
struct CallbackPayload<'a> {
    transaction_id: &'a str,
    run_id: &'a str,
    status: &'a str,
    risk_assessment: &'a RiskAssessment,
}

/// Fire-and-forget completion callback. A missing URL, a transport error,
/// or a non-2xx response is logged and reported as `false`; never retried,
/// never fatal.
pub async fn send_callback(ctx: &TransactionContext, assessment: &RiskAssessment) -> bool {
    let Some(url) = ctx.callback_url.as_deref() else {
        warn!(
            transaction_id = %ctx.transaction_id,
            "No callback URL provided, skipping notification"
        );
        return false;
    };

    let payload = CallbackPayload {
        transaction_id: &ctx.transaction_id,
        run_id: &ctx.run_id,
        status: "completed",
        risk_assessment: assessment,
    };

    info!(transaction_id = %ctx.transaction_id, callback_url = url, "Sending callback");

    let client = reqwest::Client::new();
    match client
        .post(url)
        .timeout(CALLBACK_TIMEOUT)
        .json(&payload)
        .send()
        .await
    {
        Ok(response) if response.status().is_success() => {
            info!(transaction_id = %ctx.transaction_id, "Callback sent successfully");
            true
        }
        Ok(response) => {
            warn!(
                transaction_id = %ctx.transaction_id,
                status = %response.status(),
                "Callback endpoint returned an error"
            );
            false
        }
        Err(e) => {
            warn!(transaction_id = %ctx.transaction_id, error = %e, "Error sending callback");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_callback_url_is_skipped() {
        let ctx = TransactionContext::new("t1", "text", None).unwrap();
        let assessment = RiskAssessment::degraded("t1", &anyhow::anyhow!("n/a"));
        assert!(!send_callback(&ctx, &assessment).await);
    }

    #[test]
    fn test_payload_shape() {
        let assessment = RiskAssessment::degraded("t1", &anyhow::anyhow!("n/a"));
        let payload = CallbackPayload {
            transaction_id: "t1",
            run_id: "r1",
            status: "completed",
            risk_assessment: &assessment,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["status"], "completed");
        assert_eq!(json["risk_assessment"]["risk_score"], 0.5);
    }
}
