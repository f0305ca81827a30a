//! Webhook notification dispatch for newly raised warning alerts.
//!
//! Fire-and-forget HTTP POST of the alert as JSON.

use sepwatch_core::alert::Alert;
use sepwatch_core::types::{EngineError, Result};
use serde_json::{json, Value};
use tracing::warn;

/// Dispatches alerts to a webhook URL via HTTP POST.
#[derive(Clone)]
pub struct WebhookDispatcher {
    url: String,
    client: reqwest::Client,
}

fn payload(alert: &Alert) -> Value {
    json!({
        "id": alert.id,
        "kind": alert.kind().as_str(),
        "severity": alert.severity.as_str(),
        "title": alert.title,
        "details": alert.details,
        "aircraft": alert.aircraft,
        "lat": alert.location.lat,
        "lon": alert.location.lon,
        "timestamp": alert.timestamp,
    })
}

impl WebhookDispatcher {
    pub fn new(url: &str) -> Self {
        WebhookDispatcher {
            url: url.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Fire-and-forget POST. Must be called from within a tokio runtime.
    pub fn notify(&self, alert: &Alert) {
        let body = payload(alert);
        let client = self.client.clone();
        let url = self.url.clone();
        let id = alert.id.clone();

        tokio::spawn(async move {
            if let Err(e) = deliver(&client, &url, &body).await {
                warn!(alert = %id, error = %e, "webhook POST failed");
            }
        });
    }
}

/// POST one payload; non-2xx responses count as failures.
async fn deliver(client: &reqwest::Client, url: &str, body: &Value) -> Result<()> {
    client
        .post(url)
        .json(body)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| EngineError::Webhook(e.to_string()))?;
    Ok(())
}
