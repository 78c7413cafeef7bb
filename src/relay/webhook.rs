//! Webhook Relay
//!
//! Direct transport: POST the text as JSON to the configured webhook and
//! hand back whatever JSON it answers with.

use super::{EnhanceRequest, Relay};
use crate::config::SettingsStore;
use crate::error::{EnhancerResult, RelayError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Body POSTed to the webhook
#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    text: &'a str,
    timestamp: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<&'a str>,
    #[serde(rename = "tabId", skip_serializing_if = "Option::is_none")]
    tab_id: Option<u64>,
}

#[derive(Clone)]
pub struct WebhookRelay {
    client: Client,
    store: Arc<dyn SettingsStore>,
}

impl WebhookRelay {
    /// Relay without a client-side timeout
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self {
            client: Client::new(),
            store,
        }
    }

    /// Relay that gives up after `timeout`
    pub fn with_timeout(store: Arc<dyn SettingsStore>, timeout: Duration) -> EnhancerResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, store })
    }

    pub fn store(&self) -> &Arc<dyn SettingsStore> {
        &self.store
    }
}

#[async_trait]
impl Relay for WebhookRelay {
    async fn enhance(&self, request: &EnhanceRequest) -> Result<Value, RelayError> {
        let settings = self
            .store
            .settings()
            .map_err(|e| RelayError::Transport(format!("Could not read settings: {e}")))?;

        if !settings.enabled {
            return Err(RelayError::Disabled);
        }

        info!("🌐 Sending {} chars to webhook", request.text.chars().count());
        let response = self
            .client
            .post(&settings.webhook_url)
            .json(&WebhookPayload {
                text: &request.text,
                timestamp: &request.timestamp,
                url: request.page_url.as_deref(),
                tab_id: request.tab_id,
            })
            .send()
            .await?;

        let status = response.status();
        let body_text = response.text().await?;

        if !status.is_success() {
            warn!("❌ Webhook error ({}): {}", status, body_text);
            return Err(RelayError::Http(status.as_u16()));
        }

        debug!("🧠 Webhook raw body: {}", body_text);

        serde_json::from_str(&body_text).map_err(|e| {
            warn!(
                "❌ Failed to parse webhook response: {} - Body: {}",
                e, body_text
            );
            RelayError::MalformedResponse(e.to_string())
        })
    }

    fn name(&self) -> &str {
        "webhook"
    }
}
