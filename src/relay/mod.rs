//! Relay Module
//!
//! The boundary between the page and the remote rewriting service. A relay
//! forwards captured text and returns the raw response payload; shaping that
//! payload into enhanced text happens once, in `core::normalize`, whatever
//! the transport.
//!
//! Two transports:
//! - [`WebhookRelay`]: POSTs straight to the configured webhook.
//! - [`RelayClient`]: message passing to a [`BackgroundRelay`] task that
//!   owns the webhook relay and the settings store.

pub mod background;
pub mod messages;
pub mod webhook;

pub use background::{BackgroundRelay, BackgroundService, RelayClient};
pub use messages::{RelayRequest, RelayResponse};
pub use webhook::WebhookRelay;

use crate::config::{Config, SettingsStore, Transport};
use crate::error::{EnhancerResult, RelayError};
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

/// One enhancement request as it leaves the page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnhanceRequest {
    pub text: String,
    /// RFC 3339, UTC, millisecond precision
    pub timestamp: String,
    pub page_url: Option<String>,
    pub tab_id: Option<u64>,
}

impl EnhanceRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            timestamp: now_timestamp(),
            page_url: None,
            tab_id: None,
        }
    }

    pub fn with_page(mut self, page_url: Option<String>, tab_id: Option<u64>) -> Self {
        self.page_url = page_url;
        self.tab_id = tab_id;
        self
    }
}

/// Current time in the ISO form the webhook expects
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Trait for relay transports
#[async_trait]
pub trait Relay: Send + Sync {
    /// Forward the text and return the raw response payload
    async fn enhance(&self, request: &EnhanceRequest) -> Result<Value, RelayError>;

    /// Transport name for logs
    fn name(&self) -> &str;
}

/// A relay plus whatever keeps it running
pub struct RelayHandle {
    pub relay: Arc<dyn Relay>,
    /// Present for the background transport; dropping it stops the task
    pub background: Option<BackgroundRelay>,
}

/// Factory to create the configured relay transport
pub fn create_relay(config: &Config, store: Arc<dyn SettingsStore>) -> EnhancerResult<RelayHandle> {
    let webhook = match config.relay_timeout_secs {
        Some(secs) => {
            WebhookRelay::with_timeout(store.clone(), std::time::Duration::from_secs(secs))?
        }
        None => WebhookRelay::new(store.clone()),
    };

    let handle = match config.transport {
        Transport::Direct => RelayHandle {
            relay: Arc::new(webhook),
            background: None,
        },
        Transport::Background => {
            let background = BackgroundRelay::spawn(BackgroundService::new(store, webhook));
            RelayHandle {
                relay: Arc::new(background.client()),
                background: Some(background),
            }
        }
    };
    info!("✅ Relay transport '{}' ready", handle.relay.name());
    Ok(handle)
}
