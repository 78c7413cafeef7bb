//! Connection Status
//!
//! Health checks against the configured webhook, as shown next to the
//! settings.

use crate::config::Settings;
use crate::relay::now_timestamp;
use reqwest::Client;
use serde_json::json;
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Bound on the background health check
pub const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStatus {
    Disabled,
    NoWebhook,
    Ready,
    Connected,
    /// The webhook answered with a non-2xx status
    ConnectionIssues,
    Timeout,
    Failed(String),
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionStatus::Disabled => write!(f, "Disabled"),
            ConnectionStatus::NoWebhook => write!(f, "No webhook URL"),
            ConnectionStatus::Ready => write!(f, "Ready"),
            ConnectionStatus::Connected => write!(f, "Connected"),
            ConnectionStatus::ConnectionIssues => write!(f, "Connection issues"),
            ConnectionStatus::Timeout => write!(f, "Connection timeout"),
            ConnectionStatus::Failed(_) => write!(f, "Connection failed"),
        }
    }
}

impl ConnectionStatus {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionStatus::Connected)
    }

    /// Failure detail, if there is one
    pub fn detail(&self) -> Option<&str> {
        match self {
            ConnectionStatus::Failed(reason) => Some(reason),
            _ => None,
        }
    }
}

/// Status derived from the settings alone
pub fn static_status(settings: &Settings) -> ConnectionStatus {
    if !settings.enabled {
        ConnectionStatus::Disabled
    } else if settings.webhook_url.trim().is_empty() {
        ConnectionStatus::NoWebhook
    } else {
        ConnectionStatus::Ready
    }
}

/// Quick health check, bounded by [`HEALTH_CHECK_TIMEOUT`]
pub async fn check_connection(settings: &Settings) -> ConnectionStatus {
    check_connection_within(settings, HEALTH_CHECK_TIMEOUT).await
}

pub async fn check_connection_within(settings: &Settings, timeout: Duration) -> ConnectionStatus {
    let status = static_status(settings);
    if status != ConnectionStatus::Ready {
        return status;
    }

    let client = match Client::builder().timeout(timeout).build() {
        Ok(client) => client,
        Err(e) => return ConnectionStatus::Failed(e.to_string()),
    };

    debug!("Health check against {}", settings.webhook_url);
    let result = client
        .post(&settings.webhook_url)
        .json(&json!({
            "text": "Health check",
            "timestamp": now_timestamp(),
            "healthCheck": true,
        }))
        .send()
        .await;

    match result {
        Ok(response) if response.status().is_success() => ConnectionStatus::Connected,
        Ok(response) => {
            warn!("⚠️ Health check returned {}", response.status());
            ConnectionStatus::ConnectionIssues
        }
        Err(e) if e.is_timeout() => ConnectionStatus::Timeout,
        Err(e) => ConnectionStatus::Failed(e.to_string()),
    }
}

/// Explicit connection test requested by the user
pub async fn test_connection(settings: &Settings) -> ConnectionStatus {
    info!("🔌 Testing connection to {}", settings.webhook_url);
    let result = Client::new()
        .post(&settings.webhook_url)
        .json(&json!({
            "text": "Test connection from PromptEnhancer",
            "timestamp": now_timestamp(),
            "test": true,
        }))
        .send()
        .await;

    match result {
        Ok(response) if response.status().is_success() => {
            info!("✅ Connection successful");
            ConnectionStatus::Connected
        }
        Ok(response) => {
            let status = response.status();
            let reason = format!(
                "HTTP {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("")
            );
            warn!("❌ Connection test failed: {}", reason);
            ConnectionStatus::Failed(reason)
        }
        Err(e) => {
            warn!("❌ Connection test failed: {}", e);
            ConnectionStatus::Failed(e.to_string())
        }
    }
}
