//! Relay Message Types
//!
//! JSON-serializable messages between the page and the background relay.

use crate::config::Settings;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Requests sent from the page to the background relay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum RelayRequest {
    /// Forward text to the webhook
    EnhancePrompt {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        url: Option<String>,
        #[serde(default, rename = "tabId", skip_serializing_if = "Option::is_none")]
        tab_id: Option<u64>,
    },

    /// Read the user settings
    GetSettings,

    /// Overwrite the user settings
    SaveSettings { settings: Settings },
}

/// Action tags the background relay understands
pub const KNOWN_ACTIONS: [&str; 3] = ["enhance-prompt", "get-settings", "save-settings"];

impl RelayRequest {
    /// Parse a raw message. An unrecognized `action` is reported as
    /// "Unknown action"; a known action with a bad body names the problem.
    pub fn from_value(value: Value) -> Result<Self, RelayResponse> {
        let known = value
            .get("action")
            .and_then(Value::as_str)
            .is_some_and(|action| KNOWN_ACTIONS.contains(&action));
        if !known {
            return Err(RelayResponse::error("Unknown action"));
        }
        serde_json::from_value(value)
            .map_err(|e| RelayResponse::error(format!("Invalid message: {}", e)))
    }
}

/// Responses sent back by the background relay
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelayResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Settings>,
}

impl RelayResponse {
    pub fn enhanced(result: Value) -> Self {
        Self {
            success: Some(true),
            result: Some(result),
            ..Self::default()
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn saved() -> Self {
        Self {
            success: Some(true),
            ..Self::default()
        }
    }

    pub fn settings(settings: Settings) -> Self {
        Self {
            settings: Some(settings),
            ..Self::default()
        }
    }
}
