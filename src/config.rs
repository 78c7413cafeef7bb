//! Settings and Configuration
//!
//! Two layers: the user settings (`enabled`, `webhookUrl`,
//! `showNotifications`) kept in a key-value [`SettingsStore`], and the
//! runtime [`Config`] with transport and logging knobs.

use crate::error::{EnhancerError, EnhancerResult};
use crate::utils::url::is_valid_url;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const DEFAULT_WEBHOOK_URL: &str = "http://localhost:5678/webhook-test/n8n/prompt/enhance";

pub const KEY_ENABLED: &str = "enabled";
pub const KEY_WEBHOOK_URL: &str = "webhookUrl";
pub const KEY_SHOW_NOTIFICATIONS: &str = "showNotifications";

pub const SETTINGS_KEYS: [&str; 3] = [KEY_ENABLED, KEY_WEBHOOK_URL, KEY_SHOW_NOTIFICATIONS];

/// User settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub enabled: bool,
    pub webhook_url: String,
    pub show_notifications: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enabled: true,
            webhook_url: DEFAULT_WEBHOOK_URL.to_string(),
            show_notifications: true,
        }
    }
}

impl Settings {
    /// Read settings from raw store values. Missing or mistyped keys fall
    /// back to defaults; an empty webhook URL means the default one.
    ///
    /// A missing `enabled` key reads as enabled. Stores that were never
    /// seeded with [`install_defaults`] therefore behave as switched on,
    /// where the browser extension treated an absent flag as disabled.
    pub fn from_map(values: &Map<String, Value>) -> Self {
        let defaults = Self::default();
        Self {
            enabled: values
                .get(KEY_ENABLED)
                .and_then(Value::as_bool)
                .unwrap_or(defaults.enabled),
            webhook_url: values
                .get(KEY_WEBHOOK_URL)
                .and_then(Value::as_str)
                .filter(|url| !url.trim().is_empty())
                .map(|url| url.trim().to_string())
                .unwrap_or(defaults.webhook_url),
            show_notifications: values
                .get(KEY_SHOW_NOTIFICATIONS)
                .and_then(Value::as_bool)
                .unwrap_or(defaults.show_notifications),
        }
    }

    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert(KEY_ENABLED.to_string(), Value::Bool(self.enabled));
        map.insert(
            KEY_WEBHOOK_URL.to_string(),
            Value::String(self.webhook_url.clone()),
        );
        map.insert(
            KEY_SHOW_NOTIFICATIONS.to_string(),
            Value::Bool(self.show_notifications),
        );
        map
    }

    /// Reject settings that cannot work
    pub fn validate(&self) -> EnhancerResult<()> {
        if !is_valid_url(&self.webhook_url) {
            return Err(EnhancerError::Config(format!(
                "webhook URL must be http(s): {}",
                self.webhook_url
            )));
        }
        Ok(())
    }
}

/// Persistent key-value settings store
pub trait SettingsStore: Send + Sync {
    /// Values for the requested keys; absent keys are simply missing
    fn get_many(&self, keys: &[&str]) -> EnhancerResult<Map<String, Value>>;

    fn set_many(&self, entries: Map<String, Value>) -> EnhancerResult<()>;

    fn remove(&self, keys: &[&str]) -> EnhancerResult<()>;

    fn clear(&self) -> EnhancerResult<()>;

    fn get(&self, key: &str) -> EnhancerResult<Option<Value>> {
        Ok(self.get_many(&[key])?.remove(key))
    }

    fn set(&self, key: &str, value: Value) -> EnhancerResult<()> {
        let mut entries = Map::new();
        entries.insert(key.to_string(), value);
        self.set_many(entries)
    }

    /// Existing value, or `default` after storing it. Store errors yield
    /// `default` too.
    fn get_or_default(&self, key: &str, default: Value) -> Value {
        match self.get(key) {
            Ok(Some(value)) => value,
            Ok(None) => {
                if let Err(e) = self.set(key, default.clone()) {
                    tracing::warn!("Failed to store default for '{}': {}", key, e);
                }
                default
            }
            Err(e) => {
                tracing::warn!("Error in get_or_default for '{}': {}", key, e);
                default
            }
        }
    }

    /// Typed view of the user settings
    fn settings(&self) -> EnhancerResult<Settings> {
        Ok(Settings::from_map(&self.get_many(&SETTINGS_KEYS)?))
    }

    fn save_settings(&self, settings: &Settings) -> EnhancerResult<()> {
        self.set_many(settings.to_map())
    }
}

/// First-run defaults; keys that already exist are left alone
pub fn install_defaults(store: &dyn SettingsStore) -> EnhancerResult<()> {
    let existing = store.get_many(&SETTINGS_KEYS)?;
    let missing: Map<String, Value> = Settings::default()
        .to_map()
        .into_iter()
        .filter(|(key, _)| !existing.contains_key(key))
        .collect();
    if !missing.is_empty() {
        tracing::info!("⚙️ Installing default settings: {:?}", missing.keys());
        store.set_many(missing)?;
    }
    Ok(())
}

fn pick(values: &Map<String, Value>, keys: &[&str]) -> Map<String, Value> {
    keys.iter()
        .filter_map(|key| values.get(*key).map(|v| (key.to_string(), v.clone())))
        .collect()
}

/// Settings store held in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<Map<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: &Settings) -> Self {
        Self {
            values: Mutex::new(settings.to_map()),
        }
    }
}

impl SettingsStore for MemoryStore {
    fn get_many(&self, keys: &[&str]) -> EnhancerResult<Map<String, Value>> {
        let values = self.values.lock()?;
        Ok(pick(&values, keys))
    }

    fn set_many(&self, entries: Map<String, Value>) -> EnhancerResult<()> {
        self.values.lock()?.extend(entries);
        Ok(())
    }

    fn remove(&self, keys: &[&str]) -> EnhancerResult<()> {
        let mut values = self.values.lock()?;
        for key in keys {
            values.remove(*key);
        }
        Ok(())
    }

    fn clear(&self) -> EnhancerResult<()> {
        self.values.lock()?.clear();
        Ok(())
    }
}

/// Settings store persisted as one JSON object on disk
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    values: Mutex<Map<String, Value>>,
}

impl JsonFileStore {
    /// Open the store at `path`. A corrupt file is moved aside and the store
    /// starts empty.
    pub fn open(path: impl Into<PathBuf>) -> EnhancerResult<Self> {
        let path = path.into();
        let values = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            match serde_json::from_str::<Map<String, Value>>(&content) {
                Ok(values) => values,
                Err(e) => {
                    tracing::warn!(
                        "⚠️ Settings file corrupted or invalid, starting empty: {}",
                        e
                    );
                    let backup_path = path.with_extension("json.corrupt");
                    let _ = std::fs::rename(&path, &backup_path);
                    Map::new()
                }
            }
        } else {
            Map::new()
        };
        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    /// Store at the default location
    pub fn open_default() -> EnhancerResult<Self> {
        Self::open(settings_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, values: &Map<String, Value>) -> EnhancerResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(values)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

impl SettingsStore for JsonFileStore {
    fn get_many(&self, keys: &[&str]) -> EnhancerResult<Map<String, Value>> {
        let values = self.values.lock()?;
        Ok(pick(&values, keys))
    }

    fn set_many(&self, entries: Map<String, Value>) -> EnhancerResult<()> {
        let mut values = self.values.lock()?;
        values.extend(entries);
        self.persist(&values)
    }

    fn remove(&self, keys: &[&str]) -> EnhancerResult<()> {
        let mut values = self.values.lock()?;
        for key in keys {
            values.remove(*key);
        }
        self.persist(&values)
    }

    fn clear(&self) -> EnhancerResult<()> {
        let mut values = self.values.lock()?;
        values.clear();
        self.persist(&values)
    }
}

/// How enhancement requests leave the page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// Through the background relay task
    #[default]
    Background,
    /// Straight to the webhook
    Direct,
}

/// Runtime configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub transport: Transport,
    pub log_level: String,
    /// Upper bound on a relay round trip. Unset means wait indefinitely.
    pub relay_timeout_secs: Option<u64>,
    /// URL reported to the webhook as the page the text came from
    pub page_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            transport: Transport::Background,
            log_level: "INFO".to_string(),
            relay_timeout_secs: None,
            page_url: None,
        }
    }
}

impl Config {
    /// Load config from the default location, or defaults
    pub fn load() -> EnhancerResult<Self> {
        Self::load_from(&config_path())
    }

    pub fn load_from(path: &Path) -> EnhancerResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        match serde_json::from_str(&content) {
            Ok(config) => Ok(config),
            Err(e) => {
                // Graceful degradation: log warning and use defaults
                tracing::warn!("⚠️ Config file corrupted or invalid, using defaults: {}", e);
                let backup_path = path.with_extension("json.corrupt");
                let _ = std::fs::rename(path, &backup_path);
                Ok(Self::default())
            }
        }
    }

    pub fn save(&self) -> EnhancerResult<()> {
        self.save_to(&config_path())
    }

    pub fn save_to(&self, path: &Path) -> EnhancerResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("prompt-enhancer")
}

pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert!(settings.enabled);
        assert!(settings.show_notifications);
        assert_eq!(settings.webhook_url, DEFAULT_WEBHOOK_URL);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_settings_from_partial_map() {
        let mut values = Map::new();
        values.insert(KEY_ENABLED.into(), json!(false));
        values.insert(KEY_WEBHOOK_URL.into(), json!(""));
        let settings = Settings::from_map(&values);
        assert!(!settings.enabled);
        assert_eq!(settings.webhook_url, DEFAULT_WEBHOOK_URL);
        assert!(settings.show_notifications);
    }

    #[test]
    fn test_settings_serialize_camel_case() {
        let json = serde_json::to_string(&Settings::default()).unwrap();
        assert!(json.contains("webhookUrl"));
        assert!(json.contains("showNotifications"));
    }

    #[test]
    fn test_invalid_webhook_rejected() {
        let settings = Settings {
            webhook_url: "ftp://example.com/hook".into(),
            ..Settings::default()
        };
        assert!(matches!(settings.validate(), Err(EnhancerError::Config(_))));
    }

    #[test]
    fn test_memory_store_operations() {
        let store = MemoryStore::new();
        store.set("a", json!(1)).unwrap();
        store.set("b", json!("two")).unwrap();
        assert_eq!(store.get("a").unwrap(), Some(json!(1)));

        let many = store.get_many(&["a", "b", "missing"]).unwrap();
        assert_eq!(many.len(), 2);

        store.remove(&["a"]).unwrap();
        assert_eq!(store.get("a").unwrap(), None);

        store.clear().unwrap();
        assert!(store.get_many(&["b"]).unwrap().is_empty());
    }

    #[test]
    fn test_get_or_default_writes_default() {
        let store = MemoryStore::new();
        assert_eq!(store.get_or_default("theme", json!("dark")), json!("dark"));
        assert_eq!(store.get("theme").unwrap(), Some(json!("dark")));

        store.set("theme", json!("light")).unwrap();
        assert_eq!(store.get_or_default("theme", json!("dark")), json!("light"));
    }

    #[test]
    fn test_install_defaults_keeps_existing() {
        let store = MemoryStore::new();
        store.set(KEY_ENABLED, json!(false)).unwrap();
        install_defaults(&store).unwrap();

        let settings = store.settings().unwrap();
        assert!(!settings.enabled);
        assert_eq!(
            store.get(KEY_WEBHOOK_URL).unwrap(),
            Some(json!(DEFAULT_WEBHOOK_URL))
        );
    }

    #[test]
    fn test_file_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        {
            let store = JsonFileStore::open(&path).unwrap();
            store
                .save_settings(&Settings {
                    enabled: false,
                    ..Settings::default()
                })
                .unwrap();
        }
        let reopened = JsonFileStore::open(&path).unwrap();
        assert!(!reopened.settings().unwrap().enabled);
    }

    #[test]
    fn test_file_store_get_many_picks_requested_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path().join("settings.json")).unwrap();
        store.set(KEY_ENABLED, json!(false)).unwrap();
        store.set(KEY_WEBHOOK_URL, json!("https://hooks.example/a")).unwrap();

        let picked = store.get_many(&[KEY_ENABLED, "missing"]).unwrap();
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[KEY_ENABLED], json!(false));
    }

    #[test]
    fn test_missing_enabled_reads_as_enabled() {
        let store = MemoryStore::new();
        store.set(KEY_WEBHOOK_URL, json!("https://hooks.example/a")).unwrap();
        assert!(store.settings().unwrap().enabled);
    }

    #[test]
    fn test_file_store_corrupt_file_moved_aside() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not valid json").unwrap();

        let store = JsonFileStore::open(&path).unwrap();
        assert!(store.get_many(&SETTINGS_KEYS).unwrap().is_empty());
        assert!(dir.path().join("settings.json.corrupt").exists());
    }

    #[test]
    fn test_config_roundtrip_and_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        assert_eq!(Config::load_from(&path).unwrap(), Config::default());

        let config = Config {
            transport: Transport::Direct,
            relay_timeout_secs: Some(30),
            ..Config::default()
        };
        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);

        std::fs::write(&path, "[1, 2").unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), Config::default());
    }
}
