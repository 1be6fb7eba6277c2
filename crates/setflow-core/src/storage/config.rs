//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Inactivity reminder timing
//! - Notification message and enablement
//! - The default user id for new todos
//!
//! Configuration is stored at `~/.config/setflow/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;
use crate::session::ReminderTiming;

/// Session tracking configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Seconds of inactivity after a counted set before the reminder
    /// fires.
    #[serde(default = "default_reminder_delay_secs")]
    pub reminder_delay_secs: u64,
    /// Seconds the fired reminder stays visible before auto-dismissing.
    #[serde(default = "default_reminder_display_secs")]
    pub reminder_display_secs: u64,
}

/// Notification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_reminder_message")]
    pub message: String,
}

/// Todo list configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TodosConfig {
    /// User id stamped on todos created without an explicit owner.
    #[serde(default = "default_user_id")]
    pub default_user_id: i64,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/setflow/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub todos: TodosConfig,
}

// Default functions
fn default_reminder_delay_secs() -> u64 {
    30
}
fn default_reminder_display_secs() -> u64 {
    5
}
fn default_true() -> bool {
    true
}
fn default_reminder_message() -> String {
    "It's time to exercise! You can do it".into()
}
fn default_user_id() -> i64 {
    1
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            reminder_delay_secs: default_reminder_delay_secs(),
            reminder_display_secs: default_reminder_display_secs(),
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            message: default_reminder_message(),
        }
    }
}

impl Default for TodosConfig {
    fn default() -> Self {
        Self {
            default_user_id: default_user_id(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            notifications: NotificationsConfig::default(),
            todos: TodosConfig::default(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() {
            return Err("config key is empty".into());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current
                    .as_object_mut()
                    .ok_or_else(|| format!("unknown config key: {key}"))?;
                let existing = obj
                    .get(part)
                    .ok_or_else(|| format!("unknown config key: {key}"))?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(value.parse::<bool>()?),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<i64>() {
                            serde_json::Value::Number(n.into())
                        } else {
                            return Err(format!("cannot parse '{value}' as number").into());
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value)?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current
                .get_mut(part)
                .ok_or_else(|| format!("unknown config key: {key}"))?;
        }

        Err(format!("unknown config key: {key}").into())
    }

    pub fn path() -> Result<PathBuf, Box<dyn std::error::Error>> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or return default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content)?;
                Ok(cfg)
            }
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(Self::path()?, content)?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key. Returns error if key is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), Box<dyn std::error::Error>> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json)?;
        self.save()?;
        Ok(())
    }

    /// Reminder timing derived from the `[session]` section.
    pub fn reminder_timing(&self) -> ReminderTiming {
        ReminderTiming {
            delay_ms: self.session.reminder_delay_secs.saturating_mul(1000),
            display_ms: self.session.reminder_display_secs.saturating_mul(1000),
        }
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.session.reminder_delay_secs, 30);
        assert_eq!(parsed.session.reminder_display_secs, 5);
        assert!(parsed.notifications.enabled);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("session.reminder_delay_secs").as_deref(), Some("30"));
        assert_eq!(cfg.get("notifications.enabled").as_deref(), Some("true"));
        assert_eq!(cfg.get("todos.default_user_id").as_deref(), Some("1"));
        assert!(cfg.get("session.missing_key").is_none());
    }

    #[test]
    fn set_json_value_by_path_updates_nested_number() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        Config::set_json_value_by_path(&mut json, "session.reminder_delay_secs", "45").unwrap();
        assert_eq!(
            Config::get_json_value_by_path(&json, "session.reminder_delay_secs").unwrap(),
            &serde_json::Value::Number(45.into())
        );
    }

    #[test]
    fn set_json_value_by_path_updates_nested_bool() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        Config::set_json_value_by_path(&mut json, "notifications.enabled", "false").unwrap();
        assert_eq!(
            Config::get_json_value_by_path(&json, "notifications.enabled").unwrap(),
            &serde_json::Value::Bool(false)
        );
    }

    #[test]
    fn set_json_value_by_path_rejects_unknown_key() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        let result = Config::set_json_value_by_path(&mut json, "session.nonexistent", "1");
        assert!(result.is_err());
    }

    #[test]
    fn set_json_value_by_path_rejects_invalid_type() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        let result =
            Config::set_json_value_by_path(&mut json, "session.reminder_delay_secs", "soon");
        assert!(result.is_err());
    }

    #[test]
    fn reminder_timing_converts_to_millis() {
        let mut cfg = Config::default();
        cfg.session.reminder_delay_secs = 45;
        cfg.session.reminder_display_secs = 10;
        let timing = cfg.reminder_timing();
        assert_eq!(timing.delay_ms, 45_000);
        assert_eq!(timing.display_ms, 10_000);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let parsed: Config = toml::from_str("[session]\nreminder_delay_secs = 60\n").unwrap();
        assert_eq!(parsed.session.reminder_delay_secs, 60);
        assert_eq!(parsed.session.reminder_display_secs, 5);
        assert!(parsed.notifications.enabled);
        assert_eq!(parsed.todos.default_user_id, 1);
    }
}
