//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Notification switches (global and per category)
//! - Reminder timing defaults
//! - The UTC offset used for day boundaries
//! - Appearance settings
//! - Remote backend connection
//!
//! Configuration is stored at `~/.config/lifeloop/config.toml`.

use std::path::{Path, PathBuf};

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::date_key::offset_from_minutes;
use crate::error::ConfigError;

/// Notification switches. Categories are independent of each other; the
/// global flag gates all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub tasks: bool,
    #[serde(default = "default_true")]
    pub habits: bool,
    #[serde(default = "default_true")]
    pub routines: bool,
    #[serde(default = "default_true")]
    pub reminders: bool,
}

/// Reminder timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemindersConfig {
    /// Hour used when an item has a date but no time.
    #[serde(default = "default_fallback_hour")]
    pub fallback_hour: u32,
    #[serde(default)]
    pub fallback_minute: u32,
    /// Lead time of the day-before task nudge.
    #[serde(default = "default_day_before_hours")]
    pub day_before_hours: i64,
    /// Lead time of the due-soon task nudge.
    #[serde(default = "default_due_soon_minutes")]
    pub due_soon_minutes: i64,
}

/// Day-boundary settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TimeConfig {
    /// Minutes east of UTC used to decide which calendar day an instant falls on.
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

/// UI configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_true")]
    pub dark_mode: bool,
    #[serde(default = "default_accent_color")]
    pub accent_color: String,
}

/// Remote backend connection. An empty `base_url` means offline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RemoteConfig {
    #[serde(default)]
    pub base_url: String,
    /// Project API key sent with every request.
    #[serde(default)]
    pub api_key: String,
    /// Session token; requests fall back to the API key when empty.
    #[serde(default)]
    pub access_token: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/lifeloop/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub notifications: NotificationSettings,
    #[serde(default)]
    pub reminders: RemindersConfig,
    #[serde(default)]
    pub time: TimeConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub remote: RemoteConfig,
}

/// Color palette derived from [`UiConfig`]. A new value is produced whenever
/// the configuration changes; nothing holds a shared mutable palette.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Theme {
    pub dark: bool,
    pub background: String,
    pub surface: String,
    pub text: String,
    pub muted: String,
    pub accent: String,
}

// Default functions
fn default_true() -> bool {
    true
}
fn default_fallback_hour() -> u32 {
    9
}
fn default_day_before_hours() -> i64 {
    24
}
fn default_due_soon_minutes() -> i64 {
    30
}
fn default_accent_color() -> String {
    "#10b981".into()
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            tasks: true,
            habits: true,
            routines: true,
            reminders: true,
        }
    }
}

impl Default for RemindersConfig {
    fn default() -> Self {
        Self {
            fallback_hour: default_fallback_hour(),
            fallback_minute: 0,
            day_before_hours: default_day_before_hours(),
            due_soon_minutes: default_due_soon_minutes(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            dark_mode: true,
            accent_color: default_accent_color(),
        }
    }
}

impl Theme {
    pub fn from_ui(ui: &UiConfig) -> Self {
        let (background, surface, text, muted) = if ui.dark_mode {
            ("#0f172a", "#1e293b", "#f8fafc", "#94a3b8")
        } else {
            ("#ffffff", "#f1f5f9", "#0f172a", "#64748b")
        };
        Self {
            dark: ui.dark_mode,
            background: background.into(),
            surface: surface.into(),
            text: text.into(),
            muted: muted.into(),
            accent: ui.accent_color.clone(),
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
    ) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let unknown = || ConfigError::UnknownKey(key.to_string());

        let mut parts = key.split('.').peekable();
        if parts.peek().map_or(true, |p| p.is_empty()) {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        let n = value
                            .parse::<i64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as integer")))?;
                        serde_json::Value::Number(n.into())
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk, writing and returning the default when no file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
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

    /// Set a config value by dot-separated key without persisting.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed
    /// into the field's type.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Set a config value by key and save. Returns error if key is unknown.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.set_value(key, value)?;
        self.save()
    }

    /// Fixed offset used for day boundaries and wall-clock triggers.
    pub fn offset(&self) -> FixedOffset {
        offset_from_minutes(self.time.utc_offset_minutes)
    }

    /// Palette for the current appearance settings.
    pub fn theme(&self) -> Theme {
        Theme::from_ui(&self.ui)
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "falling back to default configuration");
            Self::default()
        })
    }
}
