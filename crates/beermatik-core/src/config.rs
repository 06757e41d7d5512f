//! TOML-based application configuration.
//!
//! Stores the reminder notification text. Configuration lives at
//! `~/.config/beermatik/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ConfigError;
use crate::notify::ReminderText;
use crate::storage::data_dir;

/// Reminder notification text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderConfig {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_body")]
    pub body: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/beermatik/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub reminder: ReminderConfig,
}

fn default_title() -> String {
    "Beermatik".to_string()
}

fn default_body() -> String {
    "Time for your next beer? Update your counter.".to_string()
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            body: default_body(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            reminder: ReminderConfig::default(),
        }
    }
}

impl ReminderConfig {
    pub fn text(&self) -> ReminderText {
        ReminderText {
            title: self.title.clone(),
            body: self.body.clone(),
        }
    }
}

impl Config {
    fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("~/.config/beermatik"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from disk, writing the default file on first run.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path,
                message: e.to_string(),
            }),
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Load from disk, returning the default on any error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path()?;
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, content).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let value = get_by_path(&json, key)?;
        match value {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key and save.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed
    /// into the existing type, or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        set_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        self.save()
    }
}

fn get_by_path<'a>(root: &'a serde_json::Value, key: &str) -> Option<&'a serde_json::Value> {
    if key.is_empty() {
        return None;
    }
    let mut current = root;
    for part in key.split('.') {
        current = current.get(part)?;
    }
    Some(current)
}

fn set_by_path(root: &mut serde_json::Value, key: &str, value: &str) -> Result<(), ConfigError> {
    let invalid = |message: String| ConfigError::InvalidValue {
        key: key.to_string(),
        message,
    };

    let Some((parent_path, leaf)) = split_leaf(key) else {
        return Err(ConfigError::UnknownKey(key.to_string()));
    };
    let parent = match parent_path {
        Some(path) => {
            let mut current = &mut *root;
            for part in path.split('.') {
                current = current
                    .get_mut(part)
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
            }
            current
        }
        None => root,
    };
    let object = parent
        .as_object_mut()
        .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
    let existing = object
        .get(leaf)
        .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;

    let new_value = match existing {
        serde_json::Value::Bool(_) => serde_json::Value::Bool(
            value
                .parse::<bool>()
                .map_err(|e| invalid(e.to_string()))?,
        ),
        serde_json::Value::Number(_) => {
            let n = value
                .parse::<u64>()
                .map_err(|e| invalid(e.to_string()))?;
            serde_json::Value::Number(n.into())
        }
        _ => serde_json::Value::String(value.to_string()),
    };
    object.insert(leaf.to_string(), new_value);
    Ok(())
}

fn split_leaf(key: &str) -> Option<(Option<&str>, &str)> {
    if key.is_empty() {
        return None;
    }
    match key.rsplit_once('.') {
        Some((parent, leaf)) if !leaf.is_empty() => Some((Some(parent), leaf)),
        Some(_) => None,
        None => Some((None, key)),
    }
}
