//! TOML-based application configuration.
//!
//! Static preferences that the user rarely edits by hand:
//! - Timer constants (stop threshold, duration presets, defaults)
//! - The category list offered for selection
//! - Report palette and heatmap window
//!
//! Configuration is stored at `<data_dir>/config.toml`. User-adjusted values
//! (durations, theme, last category) live in the key-value store instead;
//! see [`crate::settings`].

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;
use crate::error::ConfigError;

/// Timer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerConfig {
    /// Manual stops with less elapsed time are discarded without asking.
    #[serde(default = "default_min_significant_secs")]
    pub min_significant_secs: u64,
    #[serde(default = "default_duration_presets")]
    pub duration_presets: Vec<u32>,
    #[serde(default = "default_work_minutes")]
    pub default_work_minutes: u32,
    #[serde(default = "default_break_minutes")]
    pub default_break_minutes: u32,
}

/// Upper bound for `report.heatmap_days` (about ten years).
pub const MAX_HEATMAP_DAYS: u32 = 3660;

/// Report configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Category colors, assigned in first-seen order and cycled.
    #[serde(default = "default_palette")]
    pub palette: Vec<String>,
    #[serde(default = "default_heatmap_days")]
    pub heatmap_days: u32,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data_dir>/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,
}

// Default functions
fn default_min_significant_secs() -> u64 {
    60
}
fn default_duration_presets() -> Vec<u32> {
    vec![15, 25, 45, 60]
}
fn default_work_minutes() -> u32 {
    25
}
fn default_break_minutes() -> u32 {
    5
}
fn default_palette() -> Vec<String> {
    ["#F87171", "#FBBF24", "#34D399", "#60A5FA", "#A78BFA", "#F472B6"]
        .into_iter()
        .map(String::from)
        .collect()
}
fn default_heatmap_days() -> u32 {
    95
}
fn default_categories() -> Vec<String> {
    ["Studying", "Coding", "Reading", "Project", "Other"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            min_significant_secs: default_min_significant_secs(),
            duration_presets: default_duration_presets(),
            default_work_minutes: default_work_minutes(),
            default_break_minutes: default_break_minutes(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            palette: default_palette(),
            heatmap_days: default_heatmap_days(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timer: TimerConfig::default(),
            report: ReportConfig::default(),
            categories: default_categories(),
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
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().map_or(true, |p| p.is_empty()) {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        let n = value
                            .parse::<u64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?;
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
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("config.toml"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from disk, writing the defaults if no file exists yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => Self::from_toml(&content),
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let cfg: Self =
            toml::from_str(content).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Range checks serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let days = self.report.heatmap_days;
        if !(1..=MAX_HEATMAP_DAYS).contains(&days) {
            return Err(ConfigError::InvalidValue {
                key: "report.heatmap_days".to_string(),
                message: format!("{days} is outside 1..={MAX_HEATMAP_DAYS}"),
            });
        }
        Ok(())
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path()?;
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.clone(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(&path, content).map_err(|e| save_failed(e.to_string()))?;
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

    /// Set a config value by key without saving.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not fit.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Set a config value by key and save.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.apply(key, value)?;
        self.save()
    }

    /// Category used before the user has picked one.
    pub fn default_category(&self) -> &str {
        self.categories
            .first()
            .map(String::as_str)
            .unwrap_or(crate::timer::FALLBACK_CATEGORY)
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "using default configuration");
            Self::default()
        })
    }
}
