//! Configuration loading for Lumen
//!
//! Rule sets are plain data: [`ConfigManager`] collects values from JSON,
//! TOML and `.env` files and from prefixed environment variables, then
//! deserializes a named section into any `serde` type.
//!
//! ```
//! use lumen_config::{ConfigLoader, ConfigManager, FileFormat};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize, Default)]
//! #[serde(default)]
//! struct Limits {
//!     min_width: u32,
//!     allow_square: bool,
//! }
//!
//! let mut manager = ConfigManager::new();
//! let value = ConfigLoader::new(FileFormat::Toml)
//!     .parse("[image]\nmin_width = 320\n")
//!     .unwrap();
//! manager.merge_value(value);
//!
//! let limits: Limits = manager.section("image").unwrap();
//! assert_eq!(limits.min_width, 320);
//! assert!(!limits.allow_square);
//! ```

pub mod env;
pub mod error;
pub mod loader;

pub use env::{EnvLoader, coerce};
pub use error::{ConfigError, Result};
pub use loader::{ConfigLoader, FileFormat};

use lumen_log::debug;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::path::Path;

/// Accumulated configuration.
///
/// Later sources override earlier ones key by key; nested objects are merged
/// rather than replaced.
#[derive(Debug, Clone, Default)]
pub struct ConfigManager {
    config: Map<String, Value>,
    env_prefix: Option<String>,
}

impl ConfigManager {
    /// Create a new configuration manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with environment variable prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            config: Map::new(),
            env_prefix: Some(prefix.into()),
        }
    }

    /// Load configuration from environment variables into the top level
    pub fn load_env(&mut self) -> Result<()> {
        let loader = EnvLoader::new(self.env_prefix.clone());
        let values = loader.load_values()?;
        debug!(
            target: "lumen::config",
            fields: { count = values.len() },
            "Loaded environment variables"
        );
        self.merge_value(Value::Object(values));
        Ok(())
    }

    /// Load variables starting with `prefix` into `section`.
    ///
    /// `load_env_section("image", "LUMEN_IMAGE")` maps `LUMEN_IMAGE_MIN_WIDTH`
    /// to `image.min_width`.
    pub fn load_env_section(&mut self, section: &str, prefix: &str) -> Result<()> {
        let values = EnvLoader::new(Some(prefix.to_string())).load_values()?;
        if values.is_empty() {
            return Ok(());
        }

        debug!(
            target: "lumen::config",
            fields: { section = section, count = values.len() },
            "Loaded environment section"
        );
        let mut wrapper = Map::new();
        wrapper.insert(section.to_string(), Value::Object(values));
        self.merge_value(Value::Object(wrapper));
        Ok(())
    }

    /// Load a `.env` file into the process environment, then read the
    /// variables matching this manager's prefix
    pub fn load_dotenv(&mut self, path: Option<&Path>) -> Result<()> {
        if let Some(path) = path {
            dotenvy::from_path(path).map_err(|e| ConfigError::LoadError(e.to_string()))?;
        } else {
            dotenvy::dotenv().ok(); // Ignore if .env doesn't exist
        }
        self.load_env()
    }

    /// Load configuration from file
    pub fn load_file(&mut self, path: impl AsRef<Path>, format: FileFormat) -> Result<()> {
        let path = path.as_ref();
        let data = ConfigLoader::new(format).load_file(path)?;

        if !data.is_object() {
            return Err(ConfigError::ParseError(format!(
                "{} does not contain a table at the top level",
                path.display()
            )));
        }

        debug!(
            target: "lumen::config",
            fields: { path = path.display(), format = format!("{:?}", format) },
            "Loaded configuration file"
        );
        self.merge_value(data);
        Ok(())
    }

    /// Load a file, detecting the format from its name
    pub fn load_auto(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let format = ConfigLoader::auto(path)?.format();
        self.load_file(path, format)
    }

    /// Merge an object into the configuration. Non-object values are ignored.
    pub fn merge_value(&mut self, value: Value) {
        if let Value::Object(map) = value {
            merge_maps(&mut self.config, map);
        }
    }

    /// Set a configuration value
    pub fn set<T: serde::Serialize>(&mut self, key: &str, value: T) -> Result<()> {
        let json_value = serde_json::to_value(value)
            .map_err(|e| ConfigError::SerializationError(e.to_string()))?;

        self.config.insert(key.to_string(), json_value);
        Ok(())
    }

    /// Get a configuration value
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        let value = self
            .config
            .get(key)
            .ok_or_else(|| ConfigError::KeyNotFound(key.to_string()))?;

        serde_json::from_value(value.clone()).map_err(|e| ConfigError::SectionError {
            section: key.to_string(),
            message: e.to_string(),
        })
    }

    /// Get a configuration value with default
    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    /// Deserialize a section; a missing section deserializes from an empty
    /// table, so types with `#[serde(default)]` get their defaults.
    pub fn section<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let value = self
            .config
            .get(name)
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()));

        serde_json::from_value(value).map_err(|e| ConfigError::SectionError {
            section: name.to_string(),
            message: e.to_string(),
        })
    }

    /// Check if a key exists
    pub fn has(&self, key: &str) -> bool {
        self.config.contains_key(key)
    }

    /// Get all configuration keys
    pub fn keys(&self) -> Vec<String> {
        self.config.keys().cloned().collect()
    }

    /// Merge configuration from another manager
    pub fn merge(&mut self, other: &ConfigManager) {
        merge_maps(&mut self.config, other.config.clone());
    }
}

fn merge_maps(target: &mut Map<String, Value>, source: Map<String, Value>) {
    for (key, value) in source {
        let Value::Object(incoming) = value else {
            target.insert(key, value);
            continue;
        };

        if let Some(Value::Object(existing)) = target.get_mut(&key) {
            merge_maps(existing, incoming);
            continue;
        }
        target.insert(key, Value::Object(incoming));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Default, PartialEq)]
    #[serde(default)]
    struct Rules {
        min_width: Option<u32>,
        max_ratio: Option<f64>,
        messages: Messages,
    }

    #[derive(Debug, Deserialize, Default, PartialEq)]
    #[serde(default)]
    struct Messages {
        min_width: Option<String>,
        corrupted: Option<String>,
    }

    #[test]
    fn test_set_and_get() {
        let mut manager = ConfigManager::new();
        manager.set("test_key", "test_value").unwrap();

        let value: String = manager.get("test_key").unwrap();
        assert_eq!(value, "test_value");
    }

    #[test]
    fn test_get_or_default() {
        let manager = ConfigManager::new();

        let value: String = manager.get_or("missing_key", "default_value".to_string());
        assert_eq!(value, "default_value");
    }

    #[test]
    fn test_has_key() {
        let mut manager = ConfigManager::new();
        manager.set("existing_key", "value").unwrap();

        assert!(manager.has("existing_key"));
        assert!(!manager.has("missing_key"));
    }

    #[test]
    fn test_missing_section_uses_defaults() {
        let manager = ConfigManager::new();
        let rules: Rules = manager.section("image").unwrap();
        assert_eq!(rules, Rules::default());
    }

    #[test]
    fn test_nested_merge() {
        let mut manager = ConfigManager::new();
        manager.merge_value(serde_json::json!({
            "image": { "min_width": 10, "messages": { "min_width": "a", "corrupted": "b" } }
        }));
        manager.merge_value(serde_json::json!({
            "image": { "max_ratio": 1.5, "messages": { "min_width": "c" } }
        }));

        let rules: Rules = manager.section("image").unwrap();
        assert_eq!(rules.min_width, Some(10));
        assert_eq!(rules.max_ratio, Some(1.5));
        assert_eq!(rules.messages.min_width.as_deref(), Some("c"));
        assert_eq!(rules.messages.corrupted.as_deref(), Some("b"));
    }

    #[test]
    fn test_section_type_error() {
        let mut manager = ConfigManager::new();
        manager.set("image", serde_json::json!({ "min_width": "wide" })).unwrap();

        let err = manager.section::<Rules>("image").unwrap_err();
        assert!(matches!(err, ConfigError::SectionError { ref section, .. } if section == "image"));
    }
}
