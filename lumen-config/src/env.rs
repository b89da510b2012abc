// Environment variable loading

use crate::{ConfigError, Result};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::env;

/// Default prefix for image rule variables, e.g. `LUMEN_IMAGE_MIN_WIDTH`.
pub const DEFAULT_PREFIX: &str = "LUMEN_IMAGE";

/// Separator for nested keys: `LUMEN_IMAGE_MESSAGES__MIN_WIDTH` sets
/// `messages.min_width`.
pub const NESTING_SEPARATOR: &str = "__";

/// Environment variable loader
pub struct EnvLoader {
    prefix: Option<String>,
}

impl EnvLoader {
    /// Create a new environment loader
    pub fn new(prefix: Option<String>) -> Self {
        Self { prefix }
    }

    /// Loader for the default image rule prefix
    pub fn image() -> Self {
        Self::new(Some(DEFAULT_PREFIX.to_string()))
    }

    /// Load all matching environment variables with the prefix stripped and
    /// keys lowercased
    pub fn load(&self) -> Result<HashMap<String, String>> {
        Ok(self.strip(env::vars()))
    }

    fn strip(&self, vars: impl IntoIterator<Item = (String, String)>) -> HashMap<String, String> {
        let mut config = HashMap::new();

        for (key, value) in vars {
            match &self.prefix {
                Some(prefix) => {
                    let Some(rest) = key.strip_prefix(prefix.as_str()) else {
                        continue;
                    };
                    // LUMEN_IMAGEX must not match LUMEN_IMAGE
                    let Some(rest) = rest.strip_prefix('_') else {
                        continue;
                    };
                    if !rest.is_empty() {
                        config.insert(rest.to_lowercase(), value);
                    }
                }
                None => {
                    config.insert(key.to_lowercase(), value);
                }
            }
        }

        config
    }

    /// Load matching variables as a typed tree: values are coerced with
    /// [`coerce`] and `__` in a key opens a nested object.
    pub fn load_values(&self) -> Result<Map<String, Value>> {
        Ok(nest(self.load()?))
    }

    /// Load a specific environment variable
    pub fn load_var(&self, key: &str) -> Result<String> {
        let full_key = if let Some(ref prefix) = self.prefix {
            format!("{}_{}", prefix, key.to_uppercase())
        } else {
            key.to_uppercase()
        };

        env::var(&full_key).map_err(ConfigError::EnvError)
    }

    /// Load with default value
    pub fn load_var_or(&self, key: &str, default: &str) -> String {
        self.load_var(key).unwrap_or_else(|_| default.to_string())
    }
}

impl Default for EnvLoader {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Give a raw string value the most specific JSON type it parses as.
///
/// `true`/`false` become booleans, integers and decimals become numbers,
/// text starting with `[` or `{` is tried as JSON. Anything else stays a
/// string.
pub fn coerce(raw: &str) -> Value {
    let trimmed = raw.trim();

    match trimmed.to_ascii_lowercase().as_str() {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }

    if let Ok(n) = trimmed.parse::<i64>() {
        return Value::from(n);
    }
    if let Ok(n) = trimmed.parse::<f64>()
        && n.is_finite()
    {
        return Value::from(n);
    }
    if (trimmed.starts_with('[') || trimmed.starts_with('{'))
        && let Ok(json) = serde_json::from_str(trimmed)
    {
        return json;
    }

    Value::String(raw.to_string())
}

fn nest(flat: HashMap<String, String>) -> Map<String, Value> {
    let mut root = Map::new();

    for (key, raw) in flat {
        let mut parts = key.split(NESTING_SEPARATOR).peekable();
        let mut node = &mut root;

        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                node.insert(part.to_string(), coerce(&raw));
                break;
            }

            let child = node
                .entry(part.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !child.is_object() {
                *child = Value::Object(Map::new());
            }
            let Value::Object(map) = child else {
                break;
            };
            node = map;
        }
    }

    root
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_env_loader_with_default() {
        let loader = EnvLoader::new(None);
        let value = loader.load_var_or("NONEXISTENT_VAR_12345", "default");

        assert_eq!(value, "default");
    }

    #[test]
    fn test_env_loader_missing_var() {
        let loader = EnvLoader::image();
        let result = loader.load_var("MISSING_VAR_67890");

        assert!(result.is_err());
    }

    #[test]
    fn test_prefix_is_stripped() {
        let loader = EnvLoader::image();
        let config = loader.strip(vars(&[
            ("LUMEN_IMAGE_MIN_WIDTH", "100"),
            ("LUMEN_IMAGEX_MAX_WIDTH", "5"),
            ("LUMEN_IMAGE_", "ignored"),
            ("HOME", "/root"),
        ]));

        assert_eq!(config.len(), 1);
        assert_eq!(config.get("min_width"), Some(&"100".to_string()));
    }

    #[test]
    fn test_coerce() {
        assert_eq!(coerce("TRUE"), Value::Bool(true));
        assert_eq!(coerce("false"), Value::Bool(false));
        assert_eq!(coerce("120"), Value::from(120));
        assert_eq!(coerce("1.5"), Value::from(1.5));
        assert_eq!(coerce(r#"["image/png", "image/gif"]"#)[1], "image/gif");
        assert_eq!(coerce("[not json"), Value::String("[not json".into()));
        assert_eq!(coerce("wide"), Value::String("wide".into()));
        assert_eq!(coerce("inf"), Value::String("inf".into()));
    }

    #[test]
    fn test_nested_keys() {
        let loader = EnvLoader::image();
        let tree = nest(loader.strip(vars(&[
            ("LUMEN_IMAGE_ALLOW_SQUARE", "false"),
            ("LUMEN_IMAGE_MESSAGES__MIN_WIDTH", "Too narrow"),
            ("LUMEN_IMAGE_FILE__MAX_SIZE", "2048"),
        ])));

        assert_eq!(tree["allow_square"], false);
        assert_eq!(tree["messages"]["min_width"], "Too narrow");
        assert_eq!(tree["file"]["max_size"], 2048);
    }
}
