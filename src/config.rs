//! Resource limits and execution options for a [`Store`](crate::Store).
//!
//! A `Config` is plain data: build it in code, or load it from a JSON file
//! where every field is optional and unknown fields are rejected.
//!
//! ```
//! let config = tern::Config::from_json(r#"{ "fuel": 1000, "canonicalize_nans": true }"#).unwrap();
//! assert_eq!(config.fuel, Some(1000));
//! assert_eq!(config.max_call_depth, 10_000);
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Nested guest calls allowed before `CallStackExhausted`
    pub max_call_depth: usize,
    /// Operand stack slots allowed before `ValueStackExhausted`
    pub max_value_stack: usize,
    /// Instruction budget for the whole store; `None` runs unmetered
    pub fuel: Option<u64>,
    /// Replace NaN results of float arithmetic with the canonical NaN
    pub canonicalize_nans: bool,
    /// Ceiling on any memory's size in 64 KiB pages
    pub max_memory_pages: u32,
    /// Ceiling on any table's size in elements
    pub max_table_elements: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_call_depth: 10_000,
            max_value_stack: 1 << 20,
            fuel: None,
            canonicalize_nans: false,
            max_memory_pages: 65_536,
            max_table_elements: 10_000_000,
        }
    }
}

impl Config {
    /// Read and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Config::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_call_depth == 0 {
            return Err(ConfigError::Invalid("max_call_depth must be at least 1".to_string()));
        }
        if self.max_value_stack == 0 {
            return Err(ConfigError::Invalid("max_value_stack must be at least 1".to_string()));
        }
        if self.max_memory_pages > 65_536 {
            return Err(ConfigError::Invalid(format!(
                "max_memory_pages {} exceeds 65536",
                self.max_memory_pages
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.max_call_depth, 10_000);
        assert_eq!(config.max_value_stack, 1 << 20);
        assert_eq!(config.fuel, None);
        assert!(!config.canonicalize_nans);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = Config::from_json(r#"{ "max_memory_pages": 16 }"#).unwrap();
        assert_eq!(config.max_memory_pages, 16);
        assert_eq!(config.max_table_elements, 10_000_000);
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(matches!(
            Config::from_json(r#"{ "max_pages": 16 }"#),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            Config::from_json(r#"{ "max_call_depth": 0 }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            Config::from_json(r#"{ "max_memory_pages": 70000 }"#),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("tern-config-{}.json", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(br#"{ "fuel": 5 }"#).unwrap();
        drop(file);

        let config = Config::load(&path).unwrap();
        assert_eq!(config.fuel, Some(5));
        std::fs::remove_file(&path).unwrap();

        assert!(matches!(Config::load(&path), Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_serialize_round_trip() {
        let config = Config {
            fuel: Some(42),
            ..Config::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(Config::from_json(&json).unwrap(), config);
    }
}
