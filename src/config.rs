//! Service configuration, read from the environment (after `.env`).
//!
//! | Variable              | Default    |
//! |-----------------------|------------|
//! | `PORT`                | `8083`     |
//! | `PRODUCT_SERVICE_URL` | unset      |
//! | `DEFAULT_LOCALE`      | `zh`       |
//! | `MAX_UPLOAD_BYTES`    | `10485760` |
//! | `FIELD_MAPPING_PATH`  | unset      |

use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;
use validator::Validate;

use crate::domain::value_objects::UnknownTypeError;
use crate::mapping::MappingConfig;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {name}: `{value}`")]
    InvalidVar { name: &'static str, value: String },

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] validator::ValidationErrors),

    #[error("Cannot read mapping file {path}: {source}")]
    ReadMapping { path: String, source: std::io::Error },

    #[error("Invalid mapping JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid attribute pattern: {0}")]
    Regex(#[from] regex::Error),

    #[error("Invalid mapping: {0}")]
    InvalidMapping(String),

    #[error("Invalid mapping: {0}")]
    UnknownType(#[from] UnknownTypeError),

    #[error("Mapping must define the `zh` locale")]
    MissingFallbackLocale,
}

#[derive(Debug, Clone, Validate)]
pub struct Config {
    #[validate(range(min = 1))]
    pub port: u16,
    #[validate(url)]
    pub product_service_url: Option<String>,
    #[validate(length(min = 1, max = 35))]
    pub default_locale: String,
    #[validate(range(min = 1))]
    pub max_upload_bytes: u32,
    pub field_mapping_path: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any variable source; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let config = Self {
            port: parse_var("PORT", get("PORT"), 8083)?,
            product_service_url: get("PRODUCT_SERVICE_URL"),
            default_locale: get("DEFAULT_LOCALE").unwrap_or_else(|| "zh".to_string()),
            max_upload_bytes: parse_var("MAX_UPLOAD_BYTES", get("MAX_UPLOAD_BYTES"), 10 * 1024 * 1024)?,
            field_mapping_path: get("FIELD_MAPPING_PATH").map(PathBuf::from),
        };
        config.validate()?;
        Ok(config)
    }

    /// The mapping file when configured, the built-in tables otherwise.
    pub fn load_mapping(&self) -> Result<MappingConfig, ConfigError> {
        match &self.field_mapping_path {
            Some(path) => MappingConfig::from_file(path),
            None => MappingConfig::builtin(),
        }
    }
}

fn parse_var<T: FromStr>(name: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        Some(value) => value.parse().map_err(|_| ConfigError::InvalidVar { name, value }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.port, 8083);
        assert_eq!(config.default_locale, "zh");
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
        assert!(config.product_service_url.is_none());
        assert!(config.load_mapping().is_ok());
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("PORT", "9000"),
            ("PRODUCT_SERVICE_URL", "http://products.internal:8080"),
            ("DEFAULT_LOCALE", "en"),
            ("MAX_UPLOAD_BYTES", "1024"),
        ])).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.product_service_url.as_deref(), Some("http://products.internal:8080"));
        assert_eq!(config.default_locale, "en");
        assert_eq!(config.max_upload_bytes, 1024);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(Config::from_lookup(lookup(&[("PORT", "eighty")])), Err(ConfigError::InvalidVar { name: "PORT", .. })));
        assert!(matches!(Config::from_lookup(lookup(&[("PRODUCT_SERVICE_URL", "products")])), Err(ConfigError::Invalid(_))));
        assert!(matches!(Config::from_lookup(lookup(&[("MAX_UPLOAD_BYTES", "0")])), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_missing_mapping_file() {
        let config = Config::from_lookup(lookup(&[("FIELD_MAPPING_PATH", "/nonexistent/mapping.json")])).unwrap();
        assert!(matches!(config.load_mapping(), Err(ConfigError::ReadMapping { .. })));
    }
}
