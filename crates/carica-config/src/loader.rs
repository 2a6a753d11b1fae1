//! Layered configuration loading.
//!
//! Sources apply in call order and merge field by field: a file that sets
//! only `[pipeline] debug` keeps every other value from the layers beneath
//! it. Environment overrides apply last, at [`ConfigLoader::load`].

use std::env;
use std::fs;
use std::path::Path;

use carica_telemetry::LogFormat;
use serde_json::Value as Document;

use crate::{CaricaConfig, ConfigError};

/// Builds a [`CaricaConfig`] from defaults, presets, files, strings and the
/// environment.
///
/// ```no_run
/// use carica_config::ConfigLoader;
///
/// # fn main() -> Result<(), carica_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_production()
///     .with_optional_file("carica.toml")?
///     .with_dotenv()?
///     .with_env_prefix("CARICA")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: CaricaConfig,
    env_prefix: Option<String>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Starts from [`CaricaConfig::default`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: CaricaConfig::default(),
            env_prefix: None,
        }
    }

    /// Resets to the built-in defaults.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = CaricaConfig::default();
        self
    }

    /// Resets to [`CaricaConfig::development`].
    ///
    /// ```
    /// use carica_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new().with_development().load().unwrap();
    /// assert!(config.pipeline.debug);
    /// ```
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = CaricaConfig::development();
        self
    }

    /// Resets to [`CaricaConfig::production`].
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = CaricaConfig::production();
        self
    }

    /// Merges a `.toml` or `.json` file, chosen by extension.
    ///
    /// # Errors
    ///
    /// Fails if the file is missing, unreadable, malformed or carries
    /// unknown fields.
    pub fn with_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }
        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_string();
        self.with_string(&content, &format)
    }

    /// Like [`with_file`](Self::with_file), but a missing file is skipped.
    ///
    /// # Errors
    ///
    /// Fails if the file exists but cannot be loaded.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Merges configuration text in `format` (`"toml"` or `"json"`).
    ///
    /// ```
    /// use carica_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string("[pipeline]\nenforce_head = false", "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    /// assert!(!config.pipeline.enforce_head);
    /// assert_eq!(config.pipeline.content_type(), Some("application/json"));
    /// ```
    ///
    /// # Errors
    ///
    /// Fails on an unknown format, malformed text or unknown fields.
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        let overlay: Document = match format.to_ascii_lowercase().as_str() {
            "toml" => toml::from_str(content)?,
            "json" => serde_json::from_str(content)?,
            other => return Err(ConfigError::UnsupportedFormat(other.to_string())),
        };

        let mut merged = serde_json::to_value(&self.config)?;
        merge(&mut merged, overlay);
        self.config = serde_json::from_value(merged)?;
        Ok(self)
    }

    /// Applies `PREFIX__SECTION__KEY` environment variables at load time.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Loads `.env` from the working directory into the process environment.
    ///
    /// # Errors
    ///
    /// Fails if the file exists but cannot be parsed.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => Ok(self),
            Err(e) if e.not_found() => Ok(self),
            Err(e) => Err(ConfigError::Dotenv(e.to_string())),
        }
    }

    /// Applies environment overrides and validates.
    ///
    /// # Errors
    ///
    /// Fails on unparsable or unknown prefixed variables, or invalid values.
    pub fn load(mut self) -> Result<CaricaConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            let marker = format!("{prefix}__");
            let vars: Vec<(String, String)> =
                env::vars().filter(|(k, _)| k.starts_with(&marker)).collect();
            for (key, value) in vars {
                self.apply_env_var(&key, &value, &prefix)?;
            }
        }

        self.config.validate()?;
        Ok(self.config)
    }

    /// Returns the configuration as merged so far, without validating.
    #[must_use]
    pub fn load_unvalidated(self) -> CaricaConfig {
        self.config
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let path = key
            .strip_prefix(prefix)
            .and_then(|k| k.strip_prefix("__"))
            .ok_or_else(|| ConfigError::env_parse_error(key, "invalid key format"))?;
        let parts: Vec<&str> = path.split("__").collect();

        let pipeline = &mut self.config.pipeline;
        let logging = &mut self.config.logging;
        match parts.as_slice() {
            ["PIPELINE", "DEBUG"] => pipeline.debug = bool_var(key, value)?,
            ["PIPELINE", "DEFAULT_CONTENT_TYPE"] => {
                pipeline.default_content_type = optional(value);
            }
            ["PIPELINE", "DEFAULT_ACCEPT"] => pipeline.default_accept = optional(value),
            ["PIPELINE", "ENFORCE_HEAD"] => pipeline.enforce_head = bool_var(key, value)?,

            ["LOGGING", "ENABLED"] => logging.enabled = bool_var(key, value)?,
            ["LOGGING", "LEVEL"] => logging.level = value.to_string(),
            ["LOGGING", "FORMAT"] => {
                logging.format = value
                    .parse::<LogFormat>()
                    .map_err(|e| ConfigError::env_parse_error(key, e.to_string()))?;
            }
            ["LOGGING", "INCLUDE_LOCATION"] => logging.include_location = bool_var(key, value)?,
            ["LOGGING", "THREAD_IDS"] => logging.thread_ids = bool_var(key, value)?,
            ["LOGGING", "SERVICE_NAME"] => logging.service_name = value.to_string(),

            [section, field @ ..] => {
                return Err(ConfigError::unknown_field(
                    field.join("__").to_lowercase(),
                    section.to_lowercase(),
                ))
            }
            [] => return Err(ConfigError::env_parse_error(key, "invalid key format")),
        }
        Ok(())
    }
}

/// Overlays `overlay` onto `base`; tables merge, everything else replaces.
fn merge(base: &mut Document, overlay: Document) {
    match (base, overlay) {
        (Document::Object(base), Document::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

fn bool_var(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::env_parse_error(key, "expected boolean")),
    }
}

/// Empty means "no default".
fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}
