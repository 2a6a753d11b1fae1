//! The root configuration type.

use serde::{Deserialize, Serialize};

use crate::{ConfigError, LoggingConfig, PipelineConfig};
use carica_telemetry::LogFormat;

/// Complete Carica configuration.
///
/// Load it with [`ConfigLoader`](crate::ConfigLoader).
///
/// ```
/// use carica_config::CaricaConfig;
///
/// let config = CaricaConfig::default();
/// assert!(!config.pipeline.debug);
/// assert_eq!(config.logging.level, "info");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct CaricaConfig {
    /// Pipeline stage settings.
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl CaricaConfig {
    /// Checks values the schema alone cannot.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("pipeline.default_content_type", self.pipeline.content_type()),
            ("pipeline.default_accept", self.pipeline.accept()),
        ] {
            if let Some(media_type) = value {
                if !is_media_type(media_type) {
                    return Err(ConfigError::invalid_value(
                        field,
                        format!("`{media_type}` is not a media type"),
                    ));
                }
            }
        }

        carica_telemetry::create_env_filter(&self.logging.level)
            .map_err(|e| ConfigError::invalid_value("logging.level", e.to_string()))?;

        if self.logging.service_name.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "logging.service_name",
                "must not be empty",
            ));
        }

        Ok(())
    }

    /// Local development: failure details in 500 bodies, verbose pretty logs.
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.pipeline.debug = true;
        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config.logging.include_location = true;
        config
    }

    /// Production: opaque 500s, JSON logs at `info`.
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();
        config.pipeline.debug = false;
        config.logging.level = "info".to_string();
        config.logging.format = LogFormat::Json;
        config
    }
}

/// `type/subtype` with optional parameters, all visible ASCII.
fn is_media_type(value: &str) -> bool {
    let essence = value.split(';').next().unwrap_or_default().trim();
    let valid_chars = value.bytes().all(|b| b == b'\t' || (0x20..0x7f).contains(&b));
    match essence.split_once('/') {
        Some((kind, subtype)) => {
            valid_chars && !kind.is_empty() && !subtype.is_empty() && !subtype.contains('/')
        }
        None => false,
    }
}
