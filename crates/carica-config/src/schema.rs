//! Configuration sections.

use carica_telemetry::{LogConfig, LogFormat};
use serde::{Deserialize, Serialize};

/// Settings for the standard pipeline stages.
///
/// An empty media type disables the corresponding default header.
///
/// ```
/// use carica_config::PipelineConfig;
///
/// let config = PipelineConfig::default();
/// assert_eq!(config.content_type(), Some("application/json"));
/// assert!(config.enforce_head);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Put failure details into 500 bodies. Local development only.
    pub debug: bool,

    /// `content-type` assumed when a request carries none.
    pub default_content_type: Option<String>,

    /// `accept` assumed when a request carries none.
    pub default_accept: Option<String>,

    /// Strip bodies from responses to HEAD requests.
    pub enforce_head: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            debug: false,
            default_content_type: Some(default_media_type()),
            default_accept: Some(default_media_type()),
            enforce_head: true,
        }
    }
}

impl PipelineConfig {
    /// The default `content-type`, if one is configured.
    pub fn content_type(&self) -> Option<&str> {
        non_empty(self.default_content_type.as_deref())
    }

    /// The default `accept`, if one is configured.
    pub fn accept(&self) -> Option<&str> {
        non_empty(self.default_accept.as_deref())
    }
}

fn default_media_type() -> String {
    "application/json".to_string()
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Logging settings, mapped onto [`LogConfig`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Install a subscriber at startup.
    pub enabled: bool,

    /// Filter directive, e.g. `"info"` or `"warn,carica_middleware=debug"`.
    pub level: String,

    /// Output encoding.
    pub format: LogFormat,

    /// Include source file and line in events.
    pub include_location: bool,

    /// Include thread ids in events.
    pub thread_ids: bool,

    /// Service name recorded on request spans.
    pub service_name: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        let base = LogConfig::default();
        Self {
            enabled: base.enabled,
            level: base.filter,
            format: base.format,
            include_location: base.file_line_info,
            thread_ids: base.thread_ids,
            service_name: base.service_name,
        }
    }
}

impl LoggingConfig {
    /// Builds the telemetry settings for this section.
    pub fn to_log_config(&self) -> LogConfig {
        LogConfig {
            enabled: self.enabled,
            filter: self.level.clone(),
            format: self.format,
            span_events: self.format == LogFormat::Pretty,
            file_line_info: self.include_location,
            thread_ids: self.thread_ids,
            service_name: self.service_name.clone(),
            ..LogConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_defaults() {
        let config = PipelineConfig::default();
        assert!(!config.debug);
        assert!(config.enforce_head);
        assert_eq!(config.accept(), Some("application/json"));
    }

    #[test]
    fn test_empty_media_type_disables_default() {
        let config = PipelineConfig {
            default_content_type: Some("  ".to_string()),
            default_accept: None,
            ..PipelineConfig::default()
        };
        assert_eq!(config.content_type(), None);
        assert_eq!(config.accept(), None);
    }

    #[test]
    fn test_partial_section_keeps_defaults() {
        let config: PipelineConfig = toml::from_str("debug = true").unwrap();
        assert!(config.debug);
        assert!(config.enforce_head);
        assert_eq!(config.content_type(), Some("application/json"));
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let result: Result<PipelineConfig, _> = toml::from_str("strict = true");
        assert!(result.is_err());
    }

    #[test]
    fn test_logging_maps_to_log_config() {
        let section = LoggingConfig {
            level: "warn".to_string(),
            format: LogFormat::Pretty,
            include_location: true,
            service_name: "orders".to_string(),
            ..LoggingConfig::default()
        };
        let log = section.to_log_config();
        assert_eq!(log.filter, "warn");
        assert_eq!(log.format, LogFormat::Pretty);
        assert!(log.span_events);
        assert!(log.file_line_info);
        assert_eq!(log.service_name, "orders");
    }
}
