//! Telemetry error types.

use thiserror::Error;

/// Errors raised while setting up logging.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The filter directive could not be parsed.
    #[error("Invalid log filter `{filter}`: {reason}")]
    InvalidFilter {
        /// The rejected directive.
        filter: String,
        /// Parser diagnostic.
        reason: String,
    },

    /// The log format name is not known.
    #[error("Unknown log format `{0}` (expected json, pretty or compact)")]
    UnknownFormat(String),

    /// A global subscriber could not be installed.
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TelemetryError::InvalidFilter {
            filter: "carica=loud".to_string(),
            reason: "invalid level".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid log filter `carica=loud`: invalid level"
        );

        let err = TelemetryError::UnknownFormat("xml".to_string());
        assert!(err.to_string().contains("xml"));
    }
}
