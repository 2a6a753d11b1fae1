//! # Carica Telemetry
//!
//! Logging setup for Carica applications.
//!
//! The pipeline crates only emit events through [`tracing`]; this crate
//! installs the subscriber that turns them into output. Output is JSON for
//! log shippers or pretty/compact text for terminals, filtered with the usual
//! `EnvFilter` directive syntax.
//!
//! ```rust,ignore
//! use carica_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development())?;
//! tracing::debug!(action = "showUser", "Dispatching action");
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, fields, init_logging, request_span, LogConfig, LogFormat};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
