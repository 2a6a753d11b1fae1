//! Typed configuration for Carica pipelines.
//!
//! [`CaricaConfig`] holds two sections:
//!
//! - [`PipelineConfig`] - debug mode, default media types, HEAD handling
//! - [`LoggingConfig`] - filter, format and fields of log output
//!
//! [`ConfigLoader`] layers built-in defaults, an optional preset, TOML or
//! JSON sources and `PREFIX__SECTION__KEY` environment variables, then
//! validates the result. Unknown fields are errors at every layer.
//!
//! # Configuration File Format
//!
//! ```toml
//! [pipeline]
//! debug = false
//! default_content_type = "application/json"
//! default_accept = "application/json"
//! enforce_head = true
//!
//! [logging]
//! enabled = true
//! level = "info,carica_middleware=debug"
//! format = "json"
//! service_name = "orders"
//! ```
//!
//! # Environment Variable Overrides
//!
//! - `CARICA__PIPELINE__DEBUG=true`
//! - `CARICA__PIPELINE__DEFAULT_ACCEPT=` (empty disables the default)
//! - `CARICA__LOGGING__FORMAT=pretty`

#![warn(missing_docs)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::CaricaConfig;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{LoggingConfig, PipelineConfig};
