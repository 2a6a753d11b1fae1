//! # Carica
//!
//! An HTTP middleware pipeline that resolves requests into type-checked
//! action calls.
//!
//! Routes map to actions; actions declare their parameters. Between the two,
//! a fixed sequence of stages routes the request, answers 404/405, resolves
//! the action's metadata, merges query parameters, coerces every argument to
//! its declared type, decodes the body and finally calls the action. Invalid
//! input becomes a 400 and any failure a 500.
//!
//! ## Quick Start
//!
//! ```rust
//! use carica::prelude::*;
//! use std::sync::Arc;
//!
//! let add = ActionRef::from_fn(
//!     "add",
//!     ActionDeclaration::new()
//!         .parameter(ParameterDeclaration::new("a", DeclaredType::int()))
//!         .parameter(ParameterDeclaration::new("b", DeclaredType::int())),
//!     |arguments| {
//!         let sum = arguments.get_int("a")? + arguments.get_int("b")?;
//!         Ok(ActionOutput::from(Value::from(sum)))
//!     },
//! );
//!
//! let mut routes = RouteTable::new();
//! routes.get("/add/{a}", add).unwrap();
//!
//! let app = StandardApplication::builder(Arc::new(routes)).build();
//! let response = app.respond(Request::new(
//!     http::Method::GET,
//!     http::Uri::from_static("/add/2?b=3"),
//! ));
//! assert_eq!(response.body().as_ref(), b"5");
//! ```
//!
//! ## Pipeline
//!
//! ```text
//! Request → Catcher → Defaults → Head → Router → 404 → 405 → Metadata
//!         → Query → Coercion → Body → Per-action → ActionDispatcher
//! ```
//!
//! ## Configuration and logging
//!
//! ```rust,no_run
//! use carica::config::ConfigLoader;
//! use carica::prelude::*;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConfigLoader::new()
//!     .with_optional_file("carica.toml")?
//!     .with_env_prefix("CARICA")
//!     .load()?;
//! carica::telemetry::init_logging(&config.logging.to_log_config())?;
//!
//! let app = StandardApplication::from_config(Arc::new(RouteTable::new()), &config).build();
//! # Ok(())
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/carica/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod application;

pub use application::{StandardApplication, StandardApplicationBuilder};

// Re-export core types
pub use carica_core as core;

// Re-export the middleware kernel and stages
pub use carica_middleware as middleware;

// Re-export the router
pub use carica_router as router;

// Re-export configuration
pub use carica_config as config;

// Re-export logging setup
pub use carica_telemetry as telemetry;

/// Common imports.
///
/// ```rust
/// use carica::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{StandardApplication, StandardApplicationBuilder};

    pub use carica_core::{
        ActionDeclaration, ActionOutput, ActionRef, CallArguments, CaricaError, CaricaResult,
        DeclaredType, ParameterDeclaration, Request, Response, ResponseBuilder, TypeCatalog,
        Typed, UploadedFile, Value,
    };

    pub use carica_middleware::{
        BoxedMiddleware, FnMiddleware, Handler, LocatorMiddlewareFactory, Middleware,
    };

    pub use carica_router::{DelegatingRouter, RouteDefinition, RouteTable};

    pub use carica_config::{CaricaConfig, PipelineConfig};
}
