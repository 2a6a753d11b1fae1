//! # Carica Middleware
//!
//! The request pipeline that turns an HTTP request into a type-checked
//! action call.
//!
//! A [`StackKernel`] runs an ordered list of [`Middleware`] stages around a
//! terminal [`Handler`], normally the [`ActionDispatcher`]. Each stage reads
//! and enriches the request (chiefly its route outcome) or answers on its
//! own.
//!
//! ## Pipeline Stages
//!
//! ```text
//! Request → Catcher → Defaults → Head → Router → 404 → 405 → Metadata
//!         → Query → Coercion → Body → Per-action → ActionDispatcher
//! ```
//!
//! | Stage | Middleware                          | Purpose                                  |
//! |-------|-------------------------------------|------------------------------------------|
//! | 1     | [`ExceptionCatcherMiddleware`]      | Convert uncaught failures into 500       |
//! | 2     | [`DefaultContentTypeMiddleware`]    | Fill missing `content-type` / `accept`   |
//! | 3     | [`EnforceHeadMiddleware`]           | Strip bodies from HEAD responses         |
//! | 4     | [`RouterMiddleware`]                | Attach the route outcome                 |
//! | 5     | [`NotFoundMiddleware`]              | 404 for unmatched paths                  |
//! | 6     | [`MethodNotAllowedMiddleware`]      | 405 (or 204 for OPTIONS)                 |
//! | 7     | [`DeriveMetadataMiddleware`]        | Resolve action metadata                  |
//! | 8     | [`QueryParametersMiddleware`]       | Merge query parameters into arguments    |
//! | 9     | [`NormalizeArgumentsMiddleware`]    | Coerce arguments to declared types       |
//! | 10    | [`ParsedBodyMiddleware`]            | Decode the body into the declared type   |
//! | 11    | [`AdditionalMiddlewareMiddleware`]  | Run middleware named by the action       |
//!
//! The order is a recommendation; every stage is an ordinary middleware and
//! can be composed freely. Stages that need state from an earlier stage fail
//! with a [`ConfigurationFault`](carica_core::ConfigurationFault) when it is
//! missing.
//!
//! ## Example
//!
//! ```
//! use carica_core::{
//!     ActionDeclaration, ActionOutput, ActionRef, DeclaredType, ParameterDeclaration, Request,
//!     TypeCatalog, Value,
//! };
//! use carica_middleware::{
//!     ActionDispatcher, BoxedMiddleware, DeriveMetadataMiddleware, Handler, JsonResultRenderer,
//!     MetadataResolver, NotFoundMiddleware, QueryParametersMiddleware, RouterMiddleware,
//!     StackKernel,
//! };
//! use carica_router::{RouteDefinition, RouteTable};
//! use http::{Method, StatusCode, Uri};
//! use std::sync::Arc;
//!
//! let greet = ActionRef::from_fn(
//!     "greet",
//!     ActionDeclaration::new()
//!         .parameter(ParameterDeclaration::new("name", DeclaredType::string())),
//!     |arguments| {
//!         let greeting = format!("hello {}", arguments.get_str("name")?);
//!         Ok(ActionOutput::from(Value::from(greeting)))
//!     },
//! );
//! let mut routes = RouteTable::new();
//! routes.get("/greet/{name}", RouteDefinition::new(greet)).unwrap();
//!
//! let resolver = MetadataResolver::with_defaults(Arc::new(TypeCatalog::new()));
//! let stages: Vec<BoxedMiddleware> = vec![
//!     Arc::new(RouterMiddleware::new(Arc::new(routes))),
//!     Arc::new(NotFoundMiddleware::new()),
//!     Arc::new(DeriveMetadataMiddleware::new(Arc::new(resolver))),
//!     Arc::new(QueryParametersMiddleware::new()),
//! ];
//! let dispatcher = ActionDispatcher::new().with_renderer(Arc::new(JsonResultRenderer::new()));
//! let kernel = StackKernel::new(dispatcher, stages);
//!
//! let response = kernel
//!     .handle(Request::new(Method::GET, Uri::from_static("/greet/ada")))
//!     .unwrap();
//! assert_eq!(response.status(), StatusCode::OK);
//! assert_eq!(response.body().as_ref(), br#""hello ada""#);
//! ```

#![doc(html_root_url = "https://docs.rs/carica-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod body;
pub mod dispatcher;
pub mod factory;
pub mod kernel;
pub mod loader;
pub mod metadata;
pub mod middleware;
pub mod render;
pub mod stages;

// Re-export main types at crate root
pub use body::{
    BodyInput, BodyParser, BodyParserError, BodyParsers, ParseOutcome, SerdeBodyParser,
    GENERIC_MAP_CONTENT_TYPE,
};
pub use dispatcher::ActionDispatcher;
pub use factory::{LocatorMiddlewareFactory, MiddlewareFactory};
pub use kernel::StackKernel;
pub use loader::{typed_loader, FnValueLoader, ValueLoader, ValueLoaders};
pub use metadata::{
    ActionIntrospector, CachingIntrospector, DeclarationIntrospector, MemoryMetadataCache,
    MetadataCache, MetadataResolver,
};
pub use middleware::{BoxedMiddleware, FnHandler, FnMiddleware, Handler, Middleware, Next};
pub use render::{JsonResultRenderer, ResultRenderer};
pub use stages::{
    AdditionalMiddlewareMiddleware, DefaultContentTypeMiddleware, DeriveMetadataMiddleware,
    EnforceHeadMiddleware, ExceptionCatcherMiddleware, MethodNotAllowedMiddleware,
    NormalizeArgumentsMiddleware, NotFoundMiddleware, ParsedBodyMiddleware,
    QueryParametersMiddleware, RouterMiddleware,
};
