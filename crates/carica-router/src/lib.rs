//! Radix tree router for Carica.
//!
//! This crate provides the default [`carica_core::Router`] implementation.
//! Routes map a method and a path pattern to an [`carica_core::ActionRef`],
//! and every lookup produces a [`carica_core::RouteOutcome`]: `NotFound`,
//! `MethodNotAllowed` with the registered methods, or `Success` carrying the
//! action and its bound arguments.
//!
//! # Features
//!
//! - **Path Parameters**: `/users/{id}` binds `id` as a string argument
//! - **Wildcards**: `/files/*path` binds the remaining path
//! - **Fixed Arguments**: values attached at registration win over placeholders
//! - **Precomputed Metadata**: routes may carry their own action metadata
//! - **Delegation**: [`DelegatingRouter`] mounts sub-routers on path prefixes
//!
//! # Example
//!
//! ```rust
//! use carica_core::{ActionDeclaration, ActionOutput, ActionRef, Value};
//! use carica_router::{RouteDefinition, RouteTable};
//! use http::Method;
//!
//! let show = ActionRef::from_fn("showFile", ActionDeclaration::new(), |_| {
//!     Ok(ActionOutput::from(Value::Null))
//! });
//!
//! let mut routes = RouteTable::new();
//! routes
//!     .get("/files/*path", RouteDefinition::new(show).with_argument("inline", true))
//!     .unwrap();
//!
//! let outcome = routes.match_route(&Method::GET, "/files/docs/readme.md");
//! let success = outcome.as_success().unwrap();
//! assert_eq!(success.arguments()["path"], Value::from("docs/readme.md"));
//! assert_eq!(success.arguments()["inline"], Value::Bool(true));
//! ```
//!
//! # Architecture
//!
//! ```text
//!                    (root)
//!                      │
//!              ┌───────┴───────┐
//!              │               │
//!            "users"        "files"
//!              │               │
//!        ┌─────┴─────┐        "*path"
//!        │           │
//!       (leaf)    "{id}"
//!   [GET,POST]      │
//!                 (leaf)
//!              [GET,DELETE]
//! ```

#![doc(html_root_url = "https://docs.rs/carica-router/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod definition;
mod delegating;
mod error;
mod method_table;
mod node;
mod params;
mod table;

pub use definition::RouteDefinition;
pub use delegating::DelegatingRouter;
pub use error::RouteError;
pub use method_table::MethodTable;
pub use node::{Node, SegmentKind};
pub use params::Params;
pub use table::RouteTable;

#[cfg(test)]
mod tests {
    use super::*;
    use carica_core::{ActionDeclaration, ActionOutput, ActionRef, RouteOutcome, Value};
    use http::Method;

    fn action(id: &'static str) -> ActionRef {
        ActionRef::from_fn(id, ActionDeclaration::new(), |_| {
            Ok(ActionOutput::from(Value::Null))
        })
    }

    fn matched_id(routes: &RouteTable, method: &Method, path: &str) -> Option<String> {
        routes
            .match_route(method, path)
            .as_success()
            .map(|success| success.action().id().to_string())
    }

    #[test]
    fn test_basic_routing() {
        let mut routes = RouteTable::new();
        routes.get("/users", action("listUsers")).unwrap();
        routes.get("/users/{id}", action("getUser")).unwrap();

        assert_eq!(matched_id(&routes, &Method::GET, "/users").as_deref(), Some("listUsers"));

        let outcome = routes.match_route(&Method::GET, "/users/123");
        let success = outcome.as_success().unwrap();
        assert_eq!(success.action().id().as_str(), "getUser");
        assert_eq!(success.arguments()["id"], Value::from("123"));
    }

    #[test]
    fn test_method_routing() {
        let mut routes = RouteTable::new();
        routes
            .get("/users", action("listUsers"))
            .unwrap()
            .post("/users", action("createUser"))
            .unwrap();

        assert_eq!(matched_id(&routes, &Method::GET, "/users").as_deref(), Some("listUsers"));
        assert_eq!(matched_id(&routes, &Method::POST, "/users").as_deref(), Some("createUser"));
        assert!(matches!(
            routes.match_route(&Method::DELETE, "/users"),
            RouteOutcome::MethodNotAllowed { .. }
        ));
    }

    #[test]
    fn test_head_uses_get_route() {
        let mut routes = RouteTable::new();
        routes.get("/status", action("status")).unwrap();
        assert_eq!(matched_id(&routes, &Method::HEAD, "/status").as_deref(), Some("status"));
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut routes = RouteTable::new();
        routes.get("/users", action("a")).unwrap();
        let error = routes.get("/users", action("b")).unwrap_err();
        assert!(matches!(error, RouteError::Duplicate { .. }));
    }

    #[test]
    fn test_precomputed_metadata_travels_with_success() {
        let metadata = std::sync::Arc::new(carica_core::ActionMetadata::default());
        let mut routes = RouteTable::new();
        routes
            .get(
                "/ping",
                RouteDefinition::new(action("ping")).with_metadata(metadata.clone()),
            )
            .unwrap();

        let outcome = routes.match_route(&Method::GET, "/ping");
        let state = outcome.as_success().unwrap().metadata();
        assert!(std::sync::Arc::ptr_eq(state.as_resolved().unwrap(), &metadata));
    }
}
