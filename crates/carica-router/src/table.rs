//! High-level router API.
//!
//! [`RouteTable`] is the registration surface and implements the
//! [`Router`] plugin interface the routing stage calls.

use crate::definition::RouteDefinition;
use crate::error::RouteError;
use crate::method_table::MethodTable;
use crate::node::Node;
use crate::params::Params;
use carica_core::{Request, RouteOutcome, Router};
use http::Method;

/// A radix tree router producing [`RouteOutcome`]s.
///
/// # Example
///
/// ```rust
/// use carica_core::{ActionDeclaration, ActionOutput, ActionRef, RouteOutcome, Value};
/// use carica_router::RouteTable;
/// use http::Method;
///
/// let show = ActionRef::from_fn("show", ActionDeclaration::new(), |_| {
///     Ok(ActionOutput::from(Value::Null))
/// });
///
/// let mut routes = RouteTable::new();
/// routes.get("/users/{id}", show).unwrap();
///
/// assert!(matches!(
///     routes.match_route(&Method::GET, "/users/7"),
///     RouteOutcome::Success(_)
/// ));
/// assert!(matches!(
///     routes.match_route(&Method::POST, "/users/7"),
///     RouteOutcome::MethodNotAllowed { .. }
/// ));
/// assert_eq!(routes.match_route(&Method::GET, "/posts"), RouteOutcome::NotFound);
/// ```
///
/// # Route Priority
///
/// 1. **Static segments** (e.g., `/users/me`)
/// 2. **Placeholder segments** (e.g., `/users/{id}`)
/// 3. **Wildcard segments** (e.g., `/files/*path`)
#[derive(Debug, Clone)]
pub struct RouteTable {
    root: Node,
    route_count: usize,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: Node::root(),
            route_count: 0,
        }
    }

    /// Registers a definition for several methods at once.
    ///
    /// Either every method is registered or, on error, none is.
    pub fn add<I>(
        &mut self,
        methods: I,
        path: &str,
        definition: impl Into<RouteDefinition>,
    ) -> Result<&mut Self, RouteError>
    where
        I: IntoIterator<Item = Method>,
    {
        let definition = definition.into();
        let mut table = MethodTable::new();
        for method in methods {
            table.insert(method, definition.clone(), path)?;
        }
        if table.is_empty() {
            return Err(RouteError::NoMethods {
                path: path.to_string(),
            });
        }
        self.root.insert(path, table)?;
        self.route_count += 1;
        Ok(self)
    }

    /// Registers a GET route.
    pub fn get(
        &mut self,
        path: &str,
        definition: impl Into<RouteDefinition>,
    ) -> Result<&mut Self, RouteError> {
        self.add([Method::GET], path, definition)
    }

    /// Registers a POST route.
    pub fn post(
        &mut self,
        path: &str,
        definition: impl Into<RouteDefinition>,
    ) -> Result<&mut Self, RouteError> {
        self.add([Method::POST], path, definition)
    }

    /// Registers a PUT route.
    pub fn put(
        &mut self,
        path: &str,
        definition: impl Into<RouteDefinition>,
    ) -> Result<&mut Self, RouteError> {
        self.add([Method::PUT], path, definition)
    }

    /// Registers a PATCH route.
    pub fn patch(
        &mut self,
        path: &str,
        definition: impl Into<RouteDefinition>,
    ) -> Result<&mut Self, RouteError> {
        self.add([Method::PATCH], path, definition)
    }

    /// Registers a DELETE route.
    pub fn delete(
        &mut self,
        path: &str,
        definition: impl Into<RouteDefinition>,
    ) -> Result<&mut Self, RouteError> {
        self.add([Method::DELETE], path, definition)
    }

    /// Resolves a method and path.
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> RouteOutcome {
        let Some((methods, params)) = self.root.match_path(path) else {
            tracing::trace!(%method, path, "No route matches path");
            return RouteOutcome::NotFound;
        };
        match methods.get(method) {
            Some(definition) => RouteOutcome::Success(definition.to_success(params)),
            None => {
                tracing::trace!(%method, path, "Path matched without a route for the method");
                RouteOutcome::method_not_allowed(methods.allowed_methods())
            }
        }
    }

    /// Matches only the path, returning the method table and raw placeholders.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<(&MethodTable, Params)> {
        self.root.match_path(path)
    }

    /// Returns the number of registrations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.route_count
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.route_count == 0
    }
}

impl Router for RouteTable {
    fn route(&self, request: &Request) -> RouteOutcome {
        self.match_route(request.method(), request.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carica_core::{ActionDeclaration, ActionOutput, ActionRef, Value};
    use std::collections::BTreeSet;

    fn action(id: &'static str) -> ActionRef {
        ActionRef::from_fn(id, ActionDeclaration::new(), |_| {
            Ok(ActionOutput::from(Value::Null))
        })
    }

    #[test]
    fn test_not_found() {
        let mut routes = RouteTable::new();
        routes.get("/users", action("list")).unwrap();
        assert_eq!(routes.match_route(&Method::GET, "/posts"), RouteOutcome::NotFound);
    }

    #[test]
    fn test_method_not_allowed_reports_registered_set() {
        let mut routes = RouteTable::new();
        routes
            .get("/users/{id}", action("show"))
            .unwrap()
            .put("/users/{id}", action("update"))
            .unwrap()
            .delete("/users/{id}", action("remove"))
            .unwrap();

        let outcome = routes.match_route(&Method::POST, "/users/3");
        let expected: BTreeSet<String> = ["DELETE", "GET", "PUT"].map(String::from).into();
        assert_eq!(
            outcome,
            RouteOutcome::MethodNotAllowed {
                allowed_methods: expected
            }
        );
    }

    #[test]
    fn test_success_binds_placeholders() {
        let mut routes = RouteTable::new();
        routes.get("/orgs/{org}/users/{user}", action("member")).unwrap();

        let outcome = routes.match_route(&Method::GET, "/orgs/acme/users/j%20doe");
        let success = outcome.as_success().expect("matched");
        assert_eq!(success.action().id().as_str(), "member");
        assert_eq!(success.arguments()["org"], Value::from("acme"));
        assert_eq!(success.arguments()["user"], Value::from("j doe"));
        assert!(!success.metadata().is_resolved());
    }

    #[test]
    fn test_fixed_arguments_beat_placeholders() {
        let mut routes = RouteTable::new();
        routes
            .get(
                "/reports/{format}/{year}",
                RouteDefinition::new(action("report")).with_argument("format", "pdf"),
            )
            .unwrap();

        let outcome = routes.match_route(&Method::GET, "/reports/csv/2024");
        let success = outcome.as_success().expect("matched");
        assert_eq!(success.arguments()["format"], Value::from("pdf"));
        assert_eq!(success.arguments()["year"], Value::from("2024"));
    }

    #[test]
    fn test_add_requires_methods() {
        let mut routes = RouteTable::new();
        let error = routes
            .add(Vec::<Method>::new(), "/nothing", action("none"))
            .unwrap_err();
        assert_eq!(error, RouteError::NoMethods { path: "/nothing".into() });
        assert!(routes.is_empty());
    }

    #[test]
    fn test_failed_add_leaves_table_unchanged() {
        let mut routes = RouteTable::new();
        routes.get("/x", action("a")).unwrap();

        let error = routes
            .add([Method::POST, Method::GET], "/x", action("b"))
            .unwrap_err();
        assert_eq!(
            error,
            RouteError::Duplicate {
                method: "GET".into(),
                path: "/x".into()
            }
        );
        assert_eq!(routes.len(), 1);

        let expected: BTreeSet<String> = ["GET"].map(String::from).into();
        assert_eq!(
            routes.match_route(&Method::POST, "/x"),
            RouteOutcome::MethodNotAllowed {
                allowed_methods: expected
            }
        );
        let success = routes.match_route(&Method::GET, "/x");
        assert_eq!(success.as_success().unwrap().action().id().as_str(), "a");
    }

    #[test]
    fn test_router_trait_reads_request() {
        let mut routes = RouteTable::new();
        routes.add([Method::GET, Method::POST], "/items", action("items")).unwrap();
        assert_eq!(routes.len(), 1);

        let request = Request::new(Method::POST, http::Uri::from_static("/items?x=1"));
        assert!(routes.route(&request).as_success().is_some());
    }
}
