//! Per-path method dispatch.
//!
//! A [`MethodTable`] maps HTTP methods to route definitions for one path
//! pattern. It also knows the exact set of registered methods, which is
//! what a `MethodNotAllowed` outcome reports.

use crate::definition::RouteDefinition;
use crate::error::RouteError;
use http::Method;

/// Maps HTTP methods to route definitions for a single path.
#[derive(Debug, Clone, Default)]
pub struct MethodTable {
    routes: Vec<(Method, RouteDefinition)>,
}

impl MethodTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a definition for `method`.
    pub fn insert(
        &mut self,
        method: Method,
        definition: RouteDefinition,
        path: &str,
    ) -> Result<(), RouteError> {
        if self.routes.iter().any(|(m, _)| *m == method) {
            return Err(RouteError::Duplicate {
                method: method.to_string(),
                path: path.to_string(),
            });
        }
        self.routes.push((method, definition));
        Ok(())
    }

    /// Returns the definition for `method`.
    ///
    /// `HEAD` falls back to the `GET` definition when none is registered.
    #[must_use]
    pub fn get(&self, method: &Method) -> Option<&RouteDefinition> {
        self.find(method).or_else(|| {
            if *method == Method::HEAD {
                self.find(&Method::GET)
            } else {
                None
            }
        })
    }

    fn find(&self, method: &Method) -> Option<&RouteDefinition> {
        self.routes
            .iter()
            .find(|(m, _)| m == method)
            .map(|(_, definition)| definition)
    }

    /// Moves every route of `other` into this table.
    ///
    /// Nothing is moved if any method of `other` is already registered.
    pub fn merge(&mut self, other: Self, path: &str) -> Result<(), RouteError> {
        if let Some((method, _)) = other.routes.iter().find(|(m, _)| self.find(m).is_some()) {
            return Err(RouteError::Duplicate {
                method: method.to_string(),
                path: path.to_string(),
            });
        }
        self.routes.extend(other.routes);
        Ok(())
    }

    /// Returns the registered methods in registration order.
    pub fn allowed_methods(&self) -> impl Iterator<Item = &str> {
        self.routes.iter().map(|(method, _)| method.as_str())
    }

    /// Returns true if no method is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carica_core::{ActionDeclaration, ActionOutput, ActionRef, Value};

    fn definition(id: &'static str) -> RouteDefinition {
        RouteDefinition::new(ActionRef::from_fn(id, ActionDeclaration::new(), |_| {
            Ok(ActionOutput::from(Value::Null))
        }))
    }

    #[test]
    fn test_get_exact_method() {
        let mut table = MethodTable::new();
        table.insert(Method::GET, definition("list"), "/").unwrap();
        table.insert(Method::POST, definition("create"), "/").unwrap();

        assert_eq!(table.get(&Method::POST).unwrap().action().id().as_str(), "create");
        assert!(table.get(&Method::DELETE).is_none());
    }

    #[test]
    fn test_head_falls_back_to_get() {
        let mut table = MethodTable::new();
        table.insert(Method::GET, definition("list"), "/").unwrap();
        assert_eq!(table.get(&Method::HEAD).unwrap().action().id().as_str(), "list");

        table.insert(Method::HEAD, definition("headOnly"), "/").unwrap();
        assert_eq!(table.get(&Method::HEAD).unwrap().action().id().as_str(), "headOnly");
    }

    #[test]
    fn test_duplicate_method_rejected() {
        let mut table = MethodTable::new();
        table.insert(Method::GET, definition("a"), "/x").unwrap();
        let error = table.insert(Method::GET, definition("b"), "/x").unwrap_err();
        assert_eq!(
            error,
            RouteError::Duplicate {
                method: "GET".into(),
                path: "/x".into()
            }
        );
    }

    #[test]
    fn test_merge_keeps_all_methods() {
        let mut table = MethodTable::new();
        table.insert(Method::GET, definition("a"), "/").unwrap();
        let mut other = MethodTable::new();
        other.insert(Method::PUT, definition("b"), "/").unwrap();

        table.merge(other, "/").unwrap();
        assert_eq!(table.allowed_methods().collect::<Vec<_>>(), vec!["GET", "PUT"]);
    }

    #[test]
    fn test_merge_with_duplicate_changes_nothing() {
        let mut table = MethodTable::new();
        table.insert(Method::GET, definition("a"), "/x").unwrap();
        let mut other = MethodTable::new();
        other.insert(Method::POST, definition("b"), "/x").unwrap();
        other.insert(Method::GET, definition("b"), "/x").unwrap();

        let error = table.merge(other, "/x").unwrap_err();
        assert_eq!(
            error,
            RouteError::Duplicate {
                method: "GET".into(),
                path: "/x".into()
            }
        );
        assert_eq!(table.allowed_methods().collect::<Vec<_>>(), vec!["GET"]);
        assert!(table.get(&Method::POST).is_none());
    }
}
