//! Named service lookup.
//!
//! Pipeline components that are instantiated by name (currently the
//! per-action middleware) ask a [`ServiceLocator`] first. [`Container`] is
//! the in-memory implementation.
//!
//! # Example
//!
//! ```rust
//! use carica_core::{Container, ServiceLocator};
//! use std::sync::Arc;
//!
//! trait Greeter: Send + Sync {
//!     fn greet(&self) -> String;
//! }
//!
//! struct English;
//!
//! impl Greeter for English {
//!     fn greet(&self) -> String {
//!         "hello".to_string()
//!     }
//! }
//!
//! let mut container: Container<dyn Greeter> = Container::new();
//! container.register("english", Arc::new(English));
//!
//! assert!(container.has("english"));
//! assert_eq!(container.get("english").unwrap().greet(), "hello");
//! assert!(container.get("french").is_none());
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Looks up shared services of type `S` by name.
pub trait ServiceLocator<S: ?Sized>: Send + Sync {
    /// Returns true if a service is registered under `name`.
    fn has(&self, name: &str) -> bool;

    /// Returns the service registered under `name`.
    fn get(&self, name: &str) -> Option<Arc<S>>;
}

/// An in-memory service locator.
///
/// Services are registered once at assembly time and shared afterwards.
pub struct Container<S: ?Sized> {
    services: HashMap<String, Arc<S>>,
}

impl<S: ?Sized> Container<S> {
    /// Creates an empty container.
    #[must_use]
    pub fn new() -> Self {
        Self {
            services: HashMap::new(),
        }
    }

    /// Registers a service, replacing any previous one with the same name.
    pub fn register(&mut self, name: impl Into<String>, service: Arc<S>) {
        self.services.insert(name.into(), service);
    }

    /// Builder form of [`register`](Self::register).
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, service: Arc<S>) -> Self {
        self.register(name, service);
        self
    }

    /// Returns the number of registered services.
    #[must_use]
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Returns `true` if no services are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl<S: ?Sized> Default for Container<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: ?Sized + Send + Sync> ServiceLocator<S> for Container<S> {
    fn has(&self, name: &str) -> bool {
        self.services.contains_key(name)
    }

    fn get(&self, name: &str) -> Option<Arc<S>> {
        self.services.get(name).cloned()
    }
}

impl<S: ?Sized> fmt::Debug for Container<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.services.keys().collect();
        names.sort();
        f.debug_struct("Container")
            .field("services", &names)
            .finish()
    }
}
