//! Resolution of middleware by name.
//!
//! Actions name the extra middleware they want. A [`MiddlewareFactory`]
//! turns those names into instances. [`LocatorMiddlewareFactory`] asks a
//! [`ServiceLocator`] first and falls back to constructors registered for
//! default-constructible middleware.

use crate::middleware::{BoxedMiddleware, Middleware};
use carica_core::{CaricaResult, ConfigurationFault, ServiceLocator};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Produces middleware instances by name.
pub trait MiddlewareFactory: Send + Sync {
    /// Resolves `name`, failing with [`ConfigurationFault::UnknownMiddleware`].
    fn resolve(&self, name: &str) -> CaricaResult<BoxedMiddleware>;
}

type Constructor = Arc<dyn Fn() -> BoxedMiddleware + Send + Sync>;

/// Looks middleware up in a service locator, then among default constructors.
///
/// # Example
///
/// ```
/// use carica_core::{CaricaResult, Container, Request, Response};
/// use carica_middleware::{Handler, LocatorMiddlewareFactory, Middleware, MiddlewareFactory};
/// use std::sync::Arc;
///
/// #[derive(Default)]
/// struct Audit;
///
/// impl Middleware for Audit {
///     fn name(&self) -> &'static str {
///         "audit"
///     }
///
///     fn process(&self, request: Request, next: &dyn Handler) -> CaricaResult<Response> {
///         next.handle(request)
///     }
/// }
///
/// let container = Container::<dyn Middleware>::new().with("audit", Arc::new(Audit));
/// let factory = LocatorMiddlewareFactory::new()
///     .with_locator(Arc::new(container))
///     .with_default::<Audit>("fallback-audit");
///
/// assert_eq!(factory.resolve("audit").unwrap().name(), "audit");
/// assert_eq!(factory.resolve("fallback-audit").unwrap().name(), "audit");
/// assert!(factory.resolve("missing").is_err());
/// ```
#[derive(Default)]
pub struct LocatorMiddlewareFactory {
    locator: Option<Arc<dyn ServiceLocator<dyn Middleware>>>,
    constructors: HashMap<String, Constructor>,
}

impl LocatorMiddlewareFactory {
    /// Creates a factory with no locator and no constructors.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the service locator consulted first.
    #[must_use]
    pub fn with_locator(mut self, locator: Arc<dyn ServiceLocator<dyn Middleware>>) -> Self {
        self.locator = Some(locator);
        self
    }

    /// Registers `M::default()` as the fallback for `name`.
    #[must_use]
    pub fn with_default<M>(mut self, name: impl Into<String>) -> Self
    where
        M: Middleware + Default,
    {
        self.constructors
            .insert(name.into(), Arc::new(|| Arc::new(M::default()) as BoxedMiddleware));
        self
    }

    /// Registers a constructor as the fallback for `name`.
    #[must_use]
    pub fn with_constructor<F>(mut self, name: impl Into<String>, constructor: F) -> Self
    where
        F: Fn() -> BoxedMiddleware + Send + Sync + 'static,
    {
        self.constructors.insert(name.into(), Arc::new(constructor));
        self
    }
}

impl MiddlewareFactory for LocatorMiddlewareFactory {
    fn resolve(&self, name: &str) -> CaricaResult<BoxedMiddleware> {
        if let Some(locator) = &self.locator {
            if locator.has(name) {
                if let Some(middleware) = locator.get(name) {
                    tracing::trace!(middleware = name, "Resolved middleware from locator");
                    return Ok(middleware);
                }
            }
        }
        if let Some(constructor) = self.constructors.get(name) {
            tracing::trace!(middleware = name, "Constructed default middleware");
            return Ok(constructor());
        }
        Err(ConfigurationFault::UnknownMiddleware {
            name: name.to_string(),
        }
        .into())
    }
}

impl fmt::Debug for LocatorMiddlewareFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut defaults: Vec<_> = self.constructors.keys().collect();
        defaults.sort();
        f.debug_struct("LocatorMiddlewareFactory")
            .field("has_locator", &self.locator.is_some())
            .field("defaults", &defaults)
            .finish()
    }
}
