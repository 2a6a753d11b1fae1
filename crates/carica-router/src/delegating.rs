//! Prefix-based delegation between routers.
//!
//! A [`DelegatingRouter`] hands each request to the sub-router mounted on
//! the longest matching path prefix, and to its default router when no
//! prefix matches. Prefixes match on whole segments: `/foo` covers `/foo`
//! and `/foo/bar.php`, but not `/foobar`.

use carica_core::{Request, RouteOutcome, Router};
use std::fmt;
use std::sync::Arc;

/// Routes requests to sub-routers by path prefix.
///
/// # Example
///
/// ```rust
/// use carica_core::{ActionDeclaration, ActionOutput, ActionRef, Request, Router, Value};
/// use carica_router::{DelegatingRouter, RouteTable};
/// use http::{Method, Uri};
/// use std::sync::Arc;
///
/// let action = |id: &'static str| {
///     ActionRef::from_fn(id, ActionDeclaration::new(), |_| Ok(ActionOutput::from(Value::Null)))
/// };
/// let mut site = RouteTable::new();
/// site.get("/", action("home")).unwrap();
/// let mut admin = RouteTable::new();
/// admin.get("/admin/users", action("adminUsers")).unwrap();
///
/// let mut router = DelegatingRouter::new(Arc::new(site));
/// router.delegate_to("/admin", Arc::new(admin));
///
/// let request = Request::new(Method::GET, Uri::from_static("/admin/users"));
/// let outcome = router.route(&request);
/// assert_eq!(outcome.as_success().unwrap().action().id().as_str(), "adminUsers");
/// ```
#[derive(Clone)]
pub struct DelegatingRouter {
    default: Arc<dyn Router>,
    /// Longest prefix first.
    delegates: Vec<(String, Arc<dyn Router>)>,
}

impl DelegatingRouter {
    /// Creates a router that sends everything to `default`.
    pub fn new(default: Arc<dyn Router>) -> Self {
        Self {
            default,
            delegates: Vec::new(),
        }
    }

    /// Mounts `router` on `prefix`.
    ///
    /// The prefix is normalized to a leading slash without a trailing one.
    /// Mounting on a prefix already in use replaces the earlier router.
    pub fn delegate_to(&mut self, prefix: &str, router: Arc<dyn Router>) -> &mut Self {
        let prefix = normalize_prefix(prefix);
        if let Some(index) = self.delegates.iter().position(|(existing, _)| *existing == prefix) {
            tracing::debug!(prefix = %prefix, "Replacing delegated router");
            self.delegates[index].1 = router;
        } else {
            let index = self
                .delegates
                .iter()
                .position(|(existing, _)| existing.len() < prefix.len())
                .unwrap_or(self.delegates.len());
            self.delegates.insert(index, (prefix, router));
        }
        self
    }

    /// Returns the router responsible for `path`.
    fn router_for(&self, path: &str) -> &dyn Router {
        self.delegates
            .iter()
            .find(|(prefix, _)| covers(prefix, path))
            .map_or(&*self.default, |(prefix, router)| {
                tracing::trace!(prefix = %prefix, path, "Delegating route lookup");
                &**router
            })
    }

    /// Returns the number of mounted sub-routers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.delegates.len()
    }

    /// Returns true if only the default router is in use.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.delegates.is_empty()
    }
}

impl Router for DelegatingRouter {
    fn route(&self, request: &Request) -> RouteOutcome {
        self.router_for(request.path()).route(request)
    }
}

impl fmt::Debug for DelegatingRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelegatingRouter")
            .field(
                "prefixes",
                &self.delegates.iter().map(|(prefix, _)| prefix).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return String::new();
    }
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// Whether `prefix` covers `path` on a segment boundary.
fn covers(prefix: &str, path: &str) -> bool {
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use carica_core::{ActionDeclaration, ActionOutput, ActionRef, RouteSuccess, Value};
    use http::{Method, Uri};

    /// A router that answers every request with the same action.
    struct Fixed(ActionRef);

    impl Fixed {
        fn named(id: &'static str) -> Arc<dyn Router> {
            Arc::new(Self(ActionRef::from_fn(id, ActionDeclaration::new(), |_| {
                Ok(ActionOutput::from(Value::Null))
            })))
        }
    }

    impl Router for Fixed {
        fn route(&self, _request: &Request) -> RouteOutcome {
            RouteOutcome::Success(RouteSuccess::new(self.0.clone()))
        }
    }

    fn routed_to(router: &DelegatingRouter, method: Method, path: &str) -> String {
        let request = Request::new(method, path.parse::<Uri>().unwrap());
        router
            .route(&request)
            .as_success()
            .map(|success| success.action().id().to_string())
            .unwrap()
    }

    #[test]
    fn test_default_router_reached_without_delegates() {
        let router = DelegatingRouter::new(Fixed::named("default"));
        assert!(router.is_empty());
        for (method, path) in [(Method::GET, "/foo"), (Method::POST, "/foo"), (Method::GET, "/")] {
            assert_eq!(routed_to(&router, method, path), "default");
        }
    }

    #[test]
    fn test_delegate_handles_its_prefix() {
        let mut router = DelegatingRouter::new(Fixed::named("default"));
        router.delegate_to("/foo", Fixed::named("router1"));

        let cases = [
            (Method::GET, "/foo", "router1"),
            (Method::POST, "/foo", "router1"),
            (Method::POST, "/foo/bar", "router1"),
            (Method::POST, "/foo/bar.php", "router1"),
            (Method::GET, "/", "default"),
            (Method::GET, "/baz", "default"),
            (Method::GET, "/foobar", "default"),
        ];
        for (method, path, expected) in cases {
            assert_eq!(routed_to(&router, method, path), expected, "{path}");
        }
    }

    #[test]
    fn test_longest_prefix_wins() {
        let mut router = DelegatingRouter::new(Fixed::named("default"));
        router
            .delegate_to("/api", Fixed::named("api"))
            .delegate_to("/api/v2/", Fixed::named("v2"));

        assert_eq!(router.len(), 2);
        assert_eq!(routed_to(&router, Method::GET, "/api/v2/users"), "v2");
        assert_eq!(routed_to(&router, Method::GET, "/api/v1/users"), "api");
        assert_eq!(routed_to(&router, Method::GET, "/api"), "api");
    }

    #[test]
    fn test_remounting_a_prefix_replaces_it() {
        let mut router = DelegatingRouter::new(Fixed::named("default"));
        router
            .delegate_to("foo", Fixed::named("first"))
            .delegate_to("/foo/", Fixed::named("second"));

        assert_eq!(router.len(), 1);
        assert_eq!(routed_to(&router, Method::GET, "/foo/x"), "second");
    }

    #[test]
    fn test_delegate_outcomes_pass_through() {
        let mut table = crate::RouteTable::new();
        table
            .get(
                "/shop/items",
                ActionRef::from_fn("items", ActionDeclaration::new(), |_| {
                    Ok(ActionOutput::from(Value::Null))
                }),
            )
            .unwrap();
        let mut router = DelegatingRouter::new(Fixed::named("default"));
        router.delegate_to("/shop", Arc::new(table));

        let missing = Request::new(Method::GET, Uri::from_static("/shop/nothing"));
        assert_eq!(router.route(&missing), RouteOutcome::NotFound);
        let wrong_method = Request::new(Method::DELETE, Uri::from_static("/shop/items"));
        assert!(matches!(
            router.route(&wrong_method),
            RouteOutcome::MethodNotAllowed { .. }
        ));
    }

    #[test]
    fn test_prefix_normalization() {
        assert_eq!(normalize_prefix("/foo/"), "/foo");
        assert_eq!(normalize_prefix("foo"), "/foo");
        assert_eq!(normalize_prefix("/"), "");
        assert!(covers("", "/anything"));
        assert!(covers("/foo", "/foo"));
        assert!(!covers("/foo", "/foobar"));
    }
}
