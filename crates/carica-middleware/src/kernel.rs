//! Onion-style middleware kernel.
//!
//! [`StackKernel`] composes an ordered list of stages around a base handler.
//! Stages given at construction run in list order: index 0 is the outermost
//! layer, seeing the request first and the response last.
//! [`StackKernel::add_middleware`] wraps a new outermost layer, so stages
//! appended one at a time run in the reverse of the order they were added.
//!
//! ```text
//! StackKernel::new(base, [A, B, C])      → A → B → C → base
//! add_middleware(A); (B); (C)            → C → B → A → base
//! ```
//!
//! # Example
//!
//! ```
//! use carica_core::{Request, ResponseBuilder};
//! use carica_middleware::{FnHandler, FnMiddleware, Handler, StackKernel};
//! use http::{Method, StatusCode, Uri};
//! use std::sync::Arc;
//!
//! let base = FnHandler::new(|_| Ok(ResponseBuilder::new().ok("hello", Some("text/plain"))));
//! let mut kernel = StackKernel::new(base, Vec::new());
//! kernel.add_middleware(Arc::new(FnMiddleware::new("passthrough", |request, next| {
//!     next.handle(request)
//! })));
//!
//! let response = kernel
//!     .handle(Request::new(Method::GET, Uri::from_static("/")))
//!     .unwrap();
//! assert_eq!(response.status(), StatusCode::OK);
//! assert_eq!(kernel.stage_names(), vec!["passthrough"]);
//! ```

use crate::middleware::{BoxedMiddleware, Handler, Next};
use carica_core::{CaricaResult, Request, Response};
use std::fmt;
use std::sync::Arc;

/// A handler that runs a request through a stack of middleware.
///
/// The kernel holds only its stages and base handler; it keeps no
/// per-request state and can be shared across threads.
pub struct StackKernel {
    /// Stages, outermost first
    stages: Vec<BoxedMiddleware>,

    /// Handler reached once every stage has delegated
    base: Arc<dyn Handler>,
}

impl StackKernel {
    /// Creates a kernel; the first stage in `stages` is the outermost.
    pub fn new<H>(base: H, stages: impl IntoIterator<Item = BoxedMiddleware>) -> Self
    where
        H: Handler + 'static,
    {
        Self::from_shared(Arc::new(base), stages)
    }

    /// Creates a kernel around an already shared base handler.
    pub fn from_shared(
        base: Arc<dyn Handler>,
        stages: impl IntoIterator<Item = BoxedMiddleware>,
    ) -> Self {
        Self {
            stages: stages.into_iter().collect(),
            base,
        }
    }

    /// Adds a stage as the new outermost layer.
    pub fn add_middleware(&mut self, stage: BoxedMiddleware) -> &mut Self {
        self.stages.insert(0, stage);
        self
    }

    /// Builder form of [`add_middleware`](Self::add_middleware).
    #[must_use]
    pub fn with_middleware(mut self, stage: BoxedMiddleware) -> Self {
        self.add_middleware(stage);
        self
    }

    /// Returns the stage names, outermost first.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }
}

impl Handler for StackKernel {
    fn handle(&self, request: Request) -> CaricaResult<Response> {
        Next::new(&self.stages, &*self.base).run(request)
    }
}

impl fmt::Debug for StackKernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StackKernel")
            .field("stages", &self.stage_names())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::{FnHandler, FnMiddleware};
    use carica_core::{CaricaError, ConfigurationFault, ResponseBuilder};
    use http::header::{HeaderName, HeaderValue};
    use http::{Method, Uri};

    /// Appends its name to the `x-trace` response header on the way out.
    fn tracer(name: &'static str) -> BoxedMiddleware {
        Arc::new(FnMiddleware::new(name, move |request: Request, next: &dyn Handler| {
            let mut response = next.handle(request)?;
            let trace = response
                .headers()
                .get("x-trace")
                .and_then(|value| value.to_str().ok())
                .map(|existing| format!("{existing},{name}"))
                .unwrap_or_else(|| name.to_string());
            response.headers_mut().insert(
                HeaderName::from_static("x-trace"),
                HeaderValue::from_str(&trace).unwrap(),
            );
            Ok(response)
        }))
    }

    fn base() -> FnHandler<impl Fn(Request) -> CaricaResult<Response> + Send + Sync> {
        FnHandler::new(|_| Ok(ResponseBuilder::new().ok("base", None)))
    }

    fn trace_of(kernel: &StackKernel) -> String {
        let response = kernel
            .handle(Request::new(Method::GET, Uri::from_static("/")))
            .unwrap();
        response.headers()["x-trace"].to_str().unwrap().to_string()
    }

    #[test]
    fn test_construction_order_is_outermost_first() {
        let kernel = StackKernel::new(base(), vec![tracer("A"), tracer("B"), tracer("C")]);
        // The innermost layer appends first on the way out.
        assert_eq!(trace_of(&kernel), "C,B,A");
        assert_eq!(kernel.stage_names(), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_appended_stages_wrap_outward() {
        let mut kernel = StackKernel::new(base(), Vec::new());
        kernel
            .add_middleware(tracer("A"))
            .add_middleware(tracer("B"))
            .add_middleware(tracer("C"));

        assert_eq!(trace_of(&kernel), "A,B,C");
        assert_eq!(kernel.stage_names(), vec!["C", "B", "A"]);
        assert_eq!(kernel.stage_count(), 3);
    }

    #[test]
    fn test_empty_kernel_calls_base() {
        let kernel = StackKernel::new(base(), Vec::new());
        let response = kernel
            .handle(Request::new(Method::GET, Uri::from_static("/")))
            .unwrap();
        assert_eq!(response.body().as_ref(), b"base");
    }

    #[test]
    fn test_errors_propagate_through_layers() {
        let failing = FnHandler::new(|_| {
            Err(CaricaError::from(ConfigurationFault::RouteOutcomeMissing { stage: "test" }))
        });
        let kernel = StackKernel::new(failing, vec![tracer("A")]);

        let error = kernel
            .handle(Request::new(Method::GET, Uri::from_static("/")))
            .unwrap_err();
        assert!(error.as_configuration().is_some());
    }
}
