//! Core handler and middleware traits.
//!
//! A [`Handler`] turns a request into a response. A [`Middleware`] sits in
//! front of a handler: it receives the request together with the rest of the
//! chain and either answers on its own or delegates to `next`.
//!
//! # Example
//!
//! ```
//! use carica_core::{CaricaResult, Request, Response, ResponseBuilder};
//! use carica_middleware::{Handler, Middleware};
//! use http::header::{HeaderName, HeaderValue};
//!
//! struct PoweredBy;
//!
//! impl Middleware for PoweredBy {
//!     fn name(&self) -> &'static str {
//!         "powered_by"
//!     }
//!
//!     fn process(&self, request: Request, next: &dyn Handler) -> CaricaResult<Response> {
//!         let mut response = next.handle(request)?;
//!         response.headers_mut().insert(
//!             HeaderName::from_static("x-powered-by"),
//!             HeaderValue::from_static("carica"),
//!         );
//!         Ok(response)
//!     }
//! }
//! ```

use carica_core::{CaricaResult, Request, Response};
use std::sync::Arc;

/// Something that produces a response for a request.
pub trait Handler: Send + Sync {
    /// Handles the request.
    fn handle(&self, request: Request) -> CaricaResult<Response>;
}

impl<H: Handler + ?Sized> Handler for Arc<H> {
    fn handle(&self, request: Request) -> CaricaResult<Response> {
        (**self).handle(request)
    }
}

impl<H: Handler + ?Sized> Handler for &H {
    fn handle(&self, request: Request) -> CaricaResult<Response> {
        (**self).handle(request)
    }
}

/// One layer of the onion.
///
/// # Invariants
///
/// - Stages hold no per-request state; everything travels in the request
/// - A stage either returns its own response or calls `next.handle` once
/// - Errors from `next` are propagated, not absorbed, except by the
///   outermost catch-all
pub trait Middleware: Send + Sync + 'static {
    /// Returns the stage name used in logs and faults.
    fn name(&self) -> &'static str;

    /// Processes the request, delegating to `next` to continue the chain.
    fn process(&self, request: Request, next: &dyn Handler) -> CaricaResult<Response>;
}

/// A shared, type-erased middleware.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// The remainder of a middleware chain.
///
/// Index 0 of `stages` runs first; once the stages are exhausted the
/// endpoint handles the request.
#[derive(Clone, Copy)]
pub struct Next<'a> {
    stages: &'a [BoxedMiddleware],
    endpoint: &'a dyn Handler,
}

impl<'a> Next<'a> {
    /// Creates a chain over `stages` that ends in `endpoint`.
    pub fn new(stages: &'a [BoxedMiddleware], endpoint: &'a dyn Handler) -> Self {
        Self { stages, endpoint }
    }

    /// Runs the first remaining stage, or the endpoint.
    pub fn run(&self, request: Request) -> CaricaResult<Response> {
        match self.stages.split_first() {
            Some((stage, rest)) => stage.process(request, &Next::new(rest, self.endpoint)),
            None => self.endpoint.handle(request),
        }
    }

    /// Number of stages still ahead of the endpoint.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.stages.len()
    }
}

impl Handler for Next<'_> {
    fn handle(&self, request: Request) -> CaricaResult<Response> {
        self.run(request)
    }
}

/// A handler backed by a closure.
pub struct FnHandler<F> {
    func: F,
}

impl<F> FnHandler<F>
where
    F: Fn(Request) -> CaricaResult<Response> + Send + Sync,
{
    /// Wraps a closure.
    pub const fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> Handler for FnHandler<F>
where
    F: Fn(Request) -> CaricaResult<Response> + Send + Sync,
{
    fn handle(&self, request: Request) -> CaricaResult<Response> {
        (self.func)(request)
    }
}

/// A middleware that can be created from a function.
///
/// # Example
///
/// ```
/// use carica_middleware::FnMiddleware;
///
/// let passthrough = FnMiddleware::new("passthrough", |request, next| next.handle(request));
/// ```
pub struct FnMiddleware<F> {
    name: &'static str,
    func: F,
}

impl<F> FnMiddleware<F>
where
    F: Fn(Request, &dyn Handler) -> CaricaResult<Response> + Send + Sync + 'static,
{
    /// Creates a new function-based middleware.
    pub fn new(name: &'static str, func: F) -> Self {
        Self { name, func }
    }
}

impl<F> Middleware for FnMiddleware<F>
where
    F: Fn(Request, &dyn Handler) -> CaricaResult<Response> + Send + Sync + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn process(&self, request: Request, next: &dyn Handler) -> CaricaResult<Response> {
        (self.func)(request, next)
    }
}
