//! Routing stage.
//!
//! Runs the configured [`Router`] and attaches its [`RouteOutcome`] to the
//! request. Every later stage reads the outcome from there.
//!
//! [`RouteOutcome`]: carica_core::RouteOutcome

use crate::middleware::{Handler, Middleware};
use carica_core::{CaricaResult, Request, Response, Router};
use std::fmt;
use std::sync::Arc;

/// Attaches the router's outcome to the request.
#[derive(Clone)]
pub struct RouterMiddleware {
    router: Arc<dyn Router>,
}

impl RouterMiddleware {
    /// Creates the stage around `router`.
    pub fn new(router: Arc<dyn Router>) -> Self {
        Self { router }
    }
}

impl Middleware for RouterMiddleware {
    fn name(&self) -> &'static str {
        "router"
    }

    fn process(&self, request: Request, next: &dyn Handler) -> CaricaResult<Response> {
        let outcome = self.router.route(&request);
        next.handle(request.with_route_outcome(outcome))
    }
}

impl fmt::Debug for RouterMiddleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterMiddleware").finish_non_exhaustive()
    }
}
