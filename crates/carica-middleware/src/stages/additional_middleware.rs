//! Per-action middleware.
//!
//! Actions may name extra middleware in their declaration. This stage
//! resolves the names through a [`MiddlewareFactory`] and runs them around
//! the rest of the chain, first-named outermost.

use super::route_outcome;
use crate::factory::MiddlewareFactory;
use crate::middleware::{BoxedMiddleware, Handler, Middleware, Next};
use carica_core::{CaricaResult, Request, Response, RouteOutcome};
use std::fmt;
use std::sync::Arc;

const STAGE: &str = "additional_middleware";

/// Runs the middleware named by the matched action's metadata.
#[derive(Clone)]
pub struct AdditionalMiddlewareMiddleware {
    factory: Arc<dyn MiddlewareFactory>,
}

impl AdditionalMiddlewareMiddleware {
    /// Creates the stage.
    pub fn new(factory: Arc<dyn MiddlewareFactory>) -> Self {
        Self { factory }
    }

    fn resolve(&self, request: &Request) -> CaricaResult<Vec<BoxedMiddleware>> {
        let RouteOutcome::Success(success) = route_outcome(request, STAGE)? else {
            return Ok(Vec::new());
        };
        let route = success.resolved(STAGE)?;
        let names = route.metadata.additional_middleware();
        if !names.is_empty() {
            tracing::trace!(action = %route.action.id(), middleware = ?names, "Resolving action middleware");
        }
        names.iter().map(|name| self.factory.resolve(name)).collect()
    }
}

impl Middleware for AdditionalMiddlewareMiddleware {
    fn name(&self) -> &'static str {
        STAGE
    }

    fn process(&self, request: Request, next: &dyn Handler) -> CaricaResult<Response> {
        let stages = self.resolve(&request)?;
        Next::new(&stages, next).run(request)
    }
}

impl fmt::Debug for AdditionalMiddlewareMiddleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdditionalMiddlewareMiddleware")
            .finish_non_exhaustive()
    }
}
