//! Generic 404 stage.

use super::route_outcome;
use crate::middleware::{Handler, Middleware};
use carica_core::{CaricaResult, Request, Response, ResponseBuilder, RouteOutcome};

const STAGE: &str = "not_found";

/// Answers requests whose path matched no route with an empty 404.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotFoundMiddleware {
    responses: ResponseBuilder,
}

impl NotFoundMiddleware {
    /// Creates the stage.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            responses: ResponseBuilder::new(),
        }
    }
}

impl Middleware for NotFoundMiddleware {
    fn name(&self) -> &'static str {
        STAGE
    }

    fn process(&self, request: Request, next: &dyn Handler) -> CaricaResult<Response> {
        if matches!(route_outcome(&request, STAGE)?, RouteOutcome::NotFound) {
            tracing::debug!(path = request.path(), "No route matched");
            return Ok(self.responses.not_found("", None));
        }
        next.handle(request)
    }
}
