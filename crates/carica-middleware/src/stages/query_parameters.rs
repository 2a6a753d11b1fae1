//! Merges query parameters into the bound arguments.
//!
//! The merge runs after routing, so a query parameter replaces a path
//! placeholder or fixed route argument of the same name.

use super::route_outcome;
use crate::middleware::{Handler, Middleware};
use carica_core::{CaricaResult, Request, Response, RouteOutcome};

const STAGE: &str = "query_parameters";

/// Adds the request's query parameters to the route arguments.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryParametersMiddleware;

impl QueryParametersMiddleware {
    /// Creates the stage.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Middleware for QueryParametersMiddleware {
    fn name(&self) -> &'static str {
        STAGE
    }

    fn process(&self, request: Request, next: &dyn Handler) -> CaricaResult<Response> {
        let RouteOutcome::Success(success) = route_outcome(&request, STAGE)? else {
            return next.handle(request);
        };
        let query = request.query_params();
        if query.is_empty() {
            return next.handle(request);
        }

        let outcome = RouteOutcome::Success(success.clone().with_added_args(query));
        next.handle(request.with_route_outcome(outcome))
    }
}
