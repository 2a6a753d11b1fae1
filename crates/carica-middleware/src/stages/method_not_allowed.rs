//! Generic 405 stage.
//!
//! A request whose path matched but whose method did not gets a 405 with
//! an `Allow` header listing the registered methods. An OPTIONS request in
//! that position is answered with 204 and the same header instead.

use super::route_outcome;
use crate::middleware::{Handler, Middleware};
use carica_core::response::with_allow;
use carica_core::{CaricaResult, Request, Response, ResponseBuilder, RouteOutcome};
use http::Method;

const STAGE: &str = "method_not_allowed";

/// Answers method mismatches with 405, or 204 for OPTIONS.
#[derive(Debug, Clone, Copy, Default)]
pub struct MethodNotAllowedMiddleware {
    responses: ResponseBuilder,
}

impl MethodNotAllowedMiddleware {
    /// Creates the stage.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            responses: ResponseBuilder::new(),
        }
    }
}

impl Middleware for MethodNotAllowedMiddleware {
    fn name(&self) -> &'static str {
        STAGE
    }

    fn process(&self, request: Request, next: &dyn Handler) -> CaricaResult<Response> {
        let RouteOutcome::MethodNotAllowed { allowed_methods } = route_outcome(&request, STAGE)?
        else {
            return next.handle(request);
        };

        if request.method() == Method::OPTIONS {
            return Ok(with_allow(self.responses.no_content(), allowed_methods));
        }
        tracing::debug!(
            method = %request.method(),
            path = request.path(),
            "Method not allowed"
        );
        Ok(self.responses.method_not_allowed(allowed_methods))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::testing::{request, routed, Capture};
    use carica_core::ActionMetadata;
    use http::StatusCode;

    fn not_allowed(method: Method) -> Request {
        request(method, "/things").with_route_outcome(RouteOutcome::method_not_allowed([
            "post", "get",
        ]))
    }

    #[test]
    fn test_method_not_allowed_lists_methods() {
        let capture = Capture::new();
        let response = MethodNotAllowedMiddleware::new()
            .process(not_allowed(Method::DELETE), &capture.handler())
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()["allow"], "GET, POST");
        assert!(response.body().is_empty());
        assert!(capture.request().is_none());
    }

    #[test]
    fn test_options_gets_no_content() {
        let capture = Capture::new();
        let response = MethodNotAllowedMiddleware::new()
            .process(not_allowed(Method::OPTIONS), &capture.handler())
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(response.headers()["allow"], "GET, POST");
    }

    #[test]
    fn test_success_passes_through() {
        let capture = Capture::new();
        MethodNotAllowedMiddleware::new()
            .process(routed(ActionMetadata::default(), vec![]), &capture.handler())
            .unwrap();
        assert!(capture.request().is_some());
    }
}
