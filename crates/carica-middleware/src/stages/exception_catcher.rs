//! Outermost catch-all stage.
//!
//! Any error propagated out of the chain, and any panic unwinding through
//! it, is logged and converted into a 500 response. The body is empty
//! unless debug mode is on, in which case it carries the error report.
//! This stage never returns `Err`.

use crate::middleware::{Handler, Middleware};
use carica_core::{CaricaResult, Request, Response, ResponseBuilder};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

const STAGE: &str = "exception_catcher";

/// Converts uncaught failures into 500 responses.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExceptionCatcherMiddleware {
    responses: ResponseBuilder,
    debug: bool,
}

impl ExceptionCatcherMiddleware {
    /// Creates the stage with debug output off.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            responses: ResponseBuilder::new(),
            debug: false,
        }
    }

    /// Sets whether failure details are written to the response body.
    ///
    /// **Warning**: only enable this in development.
    #[must_use]
    pub const fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    fn failure(&self, detail: String) -> Response {
        let body = if self.debug { detail } else { String::new() };
        self.responses.internal_server_error(body)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic with a non-string payload".to_string()
    }
}

impl Middleware for ExceptionCatcherMiddleware {
    fn name(&self) -> &'static str {
        STAGE
    }

    fn process(&self, request: Request, next: &dyn Handler) -> CaricaResult<Response> {
        let method = request.method().clone();
        let path = request.path().to_string();

        match panic::catch_unwind(AssertUnwindSafe(|| next.handle(request))) {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(error)) => {
                let report = error.report();
                tracing::error!(%method, %path, error = %report, "Uncaught error");
                Ok(self.failure(report))
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::error!(%method, %path, panic = %message, "Handler panicked");
                Ok(self.failure(message))
            }
        }
    }
}
