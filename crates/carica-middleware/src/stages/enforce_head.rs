//! Strips the body from responses to HEAD requests.
//!
//! The router answers HEAD with the GET route, so actions need not know
//! about HEAD at all. Headers, including any `content-length` the action
//! set, are kept.

use crate::middleware::{Handler, Middleware};
use bytes::Bytes;
use carica_core::{CaricaResult, Request, Response};
use http::Method;

/// Empties response bodies for HEAD requests.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnforceHeadMiddleware;

impl EnforceHeadMiddleware {
    /// Creates the stage.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Middleware for EnforceHeadMiddleware {
    fn name(&self) -> &'static str {
        "enforce_head"
    }

    fn process(&self, request: Request, next: &dyn Handler) -> CaricaResult<Response> {
        let is_head = request.method() == Method::HEAD;
        let mut response = next.handle(request)?;
        if is_head && !response.body().is_empty() {
            *response.body_mut() = Bytes::new();
        }
        Ok(response)
    }
}
