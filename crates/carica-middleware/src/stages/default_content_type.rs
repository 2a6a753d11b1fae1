//! Fills in missing `content-type` and `accept` request headers.
//!
//! Clients that omit these headers are treated as if they had sent the
//! configured defaults. Headers the client did send are never replaced.

use crate::middleware::{Handler, Middleware};
use carica_core::{CaricaResult, Request, Response};
use http::header::{HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};

/// Applies default `content-type` and `accept` headers.
#[derive(Debug, Clone, Default)]
pub struct DefaultContentTypeMiddleware {
    content_type: Option<HeaderValue>,
    accept: Option<HeaderValue>,
}

impl DefaultContentTypeMiddleware {
    /// Creates the stage with no defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the stage using `media_type` for both headers.
    ///
    /// An invalid header value leaves the headers unset.
    #[must_use]
    pub fn json_like(media_type: &str) -> Self {
        Self::new()
            .with_content_type(media_type)
            .with_accept(media_type)
    }

    /// Sets the default `content-type`.
    #[must_use]
    pub fn with_content_type(mut self, media_type: &str) -> Self {
        self.content_type = parse(media_type);
        self
    }

    /// Sets the default `accept`.
    #[must_use]
    pub fn with_accept(mut self, media_type: &str) -> Self {
        self.accept = parse(media_type);
        self
    }
}

fn parse(media_type: &str) -> Option<HeaderValue> {
    match HeaderValue::from_str(media_type) {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(media_type, "Ignoring invalid default media type");
            None
        }
    }
}

fn fill(request: Request, name: HeaderName, default: Option<&HeaderValue>) -> Request {
    match default {
        Some(value) if !request.headers().contains_key(&name) => {
            request.with_header(name, value.clone())
        }
        _ => request,
    }
}

impl Middleware for DefaultContentTypeMiddleware {
    fn name(&self) -> &'static str {
        "default_content_type"
    }

    fn process(&self, request: Request, next: &dyn Handler) -> CaricaResult<Response> {
        let request = fill(request, CONTENT_TYPE, self.content_type.as_ref());
        let request = fill(request, ACCEPT, self.accept.as_ref());
        next.handle(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::testing::{request, Capture};
    use http::Method;

    fn run(stage: &DefaultContentTypeMiddleware, request: Request) -> Request {
        let capture = Capture::new();
        stage.process(request, &capture.handler()).unwrap();
        capture.request().unwrap()
    }

    #[test]
    fn test_no_defaults_leaves_headers_absent() {
        let seen = run(&DefaultContentTypeMiddleware::new(), request(Method::GET, "/foo"));
        assert_eq!(seen.header_line(CONTENT_TYPE), "");
        assert_eq!(seen.header_line(ACCEPT), "");
    }

    #[test]
    fn test_only_content_type() {
        let stage = DefaultContentTypeMiddleware::new().with_content_type("application/json");
        let seen = run(&stage, request(Method::GET, "/foo"));
        assert_eq!(seen.header_line(CONTENT_TYPE), "application/json");
        assert_eq!(seen.header_line(ACCEPT), "");
    }

    #[test]
    fn test_only_accept() {
        let stage = DefaultContentTypeMiddleware::new().with_accept("application/json");
        let seen = run(&stage, request(Method::GET, "/foo"));
        assert_eq!(seen.header_line(CONTENT_TYPE), "");
        assert_eq!(seen.header_line(ACCEPT), "application/json");
    }

    #[test]
    fn test_client_headers_are_kept() {
        let stage = DefaultContentTypeMiddleware::json_like("application/json");
        let sent = request(Method::POST, "/foo").with_header(
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );
        let seen = run(&stage, sent);
        assert_eq!(seen.header_line(CONTENT_TYPE), "application/x-www-form-urlencoded");
        assert_eq!(seen.header_line(ACCEPT), "application/json");
    }
}
