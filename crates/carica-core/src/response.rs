//! Response type and the builder stages use to create responses.

use bytes::Bytes;
use http::header::{self, HeaderValue};
use http::StatusCode;

/// The response type produced by every handler.
pub type Response = http::Response<Bytes>;

/// Factory for the responses pipeline stages produce.
///
/// Stages receive a builder instead of constructing responses directly so
/// applications can keep response creation in one place.
///
/// # Example
///
/// ```
/// use carica_core::ResponseBuilder;
/// use http::StatusCode;
///
/// let responses = ResponseBuilder::new();
/// let response = responses.method_not_allowed(["get", "post"]);
///
/// assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
/// assert_eq!(response.headers()["allow"], "GET, POST");
/// assert!(response.body().is_empty());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseBuilder;

impl ResponseBuilder {
    /// Creates a response builder.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Creates a response with the given status and body.
    #[must_use]
    pub fn create(&self, status: StatusCode, body: impl Into<Bytes>) -> Response {
        let mut response = Response::new(body.into());
        *response.status_mut() = status;
        response
    }

    /// 200 with an optional content type.
    #[must_use]
    pub fn ok(&self, body: impl Into<Bytes>, content_type: Option<&str>) -> Response {
        with_content_type(self.create(StatusCode::OK, body), content_type)
    }

    /// 404 with an optional content type.
    #[must_use]
    pub fn not_found(&self, body: impl Into<Bytes>, content_type: Option<&str>) -> Response {
        with_content_type(self.create(StatusCode::NOT_FOUND, body), content_type)
    }

    /// 400 with an optional content type.
    #[must_use]
    pub fn bad_request(&self, body: impl Into<Bytes>, content_type: Option<&str>) -> Response {
        with_content_type(self.create(StatusCode::BAD_REQUEST, body), content_type)
    }

    /// 405 with an `Allow` header and an empty body.
    #[must_use]
    pub fn method_not_allowed<I, S>(&self, allowed: I) -> Response
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        with_allow(self.create(StatusCode::METHOD_NOT_ALLOWED, Bytes::new()), allowed)
    }

    /// 204 with an empty body.
    #[must_use]
    pub fn no_content(&self) -> Response {
        self.create(StatusCode::NO_CONTENT, Bytes::new())
    }

    /// 500 with the given body.
    #[must_use]
    pub fn internal_server_error(&self, body: impl Into<Bytes>) -> Response {
        self.create(StatusCode::INTERNAL_SERVER_ERROR, body)
    }
}

/// Sets the `Allow` header to the upper-cased methods joined with `", "`.
#[must_use]
pub fn with_allow<I, S>(mut response: Response, allowed: I) -> Response
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let line = allowed
        .into_iter()
        .map(|method| method.as_ref().to_ascii_uppercase())
        .collect::<Vec<_>>()
        .join(", ");
    match HeaderValue::from_str(&line) {
        Ok(value) => {
            response.headers_mut().insert(header::ALLOW, value);
        }
        Err(_) => tracing::warn!(allow = %line, "Allowed methods do not form a valid header"),
    }
    response
}

fn with_content_type(mut response: Response, content_type: Option<&str>) -> Response {
    if let Some(content_type) = content_type {
        match HeaderValue::from_str(content_type) {
            Ok(value) => {
                response.headers_mut().insert(header::CONTENT_TYPE, value);
            }
            Err(_) => tracing::warn!(content_type, "Ignoring invalid content type"),
        }
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_sets_content_type() {
        let response = ResponseBuilder::new().ok("{}", Some("application/json"));
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        assert_eq!(response.body(), &Bytes::from_static(b"{}"));
    }

    #[test]
    fn test_not_found_without_content_type() {
        let response = ResponseBuilder::new().not_found(Bytes::new(), None);
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().get(header::CONTENT_TYPE).is_none());
        assert!(response.body().is_empty());
    }

    #[test]
    fn test_allow_header_is_upper_cased() {
        let response = with_allow(ResponseBuilder::new().no_content(), ["get", "Put"]);
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(response.headers()[header::ALLOW], "GET, PUT");
    }

    #[test]
    fn test_invalid_content_type_is_skipped() {
        let response = ResponseBuilder::new().bad_request("oops", Some("text/plain\n"));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response.headers().get(header::CONTENT_TYPE).is_none());
    }
}
