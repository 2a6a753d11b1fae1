//! In-memory client over any pipeline handler.

use crate::error::TestError;
use crate::request::TestRequestBuilder;
use crate::response::TestResponse;
use carica_core::{Request, UploadedFile, Value};
use carica_middleware::Handler;
use http::Method;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Sends requests straight into a [`Handler`], usually a
/// [`StackKernel`](carica_middleware::StackKernel).
///
/// ```
/// use carica_core::{CaricaResult, Request, Response, ResponseBuilder};
/// use carica_middleware::FnHandler;
/// use carica_test::TestClient;
/// use http::StatusCode;
///
/// let client = TestClient::new(FnHandler::new(|request: Request| -> CaricaResult<Response> {
///     Ok(ResponseBuilder::new().ok(request.path().to_string(), Some("text/plain")))
/// }));
///
/// let response = client.get("/ping").send().unwrap();
/// response.assert_status(StatusCode::OK).assert_body("/ping");
/// ```
#[must_use]
#[derive(Clone)]
pub struct TestClient {
    handler: Arc<dyn Handler>,
    default_headers: Vec<(String, String)>,
}

impl TestClient {
    /// Wraps `handler`.
    pub fn new(handler: impl Handler + 'static) -> Self {
        Self::from_arc(Arc::new(handler))
    }

    /// Wraps a shared handler.
    pub fn from_arc(handler: Arc<dyn Handler>) -> Self {
        Self {
            handler,
            default_headers: Vec::new(),
        }
    }

    /// Adds a header sent with every request.
    pub fn with_default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// Starts a GET request.
    pub fn get(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::GET, uri)
    }

    /// Starts a POST request.
    pub fn post(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::POST, uri)
    }

    /// Starts a PUT request.
    pub fn put(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::PUT, uri)
    }

    /// Starts a PATCH request.
    pub fn patch(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::PATCH, uri)
    }

    /// Starts a DELETE request.
    pub fn delete(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::DELETE, uri)
    }

    /// Starts an OPTIONS request.
    pub fn options(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::OPTIONS, uri)
    }

    /// Starts a HEAD request.
    pub fn head(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::HEAD, uri)
    }

    /// Starts a request with any method.
    pub fn request(&self, method: Method, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        let builder = self
            .default_headers
            .iter()
            .fold(TestRequestBuilder::new(method, uri), |builder, (name, value)| {
                builder.header(name, value)
            });
        TestClientRequest {
            client: self,
            builder,
        }
    }

    /// Sends a prepared request.
    ///
    /// # Errors
    ///
    /// Returns [`TestError::Pipeline`] if the handler fails.
    pub fn send(&self, request: Request) -> Result<TestResponse, TestError> {
        Ok(self.handler.handle(request)?.into())
    }
}

impl fmt::Debug for TestClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestClient")
            .field("default_headers", &self.default_headers)
            .finish_non_exhaustive()
    }
}

/// A request being built against a [`TestClient`].
#[must_use]
#[derive(Debug)]
pub struct TestClientRequest<'a> {
    client: &'a TestClient,
    builder: TestRequestBuilder,
}

impl TestClientRequest<'_> {
    fn map(mut self, f: impl FnOnce(TestRequestBuilder) -> TestRequestBuilder) -> Self {
        self.builder = f(self.builder);
        self
    }

    /// Sets a header.
    pub fn header(self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.map(|b| b.header(name, value))
    }

    /// Sets the `content-type` header.
    pub fn content_type(self, media_type: impl AsRef<str>) -> Self {
        self.map(|b| b.content_type(media_type))
    }

    /// Sets the `accept` header.
    pub fn accept(self, media_type: impl AsRef<str>) -> Self {
        self.map(|b| b.accept(media_type))
    }

    /// Sets the raw body.
    pub fn body(self, body: impl Into<bytes::Bytes>) -> Self {
        self.map(|b| b.body(body))
    }

    /// Sets a JSON body.
    pub fn json<T: Serialize>(self, value: &T) -> Self {
        self.map(|b| b.json(value))
    }

    /// Sets a url-encoded body.
    pub fn form<T: Serialize>(self, value: &T) -> Self {
        self.map(|b| b.form(value))
    }

    /// Attaches an already decoded body.
    pub fn parsed_body(self, value: impl Into<Value>) -> Self {
        self.map(|b| b.parsed_body(value))
    }

    /// Sets a request attribute.
    pub fn attribute(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.map(|b| b.attribute(name, value))
    }

    /// Adds an uploaded file.
    pub fn file<S: AsRef<str>>(self, path: &[S], file: UploadedFile) -> Self {
        self.map(|b| b.file(path, file))
    }

    /// Builds and sends the request.
    ///
    /// # Errors
    ///
    /// Fails if the request is malformed or the handler returns an error.
    pub fn send(self) -> Result<TestResponse, TestError> {
        let request = self.builder.build()?;
        self.client.send(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carica_core::{CaricaResult, ConfigurationFault, Response, ResponseBuilder};
    use carica_middleware::FnHandler;
    use http::StatusCode;

    fn echo_headers() -> TestClient {
        TestClient::new(FnHandler::new(|request: Request| -> CaricaResult<Response> {
            let body = format!(
                "{} {} {}",
                request.method(),
                request.header_line("x-tenant"),
                request.header_line("content-type")
            );
            Ok(ResponseBuilder::new().ok(body, Some("text/plain")))
        }))
    }

    #[test]
    fn test_default_headers_and_overrides() {
        let client = echo_headers().with_default_header("x-tenant", "acme");
        client
            .post("/")
            .json(&serde_json::json!({}))
            .send()
            .unwrap()
            .assert_body("POST acme application/json");
        client
            .delete("/")
            .header("x-tenant", "other")
            .send()
            .unwrap()
            .assert_body("DELETE other ");
    }

    #[test]
    fn test_handler_errors_surface() {
        let client = TestClient::new(FnHandler::new(|_: Request| -> CaricaResult<Response> {
            Err(ConfigurationFault::RouteOutcomeMissing { stage: "not_found" }.into())
        }));
        let error = client.get("/").send().unwrap_err();
        assert!(matches!(error, TestError::Pipeline(_)));
    }

    #[test]
    fn test_build_errors_surface() {
        let error = echo_headers()
            .get("/")
            .header("x-bad", "line\nbreak")
            .send()
            .unwrap_err();
        assert!(matches!(error, TestError::InvalidHeader(_)));
    }

    #[test]
    fn test_status_helpers() {
        let response = echo_headers().head("/").send().unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
