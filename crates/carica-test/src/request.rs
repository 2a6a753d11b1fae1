//! Building pipeline requests for tests.

use crate::error::TestError;
use bytes::Bytes;
use carica_core::{Request, UploadedFile, UploadedFileTree, Value};
use http::header::{ACCEPT, CONTENT_TYPE};
use http::{HeaderMap, HeaderName, HeaderValue, Method, Uri};
use serde::Serialize;

/// Fluent builder for a [`Request`].
///
/// Invalid input does not panic: the first problem is kept and reported by
/// [`build`](Self::build).
///
/// ```
/// use carica_test::TestRequestBuilder;
/// use http::Method;
///
/// let request = TestRequestBuilder::new(Method::POST, "/points?dry_run=1")
///     .json(&serde_json::json!({"x": 3, "y": 5}))
///     .attribute("user", "ada")
///     .build()
///     .unwrap();
/// assert_eq!(request.path(), "/points");
/// assert_eq!(request.header_line("content-type"), "application/json");
/// ```
#[must_use]
#[derive(Debug)]
pub struct TestRequestBuilder {
    method: Method,
    uri: String,
    headers: HeaderMap,
    body: Bytes,
    parsed_body: Option<Value>,
    attributes: Vec<(String, Value)>,
    files: UploadedFileTree,
    error: Option<TestError>,
}

impl TestRequestBuilder {
    /// Starts a request for `method` and `uri`.
    pub fn new(method: Method, uri: impl AsRef<str>) -> Self {
        Self {
            method,
            uri: uri.as_ref().to_string(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
            parsed_body: None,
            attributes: Vec::new(),
            files: UploadedFileTree::new(),
            error: None,
        }
    }

    fn fail(mut self, error: TestError) -> Self {
        self.error.get_or_insert(error);
        self
    }

    /// Sets a header, replacing any previous value.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        let name = match HeaderName::try_from(name.as_ref()) {
            Ok(name) => name,
            Err(e) => return self.fail(TestError::InvalidHeader(e.to_string())),
        };
        match HeaderValue::try_from(value.as_ref()) {
            Ok(value) => {
                self.headers.insert(name, value);
                self
            }
            Err(e) => self.fail(TestError::InvalidHeader(format!("{name}: {e}"))),
        }
    }

    /// Sets the `content-type` header.
    pub fn content_type(self, media_type: impl AsRef<str>) -> Self {
        self.header(CONTENT_TYPE.as_str(), media_type)
    }

    /// Sets the `accept` header.
    pub fn accept(self, media_type: impl AsRef<str>) -> Self {
        self.header(ACCEPT.as_str(), media_type)
    }

    /// Sets the raw body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Sets a JSON body and `content-type: application/json`.
    pub fn json<T: Serialize>(self, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(bytes) => self.content_type("application/json").body(bytes),
            Err(e) => self.fail(e.into()),
        }
    }

    /// Sets a url-encoded body and its `content-type`.
    pub fn form<T: Serialize>(self, value: &T) -> Self {
        match serde_urlencoded::to_string(value) {
            Ok(encoded) => self
                .content_type("application/x-www-form-urlencoded")
                .body(encoded),
            Err(e) => self.fail(e.into()),
        }
    }

    /// Attaches a body the server has already decoded.
    pub fn parsed_body(mut self, value: impl Into<Value>) -> Self {
        self.parsed_body = Some(value.into());
        self
    }

    /// Sets a request attribute.
    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    /// Adds an uploaded file under the nested field `path`.
    pub fn file<S: AsRef<str>>(mut self, path: &[S], file: UploadedFile) -> Self {
        self.files.insert(path, file);
        self
    }

    /// Builds the request.
    ///
    /// # Errors
    ///
    /// Returns the first problem recorded while building, or
    /// [`TestError::InvalidUri`].
    pub fn build(self) -> Result<Request, TestError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        let uri: Uri = self.uri.parse().map_err(|e: http::uri::InvalidUri| TestError::InvalidUri {
            uri: self.uri.clone(),
            reason: e.to_string(),
        })?;

        let mut request = Request::new(self.method, uri)
            .with_body(self.body)
            .with_uploaded_files(self.files);
        for (name, value) in self.headers {
            if let Some(name) = name {
                request = request.with_header(name, value);
            }
        }
        if let Some(parsed) = self.parsed_body {
            request = request.with_parsed_body(parsed);
        }
        for (name, value) in self.attributes {
            request = request.with_attribute(name, value);
        }
        Ok(request)
    }
}
