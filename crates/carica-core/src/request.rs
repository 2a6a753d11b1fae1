//! The request abstraction threaded through the pipeline.
//!
//! A [`Request`] wraps the HTTP message parts together with the state that
//! stages attach while resolving it: the route outcome, a parsed body,
//! request attributes, and the uploaded-file tree. Mutators consume the
//! request and return the updated one, so each stage hands a new value
//! to the next.
//!
//! # Example
//!
//! ```
//! use bytes::Bytes;
//! use carica_core::{Request, Value};
//!
//! let http = http::Request::builder()
//!     .method("GET")
//!     .uri("/points?x=3")
//!     .body(Bytes::new())
//!     .unwrap();
//!
//! let request = Request::from(http).with_attribute("tenant", "acme");
//! assert_eq!(request.path(), "/points");
//! assert_eq!(request.query_params().get("x"), Some(&Value::from("3")));
//! assert_eq!(request.attribute("tenant"), Some(&Value::from("acme")));
//! ```

use crate::route::{Arguments, RouteOutcome};
use crate::upload::UploadedFileTree;
use crate::value::Value;
use bytes::Bytes;
use http::header::AsHeaderName;
use http::{HeaderMap, HeaderName, HeaderValue, Method, Uri};
use std::collections::HashMap;

/// An HTTP request plus the state accumulated by pipeline stages.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    parsed_body: Option<Value>,
    attributes: HashMap<String, Value>,
    uploaded_files: UploadedFileTree,
    route_outcome: Option<RouteOutcome>,
}

impl Request {
    /// Creates a request with no headers and an empty body.
    #[must_use]
    pub fn new(method: Method, uri: Uri) -> Self {
        Self {
            method,
            uri,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            parsed_body: None,
            attributes: HashMap::new(),
            uploaded_files: UploadedFileTree::new(),
            route_outcome: None,
        }
    }

    /// Returns the request method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request URI.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Returns the URI path.
    #[must_use]
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Returns the decoded query string parameters.
    ///
    /// Values are strings; a key given twice keeps its last value. Keys in
    /// bracket form (`tags[]=a&tags[]=b`) collect their values, in order,
    /// into a list under the bare name. A query string that cannot be
    /// decoded yields no parameters.
    #[must_use]
    pub fn query_params(&self) -> Arguments {
        let Some(query) = self.uri.query() else {
            return Arguments::new();
        };
        let pairs = match serde_urlencoded::from_str::<Vec<(String, String)>>(query) {
            Ok(pairs) => pairs,
            Err(error) => {
                tracing::debug!(error = %error, query, "Ignoring undecodable query string");
                return Arguments::new();
            }
        };

        let mut params = Arguments::new();
        for (key, value) in pairs {
            let value = Value::String(value);
            match key.strip_suffix("[]") {
                Some(name) => match params.get_mut(name) {
                    Some(Value::List(items)) => items.push(value),
                    _ => {
                        params.insert(name.to_string(), Value::List(vec![value]));
                    }
                },
                None => {
                    params.insert(key, value);
                }
            }
        }
        params
    }

    /// Returns the request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns all values of a header joined with `", "`.
    ///
    /// Missing headers and values that are not visible ASCII produce an
    /// empty string.
    #[must_use]
    pub fn header_line<K: AsHeaderName>(&self, name: K) -> String {
        self.headers
            .get_all(name)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Returns the raw body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the body as decoded by an earlier stage, if any.
    #[must_use]
    pub fn parsed_body(&self) -> Option<&Value> {
        self.parsed_body.as_ref()
    }

    /// Returns a request attribute.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Returns all request attributes.
    #[must_use]
    pub fn attributes(&self) -> &HashMap<String, Value> {
        &self.attributes
    }

    /// Returns the uploaded-file tree.
    #[must_use]
    pub fn uploaded_files(&self) -> &UploadedFileTree {
        &self.uploaded_files
    }

    /// Returns the route outcome attached by the routing stage.
    #[must_use]
    pub fn route_outcome(&self) -> Option<&RouteOutcome> {
        self.route_outcome.as_ref()
    }

    /// Replaces the method.
    #[must_use]
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Sets a header, replacing existing values.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Replaces the raw body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Attaches a decoded body.
    #[must_use]
    pub fn with_parsed_body(mut self, body: impl Into<Value>) -> Self {
        self.parsed_body = Some(body.into());
        self
    }

    /// Sets a request attribute.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Replaces the uploaded-file tree.
    #[must_use]
    pub fn with_uploaded_files(mut self, files: UploadedFileTree) -> Self {
        self.uploaded_files = files;
        self
    }

    /// Attaches a route outcome, replacing any previous one.
    #[must_use]
    pub fn with_route_outcome(mut self, outcome: RouteOutcome) -> Self {
        self.route_outcome = Some(outcome);
        self
    }
}

impl From<http::Request<Bytes>> for Request {
    fn from(request: http::Request<Bytes>) -> Self {
        let (parts, body) = request.into_parts();
        Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body,
            parsed_body: None,
            attributes: HashMap::new(),
            uploaded_files: UploadedFileTree::new(),
            route_outcome: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header;

    fn request(uri: &str) -> Request {
        Request::from(
            http::Request::builder()
                .uri(uri)
                .header(header::ACCEPT, "text/html")
                .header(header::ACCEPT, "application/json")
                .body(Bytes::from_static(b"payload"))
                .unwrap(),
        )
    }

    #[test]
    fn test_from_http_keeps_parts() {
        let request = request("/things/1");
        assert_eq!(request.method(), Method::GET);
        assert_eq!(request.path(), "/things/1");
        assert_eq!(request.body(), &Bytes::from_static(b"payload"));
        assert!(request.parsed_body().is_none());
        assert!(request.route_outcome().is_none());
    }

    #[test]
    fn test_header_line_joins_values() {
        let request = request("/");
        assert_eq!(request.header_line(header::ACCEPT), "text/html, application/json");
        assert_eq!(request.header_line("x-missing"), "");
    }

    #[test]
    fn test_query_params_last_value_wins() {
        let request = request("/search?q=first&page=2&q=second&name=a%20b");
        let params = request.query_params();
        assert_eq!(params.get("q"), Some(&Value::from("second")));
        assert_eq!(params.get("page"), Some(&Value::from("2")));
        assert_eq!(params.get("name"), Some(&Value::from("a b")));
    }

    #[test]
    fn test_query_params_collect_bracket_keys() {
        let request = request("/search?tags%5B%5D=red&q=x&tags%5B%5D=blue&ids%5B%5D=1");
        let params = request.query_params();
        assert_eq!(
            params.get("tags"),
            Some(&Value::List(vec![Value::from("red"), Value::from("blue")]))
        );
        assert_eq!(params.get("ids"), Some(&Value::List(vec![Value::from("1")])));
        assert_eq!(params.get("q"), Some(&Value::from("x")));
        assert!(!params.contains_key("tags[]"));
    }

    #[test]
    fn test_query_params_empty_without_query() {
        assert!(request("/search").query_params().is_empty());
    }

    #[test]
    fn test_mutators_return_updated_copy() {
        let original = request("/");
        let updated = original
            .clone()
            .with_attribute("user", "alice")
            .with_parsed_body(Value::from(3))
            .with_route_outcome(RouteOutcome::NotFound);

        assert!(original.attribute("user").is_none());
        assert_eq!(updated.attribute("user"), Some(&Value::from("alice")));
        assert_eq!(updated.parsed_body(), Some(&Value::Int(3)));
        assert_eq!(updated.route_outcome(), Some(&RouteOutcome::NotFound));
    }
}
