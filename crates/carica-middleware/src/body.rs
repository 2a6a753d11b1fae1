//! Request body parsing.
//!
//! The parsed-body stage picks the first registered [`BodyParser`] that
//! accepts the request's content type and the declared type of the body
//! parameter. [`SerdeBodyParser`] is the default: JSON and form bodies
//! decoded with serde into types registered in the [`TypeCatalog`].

use bytes::Bytes;
use carica_core::{OrderedRegistry, TypeCatalog, TypeName, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// Pseudo content type used when the body has already been decoded into a
/// generic container and only needs converting into the declared type.
pub const GENERIC_MAP_CONTENT_TYPE: &str = "application/vnd.carica.generic-map";

/// The body handed to a parser.
#[derive(Debug, Clone, Copy)]
pub enum BodyInput<'a> {
    /// The raw request body.
    Raw(&'a Bytes),
    /// A body already decoded into a list or map.
    Container(&'a Value),
}

/// A body that could not be parsed; the message is sent to the client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct BodyParserError {
    message: String,
}

impl BodyParserError {
    /// Creates an error with a client-facing message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The client-facing message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Result of running a parser.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    /// The body was decoded; it replaces the request's parsed body.
    Parsed(Value),
    /// The body is malformed.
    Error(BodyParserError),
    /// The parser declined; the request is left as is.
    Unchanged,
}

/// Decodes request bodies into declared parameter types.
pub trait BodyParser: Send + Sync {
    /// Returns true if this parser handles `content_type` for `target`.
    fn can_parse(&self, content_type: &str, target: &TypeName) -> bool;

    /// Parses the body into `target`.
    fn parse(&self, content_type: &str, body: BodyInput<'_>, target: &TypeName) -> ParseOutcome;
}

/// Parsers in registration order; the first that accepts a request runs.
pub type BodyParsers = OrderedRegistry<Arc<dyn BodyParser>>;

/// Wire formats [`SerdeBodyParser`] understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Form,
    GenericMap,
}

impl Format {
    fn from_content_type(content_type: &str) -> Option<Self> {
        match media_type(content_type).as_str() {
            "application/json" => Some(Self::Json),
            "application/x-www-form-urlencoded" => Some(Self::Form),
            GENERIC_MAP_CONTENT_TYPE => Some(Self::GenericMap),
            _ => None,
        }
    }
}

/// Returns the lower-cased media type without parameters.
fn media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Decodes JSON, form and generic-map bodies with serde.
///
/// Targets are either application types the catalog can decode, or the
/// generic `array` container.
///
/// # Example
///
/// ```
/// use bytes::Bytes;
/// use carica_core::{TypeCatalog, TypeName, Value};
/// use carica_middleware::{BodyInput, BodyParser, ParseOutcome, SerdeBodyParser};
/// use std::sync::Arc;
///
/// let parser = SerdeBodyParser::new(Arc::new(TypeCatalog::new()));
/// let body = Bytes::from_static(br#"{"tags": ["a", "b"]}"#);
///
/// assert!(parser.can_parse("application/json; charset=utf-8", &TypeName::ARRAY));
/// let ParseOutcome::Parsed(value) =
///     parser.parse("application/json", BodyInput::Raw(&body), &TypeName::ARRAY)
/// else {
///     panic!("expected a parsed body");
/// };
/// assert!(value.as_map().unwrap().contains_key("tags"));
/// ```
#[derive(Debug, Clone)]
pub struct SerdeBodyParser {
    catalog: Arc<TypeCatalog>,
}

impl SerdeBodyParser {
    /// Creates a parser decoding into the catalog's types.
    pub fn new(catalog: Arc<TypeCatalog>) -> Self {
        Self { catalog }
    }

    fn decode_document(&self, document: serde_json::Value, target: &TypeName) -> ParseOutcome {
        if target.is_container() {
            return ParseOutcome::Parsed(Value::from(document));
        }
        match self.catalog.decode(target, document) {
            Some(Ok(object)) => ParseOutcome::Parsed(Value::Object(object)),
            Some(Err(error)) => ParseOutcome::Error(describe(&error.to_string())),
            None => ParseOutcome::Unchanged,
        }
    }

    fn decode_form(&self, body: &Bytes, target: &TypeName) -> ParseOutcome {
        if target.is_container() {
            return match serde_urlencoded::from_bytes::<Vec<(String, String)>>(body) {
                Ok(pairs) => {
                    let map: BTreeMap<String, Value> = pairs
                        .into_iter()
                        .map(|(key, value)| (key, Value::String(value)))
                        .collect();
                    ParseOutcome::Parsed(Value::Map(map))
                }
                Err(error) => ParseOutcome::Error(describe(&error.to_string())),
            };
        }
        match self.catalog.decode_form(target, body) {
            Some(Ok(object)) => ParseOutcome::Parsed(Value::Object(object)),
            Some(Err(error)) => ParseOutcome::Error(describe(&error.to_string())),
            None => ParseOutcome::Unchanged,
        }
    }
}

impl BodyParser for SerdeBodyParser {
    fn can_parse(&self, content_type: &str, target: &TypeName) -> bool {
        Format::from_content_type(content_type).is_some()
            && (target.is_container() || self.catalog.can_decode(target))
    }

    fn parse(&self, content_type: &str, body: BodyInput<'_>, target: &TypeName) -> ParseOutcome {
        let Some(format) = Format::from_content_type(content_type) else {
            return ParseOutcome::Unchanged;
        };
        match (format, body) {
            (_, BodyInput::Container(value)) => match value.to_json() {
                Ok(document) => self.decode_document(document, target),
                Err(error) => ParseOutcome::Error(describe(&error.to_string())),
            },
            (Format::Form, BodyInput::Raw(bytes)) => self.decode_form(bytes, target),
            (Format::Json | Format::GenericMap, BodyInput::Raw(bytes)) => {
                match serde_json::from_slice::<serde_json::Value>(bytes) {
                    Ok(document) => self.decode_document(document, target),
                    Err(error) => ParseOutcome::Error(BodyParserError::new(format!(
                        "The request body is not valid JSON: {error}"
                    ))),
                }
            }
        }
    }
}

/// Turns a serde message into a client-facing one.
fn describe(message: &str) -> BodyParserError {
    if let Some(field) = message
        .strip_prefix("missing field `")
        .and_then(|rest| rest.split('`').next())
    {
        return BodyParserError::new(format!("The {field} property is required."));
    }
    BodyParserError::new(format!("The request body is invalid: {message}"))
}
