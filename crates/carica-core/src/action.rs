//! Actions: the application functions a route ultimately invokes.
//!
//! An action exposes a stable [`ActionId`], an [`ActionDeclaration`]
//! describing its parameters, and a `call` entry point receiving the
//! assembled [`CallArguments`].
//!
//! # Example
//!
//! ```
//! use carica_core::{
//!     ActionDeclaration, ActionOutput, ActionRef, CallArguments, DeclaredType,
//!     ParameterDeclaration, Value,
//! };
//!
//! let greet = ActionRef::from_fn(
//!     "greet",
//!     ActionDeclaration::new()
//!         .parameter(ParameterDeclaration::new("name", DeclaredType::string())),
//!     |args: CallArguments| {
//!         let name = args.get_str("name")?;
//!         Ok(ActionOutput::from(Value::from(format!("Hello, {name}"))))
//!     },
//! );
//!
//! assert_eq!(greet.id().as_str(), "greet");
//! assert_eq!(greet.declaration().parameters().len(), 1);
//! ```

use crate::metadata::SecurityMarker;
use crate::request::Request;
use crate::response::Response;
use crate::route::Arguments;
use crate::types::DeclaredType;
use crate::upload::UploadedFile;
use crate::value::{Object, Typed, Value};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Stable identity of an action; the key for metadata caching.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActionId(Cow<'static, str>);

impl ActionId {
    /// Creates an id from a static string.
    #[must_use]
    pub const fn from_static(id: &'static str) -> Self {
        Self(Cow::Borrowed(id))
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for ActionId {
    fn from(id: &'static str) -> Self {
        Self::from_static(id)
    }
}

impl From<String> for ActionId {
    fn from(id: String) -> Self {
        Self(Cow::Owned(id))
    }
}

/// A per-parameter marker describing where the argument comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterMarker {
    /// The parameter receives the parsed request body.
    ParsedBody,
    /// The parameter receives a request attribute.
    RequestAttribute {
        /// Attribute key; the parameter name when absent.
        key: Option<String>,
    },
    /// The parameter receives an uploaded file.
    UploadedFile {
        /// Path into the upload tree; `[parameter name]` when absent.
        path: Option<Vec<String>>,
    },
}

/// One declared parameter of an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterDeclaration {
    name: String,
    declared_type: DeclaredType,
    markers: Vec<ParameterMarker>,
}

impl ParameterDeclaration {
    /// Declares a parameter of the given type.
    #[must_use]
    pub fn new(name: impl Into<String>, declared_type: DeclaredType) -> Self {
        Self {
            name: name.into(),
            declared_type,
            markers: Vec::new(),
        }
    }

    /// Declares a parameter without a type.
    #[must_use]
    pub fn untyped(name: impl Into<String>) -> Self {
        Self::new(name, DeclaredType::mixed())
    }

    /// Marks the parameter as receiving the parsed body.
    #[must_use]
    pub fn parsed_body(mut self) -> Self {
        self.markers.push(ParameterMarker::ParsedBody);
        self
    }

    /// Marks the parameter as receiving the attribute of the same name.
    #[must_use]
    pub fn request_attribute(mut self) -> Self {
        self.markers.push(ParameterMarker::RequestAttribute { key: None });
        self
    }

    /// Marks the parameter as receiving the attribute stored under `key`.
    #[must_use]
    pub fn request_attribute_named(mut self, key: impl Into<String>) -> Self {
        self.markers.push(ParameterMarker::RequestAttribute {
            key: Some(key.into()),
        });
        self
    }

    /// Marks the parameter as receiving the upload field of the same name.
    #[must_use]
    pub fn uploaded_file(mut self) -> Self {
        self.markers.push(ParameterMarker::UploadedFile { path: None });
        self
    }

    /// Marks the parameter as receiving the upload at a nested `path`.
    #[must_use]
    pub fn uploaded_file_at<I, S>(mut self, path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.markers.push(ParameterMarker::UploadedFile {
            path: Some(path.into_iter().map(Into::into).collect()),
        });
        self
    }

    /// Returns the parameter name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared type.
    #[must_use]
    pub const fn declared_type(&self) -> &DeclaredType {
        &self.declared_type
    }

    /// Returns the markers in declaration order.
    #[must_use]
    pub fn markers(&self) -> &[ParameterMarker] {
        &self.markers
    }
}

/// Everything an action declares about itself.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionDeclaration {
    parameters: Vec<ParameterDeclaration>,
    middleware: Vec<String>,
    authentication: Option<SecurityMarker>,
    authorization: Option<SecurityMarker>,
}

impl ActionDeclaration {
    /// Creates an empty declaration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a parameter.
    #[must_use]
    pub fn parameter(mut self, parameter: ParameterDeclaration) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Appends a named middleware to run ahead of the action.
    #[must_use]
    pub fn middleware(mut self, name: impl Into<String>) -> Self {
        self.middleware.push(name.into());
        self
    }

    /// Attaches an authentication marker.
    #[must_use]
    pub fn authenticated_by(mut self, marker: SecurityMarker) -> Self {
        self.authentication = Some(marker);
        self
    }

    /// Attaches an authorization marker.
    #[must_use]
    pub fn authorized_by(mut self, marker: SecurityMarker) -> Self {
        self.authorization = Some(marker);
        self
    }

    /// Returns the parameters in declaration order.
    #[must_use]
    pub fn parameters(&self) -> &[ParameterDeclaration] {
        &self.parameters
    }

    /// Returns the declared middleware names in order.
    #[must_use]
    pub fn additional_middleware(&self) -> &[String] {
        &self.middleware
    }

    /// Returns the authentication marker.
    #[must_use]
    pub const fn authentication(&self) -> Option<&SecurityMarker> {
        self.authentication.as_ref()
    }

    /// Returns the authorization marker.
    #[must_use]
    pub const fn authorization(&self) -> Option<&SecurityMarker> {
        self.authorization.as_ref()
    }
}

/// What an action returns: a finished response or a value to render.
#[derive(Debug)]
pub enum ActionOutput {
    /// Sent as is.
    Response(Response),
    /// Handed to the result renderer.
    Value(Value),
}

impl ActionOutput {
    /// Wraps an application object for rendering.
    pub fn object<T: Typed>(value: T) -> Self {
        Self::Value(Value::Object(Object::new(value)))
    }
}

impl From<Response> for ActionOutput {
    fn from(response: Response) -> Self {
        Self::Response(response)
    }
}

impl From<Value> for ActionOutput {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<serde_json::Value> for ActionOutput {
    fn from(document: serde_json::Value) -> Self {
        Self::Value(Value::from(document))
    }
}

/// An application action.
pub trait Action: Send + Sync {
    /// Returns the stable identity of the action.
    fn id(&self) -> &ActionId;

    /// Returns the declaration introspection reads.
    fn declaration(&self) -> &ActionDeclaration;

    /// Invokes the action.
    fn call(&self, arguments: CallArguments) -> anyhow::Result<ActionOutput>;
}

/// An action backed by a closure.
pub struct FnAction<F> {
    id: ActionId,
    declaration: ActionDeclaration,
    func: F,
}

impl<F> FnAction<F>
where
    F: Fn(CallArguments) -> anyhow::Result<ActionOutput> + Send + Sync,
{
    /// Creates a closure-backed action.
    pub fn new(id: impl Into<ActionId>, declaration: ActionDeclaration, func: F) -> Self {
        Self {
            id: id.into(),
            declaration,
            func,
        }
    }
}

impl<F> Action for FnAction<F>
where
    F: Fn(CallArguments) -> anyhow::Result<ActionOutput> + Send + Sync,
{
    fn id(&self) -> &ActionId {
        &self.id
    }

    fn declaration(&self) -> &ActionDeclaration {
        &self.declaration
    }

    fn call(&self, arguments: CallArguments) -> anyhow::Result<ActionOutput> {
        (self.func)(arguments)
    }
}

/// A shared reference to an action; equality is by [`ActionId`].
#[derive(Clone)]
pub struct ActionRef(Arc<dyn Action>);

impl ActionRef {
    /// Wraps an action.
    pub fn new<A: Action + 'static>(action: A) -> Self {
        Self(Arc::new(action))
    }

    /// Wraps a closure as an action.
    pub fn from_fn<F>(id: impl Into<ActionId>, declaration: ActionDeclaration, func: F) -> Self
    where
        F: Fn(CallArguments) -> anyhow::Result<ActionOutput> + Send + Sync + 'static,
    {
        Self::new(FnAction::new(id, declaration, func))
    }

    /// Returns the action id.
    #[must_use]
    pub fn id(&self) -> &ActionId {
        self.0.id()
    }

    /// Returns the action declaration.
    #[must_use]
    pub fn declaration(&self) -> &ActionDeclaration {
        self.0.declaration()
    }

    /// Invokes the action.
    pub fn call(&self, arguments: CallArguments) -> anyhow::Result<ActionOutput> {
        self.0.call(arguments)
    }

    /// Returns true if both refer to the same action instance.
    ///
    /// Unlike `==`, this tells apart distinct actions sharing an id.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl From<Arc<dyn Action>> for ActionRef {
    fn from(action: Arc<dyn Action>) -> Self {
        Self(action)
    }
}

impl PartialEq for ActionRef {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl fmt::Debug for ActionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ActionRef").field(self.id()).finish()
    }
}

/// Errors raised by the typed argument getters.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ArgumentError {
    /// No argument was supplied under the name.
    #[error("argument `{name}` was not supplied")]
    Missing {
        /// Parameter name.
        name: String,
    },
    /// The argument has a different type.
    #[error("argument `{name}` is a {actual}, not a {expected}")]
    Mismatch {
        /// Parameter name.
        name: String,
        /// Requested type.
        expected: String,
        /// Runtime type supplied.
        actual: String,
    },
}

/// The final arguments an action is called with.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallArguments {
    values: Arguments,
}

impl CallArguments {
    /// Wraps assembled arguments.
    #[must_use]
    pub const fn new(values: Arguments) -> Self {
        Self { values }
    }

    /// Returns the argument, if supplied.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Returns true if an argument was supplied under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Returns the argument or a `Missing` error.
    pub fn require(&self, name: &str) -> Result<&Value, ArgumentError> {
        self.values.get(name).ok_or_else(|| ArgumentError::Missing {
            name: name.to_string(),
        })
    }

    /// Returns a string argument.
    pub fn get_str(&self, name: &str) -> Result<&str, ArgumentError> {
        let value = self.require(name)?;
        value.as_str().ok_or_else(|| mismatch(name, "string", value))
    }

    /// Returns an integer argument.
    pub fn get_int(&self, name: &str) -> Result<i64, ArgumentError> {
        let value = self.require(name)?;
        value.as_i64().ok_or_else(|| mismatch(name, "int", value))
    }

    /// Returns a float argument; integers are widened.
    pub fn get_float(&self, name: &str) -> Result<f64, ArgumentError> {
        let value = self.require(name)?;
        value.as_f64().ok_or_else(|| mismatch(name, "float", value))
    }

    /// Returns a boolean argument.
    pub fn get_bool(&self, name: &str) -> Result<bool, ArgumentError> {
        let value = self.require(name)?;
        value.as_bool().ok_or_else(|| mismatch(name, "bool", value))
    }

    /// Returns an application object argument.
    pub fn get_object<T: Typed>(&self, name: &str) -> Result<&T, ArgumentError> {
        let value = self.require(name)?;
        value
            .as_object()
            .and_then(Object::downcast_ref::<T>)
            .ok_or_else(|| mismatch(name, T::TYPE_NAME, value))
    }

    /// Returns the request argument.
    pub fn get_request(&self, name: &str) -> Result<&Request, ArgumentError> {
        let value = self.require(name)?;
        value.as_request().ok_or_else(|| mismatch(name, "request", value))
    }

    /// Returns an uploaded file argument; `None` when it resolved to null.
    pub fn get_file(&self, name: &str) -> Result<Option<&UploadedFile>, ArgumentError> {
        match self.require(name)? {
            Value::Null => Ok(None),
            Value::File(file) => Ok(Some(file)),
            other => Err(mismatch(name, "uploaded_file", other)),
        }
    }

    /// Returns the number of arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if there are no arguments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over argument names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Returns the underlying map.
    #[must_use]
    pub fn into_inner(self) -> Arguments {
        self.values
    }
}

fn mismatch(name: &str, expected: &str, actual: &Value) -> ArgumentError {
    ArgumentError::Mismatch {
        name: name.to_string(),
        expected: expected.to_string(),
        actual: actual.debug_type().to_string(),
    }
}
