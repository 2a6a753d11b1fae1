//! Dynamic argument values.
//!
//! Arguments reach an action through several stages that each contribute
//! values of a different shape: path placeholders and query parameters
//! arrive as strings, coercion turns them into scalars or application
//! objects, and the dispatcher injects uploaded files and the request
//! itself. [`Value`] is the common representation for all of them.

use crate::request::Request;
use crate::types::TypeName;
use crate::upload::UploadedFile;
use serde::ser::Error as _;
use serde::{Serialize, Serializer};
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// An application type that can travel through the pipeline as an [`Object`].
///
/// `TYPE_NAME` is the name actions use to declare parameters of this type
/// and the key under which the type is registered in a
/// [`TypeCatalog`](crate::TypeCatalog).
pub trait Typed: Serialize + Send + Sync + 'static {
    /// The declared type name.
    const TYPE_NAME: &'static str;
}

type ToJson = fn(&(dyn Any + Send + Sync)) -> Result<serde_json::Value, serde_json::Error>;

/// A type-erased instance of a [`Typed`] application type.
#[derive(Clone)]
pub struct Object {
    type_name: TypeName,
    inner: Arc<dyn Any + Send + Sync>,
    to_json: ToJson,
}

impl Object {
    /// Wraps an application value.
    pub fn new<T: Typed>(value: T) -> Self {
        Self {
            type_name: TypeName::from_static(T::TYPE_NAME),
            inner: Arc::new(value),
            to_json: erased_to_json::<T>,
        }
    }

    /// Returns the declared type name of the wrapped value.
    #[must_use]
    pub fn type_name(&self) -> &TypeName {
        &self.type_name
    }

    /// Borrows the wrapped value if it is a `T`.
    #[must_use]
    pub fn downcast_ref<T: Typed>(&self) -> Option<&T> {
        (*self.inner).downcast_ref::<T>()
    }

    /// Returns true if the wrapped value is a `T`.
    #[must_use]
    pub fn is<T: Typed>(&self) -> bool {
        (*self.inner).is::<T>()
    }

    /// Serializes the wrapped value to a JSON document.
    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        (self.to_json)(&*self.inner)
    }
}

fn erased_to_json<T: Typed>(
    inner: &(dyn Any + Send + Sync),
) -> Result<serde_json::Value, serde_json::Error> {
    match inner.downcast_ref::<T>() {
        Some(value) => serde_json::to_value(value),
        None => Err(serde_json::Error::custom(format!(
            "object is not a {}",
            T::TYPE_NAME
        ))),
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        if self.type_name != other.type_name {
            return false;
        }
        if Arc::ptr_eq(&self.inner, &other.inner) {
            return true;
        }
        matches!((self.to_json(), other.to_json()), (Ok(a), Ok(b)) if a == b)
    }
}

impl Serialize for Object {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json()
            .map_err(S::Error::custom)?
            .serialize(serializer)
    }
}

/// A dynamically typed argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absence of a value.
    Null,
    /// A boolean.
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// A floating point number.
    Float(f64),
    /// A string.
    String(String),
    /// An ordered list.
    List(Vec<Value>),
    /// A string-keyed map.
    Map(BTreeMap<String, Value>),
    /// An application object.
    Object(Object),
    /// An uploaded file.
    File(UploadedFile),
    /// The request being handled.
    Request(Box<Request>),
}

impl Value {
    /// Returns the runtime type name used in diagnostics.
    #[must_use]
    pub fn debug_type(&self) -> &str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Object(object) => object.type_name().as_str(),
            Self::File(_) => TypeName::UPLOADED_FILE.as_str(),
            Self::Request(_) => TypeName::REQUEST.as_str(),
        }
    }

    /// Returns true for `Null`.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns true for the scalar variants.
    #[must_use]
    pub const fn is_scalar(&self) -> bool {
        matches!(
            self,
            Self::Bool(_) | Self::Int(_) | Self::Float(_) | Self::String(_)
        )
    }

    /// Returns true for lists and maps.
    #[must_use]
    pub const fn is_container(&self) -> bool {
        matches!(self, Self::List(_) | Self::Map(_))
    }

    /// Returns the string slice if this is a `String`.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer if this is an `Int`.
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the number if this is a `Float` or an `Int`.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Returns the boolean if this is a `Bool`.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the object if this is an `Object`.
    #[must_use]
    pub const fn as_object(&self) -> Option<&Object> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Returns the map if this is a `Map`.
    #[must_use]
    pub const fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Returns the list if this is a `List`.
    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the file if this is a `File`.
    #[must_use]
    pub const fn as_file(&self) -> Option<&UploadedFile> {
        match self {
            Self::File(file) => Some(file),
            _ => None,
        }
    }

    /// Returns the request if this is a `Request`.
    #[must_use]
    pub fn as_request(&self) -> Option<&Request> {
        match self {
            Self::Request(request) => Some(request),
            _ => None,
        }
    }

    /// Converts the value to a JSON document.
    ///
    /// Fails for values that have no JSON form, such as the request.
    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::Float(f) => serializer.serialize_f64(*f),
            Self::String(s) => serializer.serialize_str(s),
            Self::List(items) => serializer.collect_seq(items),
            Self::Map(entries) => serializer.collect_map(entries),
            Self::Object(object) => object.serialize(serializer),
            Self::File(file) => file.serialize(serializer),
            Self::Request(_) => Err(S::Error::custom("a request has no serialized form")),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(document: serde_json::Value) -> Self {
        match document {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Self::Int)
                .or_else(|| n.as_f64().map(Self::Float))
                .unwrap_or(Self::Null),
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::List(items.into_iter().map(Self::from).collect())
            }
            serde_json::Value::Object(entries) => Self::Map(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, Self::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<Object> for Value {
    fn from(object: Object) -> Self {
        Self::Object(object)
    }
}

impl From<UploadedFile> for Value {
    fn from(file: UploadedFile) -> Self {
        Self::File(file)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::List(items)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}
