//! Declared parameter types and the application type catalog.
//!
//! Actions declare a type for each parameter. Scalar keywords (`string`,
//! `int`, `float`, `bool`) drive coercion, `array` and `mixed` pass values
//! through untouched, and every other name refers to an application type
//! registered in a [`TypeCatalog`].
//!
//! The catalog answers two questions for the pipeline:
//!
//! - is a type assignable to another (for value loaders and request detection)
//! - can a JSON document be decoded into a given type (for body parsing)
//!
//! # Example
//!
//! ```
//! use carica_core::{TypeCatalog, TypeName, Typed};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct Point {
//!     x: i64,
//!     y: i64,
//! }
//!
//! impl Typed for Point {
//!     const TYPE_NAME: &'static str = "Point";
//! }
//!
//! let mut catalog = TypeCatalog::new();
//! catalog.register_interface("Shape");
//! catalog.register_class::<Point>().implements("Shape");
//!
//! assert!(catalog.is_assignable(&TypeName::from("Point"), &TypeName::from("Shape")));
//! assert!(catalog.can_decode(&TypeName::from("Point")));
//! assert!(!catalog.can_decode(&TypeName::from("Shape")));
//! ```

use crate::value::{Object, Typed};
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// The simple name of a parameter type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeName(Cow<'static, str>);

impl TypeName {
    /// The `string` scalar keyword.
    pub const STRING: Self = Self(Cow::Borrowed("string"));
    /// The `int` scalar keyword.
    pub const INT: Self = Self(Cow::Borrowed("int"));
    /// The `float` scalar keyword.
    pub const FLOAT: Self = Self(Cow::Borrowed("float"));
    /// The `bool` scalar keyword.
    pub const BOOL: Self = Self(Cow::Borrowed("bool"));
    /// The generic key/value container type.
    pub const ARRAY: Self = Self(Cow::Borrowed("array"));
    /// Any value; the type of undeclared parameters.
    pub const MIXED: Self = Self(Cow::Borrowed("mixed"));
    /// The request abstraction itself.
    pub const REQUEST: Self = Self(Cow::Borrowed("request"));
    /// A single uploaded file.
    pub const UPLOADED_FILE: Self = Self(Cow::Borrowed("uploaded_file"));

    /// Creates a type name from a static string without allocating.
    #[must_use]
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    /// Creates a type name from an owned string.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true for the four coercible scalar keywords.
    #[must_use]
    pub fn is_scalar(&self) -> bool {
        *self == Self::STRING || *self == Self::INT || *self == Self::FLOAT || *self == Self::BOOL
    }

    /// Returns true for the generic container type.
    #[must_use]
    pub fn is_container(&self) -> bool {
        *self == Self::ARRAY
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for TypeName {
    fn from(name: &'static str) -> Self {
        Self::from_static(name)
    }
}

impl From<String> for TypeName {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

/// A parameter type as written in an action declaration.
///
/// Only [`DeclaredType::Named`] can be bound; composite types are rejected
/// when metadata is derived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclaredType {
    /// A single named type.
    Named(TypeName),
    /// Any one of several types.
    Union(Vec<TypeName>),
    /// All of several types at once.
    Intersection(Vec<TypeName>),
}

impl DeclaredType {
    /// A single named type.
    #[must_use]
    pub fn named(name: impl Into<TypeName>) -> Self {
        Self::Named(name.into())
    }

    /// The `string` scalar.
    #[must_use]
    pub const fn string() -> Self {
        Self::Named(TypeName::STRING)
    }

    /// The `int` scalar.
    #[must_use]
    pub const fn int() -> Self {
        Self::Named(TypeName::INT)
    }

    /// The `float` scalar.
    #[must_use]
    pub const fn float() -> Self {
        Self::Named(TypeName::FLOAT)
    }

    /// The `bool` scalar.
    #[must_use]
    pub const fn boolean() -> Self {
        Self::Named(TypeName::BOOL)
    }

    /// The generic container.
    #[must_use]
    pub const fn array() -> Self {
        Self::Named(TypeName::ARRAY)
    }

    /// No declared type.
    #[must_use]
    pub const fn mixed() -> Self {
        Self::Named(TypeName::MIXED)
    }

    /// The request abstraction.
    #[must_use]
    pub const fn request() -> Self {
        Self::Named(TypeName::REQUEST)
    }

    /// An uploaded file.
    #[must_use]
    pub const fn uploaded_file() -> Self {
        Self::Named(TypeName::UPLOADED_FILE)
    }

    /// Returns the simple name, or `None` for composite types.
    #[must_use]
    pub fn simple_name(&self) -> Option<&TypeName> {
        match self {
            Self::Named(name) => Some(name),
            Self::Union(_) | Self::Intersection(_) => None,
        }
    }
}

impl From<TypeName> for DeclaredType {
    fn from(name: TypeName) -> Self {
        Self::Named(name)
    }
}

type Decoder = fn(serde_json::Value) -> Result<Object, serde_json::Error>;
type FormDecoder = fn(&[u8]) -> Result<Object, serde_urlencoded::de::Error>;

#[derive(Debug, Clone, Default)]
struct TypeEntry {
    supertypes: Vec<TypeName>,
    decoder: Option<Decoder>,
    form_decoder: Option<FormDecoder>,
}

/// Registry of application types known to the pipeline.
///
/// The catalog is populated at assembly time and shared read-only
/// afterwards.
#[derive(Debug, Clone, Default)]
pub struct TypeCatalog {
    entries: HashMap<TypeName, TypeEntry>,
}

impl TypeCatalog {
    /// Creates a catalog containing only the built-in request and upload types.
    #[must_use]
    pub fn new() -> Self {
        let mut entries = HashMap::new();
        entries.insert(TypeName::REQUEST, TypeEntry::default());
        entries.insert(TypeName::UPLOADED_FILE, TypeEntry::default());
        Self { entries }
    }

    /// Registers a type that cannot be decoded directly, such as an interface.
    pub fn register_interface(&mut self, name: impl Into<TypeName>) -> TypeRegistration<'_> {
        TypeRegistration {
            entry: self.entries.entry(name.into()).or_default(),
        }
    }

    /// Registers a concrete type that bodies can be decoded into.
    pub fn register_class<T>(&mut self) -> TypeRegistration<'_>
    where
        T: Typed + DeserializeOwned,
    {
        let entry = self
            .entries
            .entry(TypeName::from_static(T::TYPE_NAME))
            .or_default();
        entry.decoder = Some(decode_as::<T>);
        entry.form_decoder = Some(decode_form_as::<T>);
        TypeRegistration { entry }
    }

    /// Returns true if the type is registered (or built in).
    #[must_use]
    pub fn contains(&self, name: &TypeName) -> bool {
        self.entries.contains_key(name)
    }

    /// Returns true if a value of type `from` may be used where `to` is expected.
    ///
    /// Assignability is reflexive and follows declared supertypes transitively.
    #[must_use]
    pub fn is_assignable(&self, from: &TypeName, to: &TypeName) -> bool {
        if from == to {
            return true;
        }
        let mut pending = vec![from];
        let mut seen = HashSet::new();
        while let Some(current) = pending.pop() {
            if !seen.insert(current) {
                continue;
            }
            if let Some(entry) = self.entries.get(current) {
                for supertype in &entry.supertypes {
                    if supertype == to {
                        return true;
                    }
                    pending.push(supertype);
                }
            }
        }
        false
    }

    /// Returns true if the type has a registered decoder.
    #[must_use]
    pub fn can_decode(&self, name: &TypeName) -> bool {
        self.entries
            .get(name)
            .is_some_and(|entry| entry.decoder.is_some())
    }

    /// Decodes a JSON document into the named type.
    ///
    /// Returns `None` when the type has no decoder.
    pub fn decode(
        &self,
        name: &TypeName,
        document: serde_json::Value,
    ) -> Option<Result<Object, serde_json::Error>> {
        let decoder = self.entries.get(name)?.decoder?;
        Some(decoder(document))
    }

    /// Decodes an `application/x-www-form-urlencoded` body into the named type.
    ///
    /// Returns `None` when the type has no decoder.
    pub fn decode_form(
        &self,
        name: &TypeName,
        body: &[u8],
    ) -> Option<Result<Object, serde_urlencoded::de::Error>> {
        let decoder = self.entries.get(name)?.form_decoder?;
        Some(decoder(body))
    }
}

fn decode_as<T>(document: serde_json::Value) -> Result<Object, serde_json::Error>
where
    T: Typed + DeserializeOwned,
{
    serde_json::from_value::<T>(document).map(Object::new)
}

fn decode_form_as<T>(body: &[u8]) -> Result<Object, serde_urlencoded::de::Error>
where
    T: Typed + DeserializeOwned,
{
    serde_urlencoded::from_bytes::<T>(body).map(Object::new)
}

/// Handle returned by catalog registration for declaring supertypes.
#[derive(Debug)]
pub struct TypeRegistration<'a> {
    entry: &'a mut TypeEntry,
}

impl TypeRegistration<'_> {
    /// Declares that the registered type is assignable to `supertype`.
    pub fn implements(self, supertype: impl Into<TypeName>) -> Self {
        self.entry.supertypes.push(supertype.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Point {
        x: i64,
        y: i64,
    }

    impl Typed for Point {
        const TYPE_NAME: &'static str = "Point";
    }

    #[test]
    fn test_scalar_keywords() {
        assert!(TypeName::INT.is_scalar());
        assert!(TypeName::BOOL.is_scalar());
        assert!(!TypeName::ARRAY.is_scalar());
        assert!(TypeName::ARRAY.is_container());
        assert!(!TypeName::from("Point").is_scalar());
    }

    #[test]
    fn test_simple_name_rejects_composites() {
        assert_eq!(DeclaredType::int().simple_name(), Some(&TypeName::INT));
        assert_eq!(
            DeclaredType::Union(vec![TypeName::INT, TypeName::STRING]).simple_name(),
            None
        );
        assert_eq!(DeclaredType::Intersection(vec![]).simple_name(), None);
    }

    #[test]
    fn test_assignability_is_transitive() {
        let mut catalog = TypeCatalog::new();
        catalog.register_interface("Shape");
        catalog.register_interface("Polygon").implements("Shape");
        catalog.register_class::<Point>().implements("Polygon");

        let point = TypeName::from("Point");
        assert!(catalog.is_assignable(&point, &point));
        assert!(catalog.is_assignable(&point, &TypeName::from("Polygon")));
        assert!(catalog.is_assignable(&point, &TypeName::from("Shape")));
        assert!(!catalog.is_assignable(&TypeName::from("Shape"), &point));
    }

    #[test]
    fn test_assignability_survives_cycles() {
        let mut catalog = TypeCatalog::new();
        catalog.register_interface("A").implements("B");
        catalog.register_interface("B").implements("A");

        assert!(catalog.is_assignable(&TypeName::from("A"), &TypeName::from("B")));
        assert!(!catalog.is_assignable(&TypeName::from("A"), &TypeName::from("C")));
    }

    #[test]
    fn test_decode_registered_class() {
        let mut catalog = TypeCatalog::new();
        catalog.register_class::<Point>();

        let object = catalog
            .decode(&TypeName::from("Point"), serde_json::json!({"x": 3, "y": 5}))
            .expect("decoder registered")
            .expect("valid document");
        assert_eq!(object.downcast_ref::<Point>(), Some(&Point { x: 3, y: 5 }));

        let failure = catalog
            .decode(&TypeName::from("Point"), serde_json::json!({"x": 3}))
            .expect("decoder registered");
        assert!(failure.is_err());
    }

    #[test]
    fn test_decode_form_parses_numbers() {
        let mut catalog = TypeCatalog::new();
        catalog.register_class::<Point>();

        let object = catalog
            .decode_form(&TypeName::from("Point"), b"x=3&y=5")
            .expect("decoder registered")
            .expect("valid form");
        assert_eq!(object.downcast_ref::<Point>(), Some(&Point { x: 3, y: 5 }));
        assert!(catalog.decode_form(&TypeName::from("Shape"), b"x=1").is_none());
    }

    #[test]
    fn test_builtins_are_known_but_not_decodable() {
        let catalog = TypeCatalog::new();
        assert!(catalog.contains(&TypeName::REQUEST));
        assert!(catalog.contains(&TypeName::UPLOADED_FILE));
        assert!(!catalog.can_decode(&TypeName::REQUEST));
        assert!(catalog.decode(&TypeName::REQUEST, serde_json::Value::Null).is_none());
    }
}
