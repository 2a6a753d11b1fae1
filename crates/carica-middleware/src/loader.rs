//! Pluggable loading of application objects from raw argument values.
//!
//! A path placeholder such as `/products/{product}` binds a string. When the
//! action declares `product` as an application type, a [`ValueLoader`] turns
//! that string into the object, typically by looking it up somewhere.

use carica_core::{Object, OrderedRegistry, TypeName, Typed, Value};
use std::fmt;
use std::sync::Arc;

/// Loads an application object for a declared parameter type.
pub trait ValueLoader: Send + Sync {
    /// The type this loader produces.
    ///
    /// A loader is consulted only when this type is assignable to the type
    /// the parameter declares.
    fn target(&self) -> &TypeName;

    /// Loads the object, or returns `None` if this loader cannot.
    fn load(&self, value: &Value, requested: &TypeName) -> Option<Object>;
}

/// Loaders in registration order; the first successful load wins.
pub type ValueLoaders = OrderedRegistry<Arc<dyn ValueLoader>>;

/// A loader backed by a closure.
///
/// See [`typed_loader`] for loaders of a concrete [`Typed`] type.
pub struct FnValueLoader<F> {
    target: TypeName,
    func: F,
}

impl<F> FnValueLoader<F>
where
    F: Fn(&Value, &TypeName) -> Option<Object> + Send + Sync,
{
    /// Creates a loader producing objects of `target`.
    pub fn new(target: impl Into<TypeName>, func: F) -> Self {
        Self {
            target: target.into(),
            func,
        }
    }
}

impl<F> ValueLoader for FnValueLoader<F>
where
    F: Fn(&Value, &TypeName) -> Option<Object> + Send + Sync,
{
    fn target(&self) -> &TypeName {
        &self.target
    }

    fn load(&self, value: &Value, requested: &TypeName) -> Option<Object> {
        (self.func)(value, requested)
    }
}

impl<F> fmt::Debug for FnValueLoader<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnValueLoader")
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

/// Creates a loader producing `T` from a closure.
///
/// # Example
///
/// ```
/// use carica_core::{TypeName, Typed, Value};
/// use carica_middleware::{typed_loader, ValueLoader};
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Product {
///     sku: String,
/// }
///
/// impl Typed for Product {
///     const TYPE_NAME: &'static str = "Product";
/// }
///
/// let loader = typed_loader::<Product, _>(|value, _| {
///     value.as_str().map(|sku| Product { sku: sku.to_string() })
/// });
///
/// let loaded = loader.load(&Value::from("A-1"), &TypeName::from("Product")).unwrap();
/// assert_eq!(loaded.downcast_ref::<Product>().unwrap().sku, "A-1");
/// ```
pub fn typed_loader<T, G>(func: G) -> impl ValueLoader
where
    T: Typed,
    G: Fn(&Value, &TypeName) -> Option<T> + Send + Sync,
{
    FnValueLoader::new(T::TYPE_NAME, move |value: &Value, requested: &TypeName| {
        func(value, requested).map(Object::new)
    })
}
