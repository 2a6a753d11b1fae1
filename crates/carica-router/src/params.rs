//! Path placeholder values captured during matching.
//!
//! Values are stored raw, as they appear in the path, and percent-decoded
//! when converted into bound arguments.

use carica_core::{Arguments, Value};
use smallvec::SmallVec;
use std::borrow::Cow;

/// Maximum number of placeholders stored inline.
const INLINE_PARAMS: usize = 4;

/// Placeholder values extracted from a matched path, in path order.
///
/// # Example
///
/// ```rust
/// use carica_router::Params;
///
/// let mut params = Params::new();
/// params.push("name", "J%C3%BCrgen");
///
/// assert_eq!(params.get("name"), Some("J%C3%BCrgen"));
/// let args = params.into_arguments();
/// assert_eq!(args["name"].as_str(), Some("Jürgen"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Params {
    inner: SmallVec<[(String, String); INLINE_PARAMS]>,
}

impl Params {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a raw placeholder value.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.inner.push((name.into(), value.into()));
    }

    /// Returns the raw value of a placeholder.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns true if nothing was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the number of captured placeholders.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Iterates over raw `(name, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Drops values captured after the first `len`; used when backtracking.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.inner.truncate(len);
    }

    /// Percent-decodes the values into string arguments.
    ///
    /// A value that does not decode to UTF-8 is kept raw.
    #[must_use]
    pub fn into_arguments(self) -> Arguments {
        self.inner
            .into_iter()
            .map(|(name, raw)| {
                let value = urlencoding::decode(&raw)
                    .map(Cow::into_owned)
                    .unwrap_or(raw);
                (name, Value::String(value))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_push_and_get() {
        let mut params = Params::new();
        params.push("userId", "123");
        params.push("action", "view");

        assert_eq!(params.len(), 2);
        assert_eq!(params.get("userId"), Some("123"));
        assert_eq!(params.get("unknown"), None);
    }

    #[test]
    fn test_truncate_backtracks() {
        let mut params = Params::new();
        params.push("a", "1");
        params.push("b", "2");
        params.truncate(1);
        assert_eq!(params.iter().collect::<Vec<_>>(), vec![("a", "1")]);
    }

    #[test]
    fn test_into_arguments_decodes() {
        let mut params = Params::new();
        params.push("query", "a%20b");
        params.push("plain", "c");
        params.push("broken", "%FF");

        let args = params.into_arguments();
        assert_eq!(args["query"], Value::from("a b"));
        assert_eq!(args["plain"], Value::from("c"));
        assert_eq!(args["broken"], Value::from("%FF"));
    }
}
