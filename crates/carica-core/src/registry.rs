//! Ordered plugin registry.
//!
//! Value loaders and body parsers are consulted first-match-wins, so the
//! order in which they are registered is part of their contract.

use std::fmt;

/// An append-only list of plugins queried in registration order.
#[derive(Clone)]
pub struct OrderedRegistry<T> {
    entries: Vec<T>,
}

impl<T> OrderedRegistry<T> {
    /// Creates an empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Appends an entry; it is consulted after all existing ones.
    pub fn push(&mut self, entry: T) {
        self.entries.push(entry);
    }

    /// Builder form of [`push`](Self::push).
    #[must_use]
    pub fn with(mut self, entry: T) -> Self {
        self.push(entry);
        self
    }

    /// Returns the first entry satisfying `predicate`.
    pub fn find<P>(&self, mut predicate: P) -> Option<&T>
    where
        P: FnMut(&T) -> bool,
    {
        self.entries.iter().find(|entry| predicate(entry))
    }

    /// Returns the first `Some` produced by `f`, in registration order.
    pub fn find_map<R, F>(&self, f: F) -> Option<R>
    where
        F: FnMut(&T) -> Option<R>,
    {
        self.entries.iter().find_map(f)
    }

    /// Iterates over entries in registration order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.entries.iter()
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Default for OrderedRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<T> for OrderedRegistry<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<T> Extend<T> for OrderedRegistry<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.entries.extend(iter);
    }
}

impl<'a, T> IntoIterator for &'a OrderedRegistry<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl<T> fmt::Debug for OrderedRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderedRegistry")
            .field("len", &self.entries.len())
            .finish()
    }
}
