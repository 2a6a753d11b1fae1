//! Route registration errors.

use thiserror::Error;

/// A route could not be registered.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    /// A `*name` wildcard is followed by further segments.
    #[error("wildcard must be the last segment in `{path}`")]
    WildcardNotLast {
        /// The offending pattern.
        path: String,
    },

    /// Two patterns use different placeholder names at the same position.
    #[error("placeholder `{requested}` in `{path}` conflicts with existing placeholder `{existing}`")]
    ConflictingPlaceholder {
        /// The offending pattern.
        path: String,
        /// Name already registered at this position.
        existing: String,
        /// Name the new pattern uses.
        requested: String,
    },

    /// The method is already registered for the pattern.
    #[error("{method} {path} is already registered")]
    Duplicate {
        /// The method.
        method: String,
        /// The pattern.
        path: String,
    },

    /// A route was registered without any method.
    #[error("no methods given for `{path}`")]
    NoMethods {
        /// The pattern.
        path: String,
    },
}
