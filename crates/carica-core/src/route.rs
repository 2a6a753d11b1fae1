//! Route outcomes and the router plugin interface.
//!
//! The routing stage attaches exactly one [`RouteOutcome`] to each request.
//! Later stages never modify it in place: they attach a replacement carrying
//! more arguments or resolved metadata.

use crate::action::ActionRef;
use crate::error::ConfigurationFault;
use crate::metadata::ActionMetadata;
use crate::request::Request;
use crate::value::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Arguments bound to an action by name.
pub type Arguments = BTreeMap<String, Value>;

/// Maps a request to a route outcome.
pub trait Router: Send + Sync {
    /// Resolves the request's method and path.
    fn route(&self, request: &Request) -> RouteOutcome;
}

impl<R: Router + ?Sized> Router for Arc<R> {
    fn route(&self, request: &Request) -> RouteOutcome {
        (**self).route(request)
    }
}

/// The result of routing a request.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteOutcome {
    /// No route matches the path.
    NotFound,
    /// The path matches, but not for this method.
    MethodNotAllowed {
        /// Upper-cased methods registered for the path.
        allowed_methods: BTreeSet<String>,
    },
    /// A route matched.
    Success(RouteSuccess),
}

impl RouteOutcome {
    /// Builds a `MethodNotAllowed` outcome, upper-casing the method names.
    #[must_use]
    pub fn method_not_allowed<I, S>(methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::MethodNotAllowed {
            allowed_methods: methods
                .into_iter()
                .map(|method| method.as_ref().to_ascii_uppercase())
                .collect(),
        }
    }

    /// Returns the success payload, if any.
    #[must_use]
    pub const fn as_success(&self) -> Option<&RouteSuccess> {
        match self {
            Self::Success(success) => Some(success),
            _ => None,
        }
    }
}

impl From<RouteSuccess> for RouteOutcome {
    fn from(success: RouteSuccess) -> Self {
        Self::Success(success)
    }
}

/// Whether an action's metadata has been derived yet.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum MetadataState {
    /// Not yet derived.
    #[default]
    Unresolved,
    /// Derived and shared.
    Resolved(Arc<ActionMetadata>),
}

impl MetadataState {
    /// Returns the metadata if resolved.
    #[must_use]
    pub const fn as_resolved(&self) -> Option<&Arc<ActionMetadata>> {
        match self {
            Self::Resolved(metadata) => Some(metadata),
            Self::Unresolved => None,
        }
    }

    /// Returns true once metadata is resolved.
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }
}

/// A matched route: the action, its bound arguments, and its metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteSuccess {
    action: ActionRef,
    arguments: Arguments,
    metadata: MetadataState,
}

impl RouteSuccess {
    /// Creates a success with no arguments and unresolved metadata.
    #[must_use]
    pub fn new(action: ActionRef) -> Self {
        Self {
            action,
            arguments: Arguments::new(),
            metadata: MetadataState::Unresolved,
        }
    }

    /// Merges arguments into the bound set.
    ///
    /// A supplied value replaces any value already bound under the same
    /// name, so whichever stage merges later wins.
    #[must_use]
    pub fn with_added_args<I>(mut self, arguments: I) -> Self
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        self.arguments.extend(arguments);
        self
    }

    /// Attaches resolved metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: Arc<ActionMetadata>) -> Self {
        self.metadata = MetadataState::Resolved(metadata);
        self
    }

    /// Returns the matched action.
    #[must_use]
    pub const fn action(&self) -> &ActionRef {
        &self.action
    }

    /// Returns the bound arguments.
    #[must_use]
    pub const fn arguments(&self) -> &Arguments {
        &self.arguments
    }

    /// Returns the metadata state.
    #[must_use]
    pub const fn metadata(&self) -> &MetadataState {
        &self.metadata
    }

    /// Borrows the route with its metadata, failing if it is unresolved.
    ///
    /// `stage` names the caller in the resulting fault.
    pub fn resolved(&self, stage: &'static str) -> Result<ResolvedRoute<'_>, ConfigurationFault> {
        match &self.metadata {
            MetadataState::Resolved(metadata) => Ok(ResolvedRoute {
                action: &self.action,
                arguments: &self.arguments,
                metadata,
            }),
            MetadataState::Unresolved => Err(ConfigurationFault::MetadataUnresolved {
                action: self.action.id().clone(),
                stage,
            }),
        }
    }
}

/// A borrowed view of a success whose metadata is known to be resolved.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedRoute<'a> {
    /// The matched action.
    pub action: &'a ActionRef,
    /// The bound arguments.
    pub arguments: &'a Arguments,
    /// The resolved metadata.
    pub metadata: &'a ActionMetadata,
}
