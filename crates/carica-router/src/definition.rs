//! What a route resolves to.

use crate::params::Params;
use carica_core::{ActionMetadata, ActionRef, Arguments, RouteSuccess, Value};
use std::sync::Arc;

/// The action behind a route, with arguments fixed at registration time.
///
/// Fixed arguments win over path placeholders of the same name.
/// Metadata supplied here skips introspection for this route.
///
/// # Example
///
/// ```rust
/// use carica_core::{ActionDeclaration, ActionOutput, ActionRef, Value};
/// use carica_router::{Params, RouteDefinition};
///
/// let action = ActionRef::from_fn("list", ActionDeclaration::new(), |_| {
///     Ok(ActionOutput::from(Value::Null))
/// });
/// let definition = RouteDefinition::new(action).with_argument("format", "json");
///
/// let mut params = Params::new();
/// params.push("format", "xml");
/// params.push("page", "2");
///
/// let success = definition.to_success(params);
/// assert_eq!(success.arguments()["format"], Value::from("json"));
/// assert_eq!(success.arguments()["page"], Value::from("2"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RouteDefinition {
    action: ActionRef,
    extra_arguments: Arguments,
    metadata: Option<Arc<ActionMetadata>>,
}

impl RouteDefinition {
    /// Creates a definition for an action.
    #[must_use]
    pub fn new(action: ActionRef) -> Self {
        Self {
            action,
            extra_arguments: Arguments::new(),
            metadata: None,
        }
    }

    /// Adds a fixed argument.
    #[must_use]
    pub fn with_argument(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra_arguments.insert(name.into(), value.into());
        self
    }

    /// Adds several fixed arguments.
    #[must_use]
    pub fn with_arguments<I>(mut self, arguments: I) -> Self
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        self.extra_arguments.extend(arguments);
        self
    }

    /// Supplies pre-computed metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: Arc<ActionMetadata>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// The routed action.
    #[must_use]
    pub const fn action(&self) -> &ActionRef {
        &self.action
    }

    /// The fixed arguments.
    #[must_use]
    pub const fn extra_arguments(&self) -> &Arguments {
        &self.extra_arguments
    }

    /// The pre-computed metadata.
    #[must_use]
    pub const fn metadata(&self) -> Option<&Arc<ActionMetadata>> {
        self.metadata.as_ref()
    }

    /// Builds the success outcome for a match with the given placeholders.
    #[must_use]
    pub fn to_success(&self, params: Params) -> RouteSuccess {
        let success = RouteSuccess::new(self.action.clone())
            .with_added_args(params.into_arguments())
            .with_added_args(self.extra_arguments.clone());
        match &self.metadata {
            Some(metadata) => success.with_metadata(Arc::clone(metadata)),
            None => success,
        }
    }
}

impl From<ActionRef> for RouteDefinition {
    fn from(action: ActionRef) -> Self {
        Self::new(action)
    }
}
