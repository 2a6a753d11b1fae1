//! Error types for Carica.
//!
//! Failures that have a well-defined HTTP mapping (routing, validation) are
//! turned into responses by the stage that detects them and never appear
//! here. What remains is:
//!
//! - [`ConfigurationFault`]: wiring mistakes, such as a stage installed
//!   ahead of the state it needs or an action declaring an unbindable type
//! - [`ActionResultNotRendered`]: an action value nobody could render
//! - failures raised by the action itself
//!
//! All of them travel as [`CaricaError`] until the outermost catch-all stage
//! converts them into a 500 response.

use crate::action::ActionId;
use crate::request::Request;
use crate::value::Value;
use std::error::Error as StdError;
use thiserror::Error;

/// Result type alias using [`CaricaError`].
pub type CaricaResult<T> = Result<T, CaricaError>;

/// A programming or wiring error in how the pipeline was assembled.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationFault {
    /// A parameter declares a union or intersection type.
    #[error("parameter `{parameter}` of action `{action}` declares a union or intersection type, which cannot be bound")]
    UnsupportedParameterType {
        /// The action declaring the parameter.
        action: ActionId,
        /// The parameter name.
        parameter: String,
    },

    /// A stage ran on a request that carries no route outcome.
    #[error("{stage} requires a route outcome; install the routing stage ahead of it")]
    RouteOutcomeMissing {
        /// The stage that needed it.
        stage: &'static str,
    },

    /// A stage that needs a matched route saw a routing failure.
    #[error("{stage} was reached by an unmatched route; install the not-found and method-not-allowed stages ahead of it")]
    RouteNotMatched {
        /// The stage that needed a match.
        stage: &'static str,
    },

    /// A stage ran before the action's metadata was resolved.
    #[error("{stage} requires resolved metadata for action `{action}`; install the metadata stage ahead of it")]
    MetadataUnresolved {
        /// The matched action.
        action: ActionId,
        /// The stage that needed it.
        stage: &'static str,
    },

    /// Metadata names a special-role parameter the action does not declare.
    #[error("metadata names `{parameter}` as its {role} parameter, but no such parameter is declared")]
    UndeclaredParameter {
        /// The parameter name.
        parameter: String,
        /// The role it was given.
        role: &'static str,
    },

    /// A middleware name could not be resolved.
    #[error("middleware `{name}` is neither registered with the service locator nor default-constructible")]
    UnknownMiddleware {
        /// The requested name.
        name: String,
    },

    /// Two different actions were routed under the same id.
    #[error("action id `{action}` is shared by two different actions; action ids must be unique")]
    DuplicateActionId {
        /// The shared id.
        action: ActionId,
    },

    /// The introspector could not describe an action.
    #[error("action `{action}` could not be introspected: {reason}")]
    Introspection {
        /// The action.
        action: ActionId,
        /// Why introspection failed.
        reason: String,
    },
}

/// An action returned a value that no renderer turned into a response.
#[derive(Error, Debug)]
#[error("result of action `{action}` is a {}, and no renderer produced a response for it", .result.debug_type())]
pub struct ActionResultNotRendered {
    action: ActionId,
    request: Box<Request>,
    result: Value,
}

impl ActionResultNotRendered {
    /// Creates the fault.
    #[must_use]
    pub fn new(action: ActionId, request: Request, result: Value) -> Self {
        Self {
            action,
            request: Box::new(request),
            result,
        }
    }

    /// The action whose result was not rendered.
    #[must_use]
    pub const fn action(&self) -> &ActionId {
        &self.action
    }

    /// The request as the action saw it.
    #[must_use]
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// The unrendered value.
    #[must_use]
    pub const fn result(&self) -> &Value {
        &self.result
    }
}

/// Standard error type for Carica.
#[derive(Error, Debug)]
pub enum CaricaError {
    /// The pipeline was assembled incorrectly.
    #[error(transparent)]
    Configuration(#[from] ConfigurationFault),

    /// An action result could not be rendered.
    #[error(transparent)]
    NotRendered(Box<ActionResultNotRendered>),

    /// A renderer failed to encode a result.
    #[error("failed to render action result: {0}")]
    Render(#[source] serde_json::Error),

    /// The action itself failed.
    #[error(transparent)]
    Action(#[from] anyhow::Error),
}

impl CaricaError {
    /// Wraps a failure raised by an action, naming the action.
    #[must_use]
    pub fn action(action: &ActionId, error: anyhow::Error) -> Self {
        Self::Action(error.context(format!("action `{action}` failed")))
    }

    /// Returns the configuration fault, if this is one.
    #[must_use]
    pub const fn as_configuration(&self) -> Option<&ConfigurationFault> {
        match self {
            Self::Configuration(fault) => Some(fault),
            _ => None,
        }
    }

    /// Formats the error and all of its sources, one per line.
    #[must_use]
    pub fn report(&self) -> String {
        let mut report = self.to_string();
        let mut source = StdError::source(self);
        while let Some(cause) = source {
            report.push_str("\ncaused by: ");
            report.push_str(&cause.to_string());
            source = cause.source();
        }
        report
    }
}

impl From<ActionResultNotRendered> for CaricaError {
    fn from(error: ActionResultNotRendered) -> Self {
        Self::NotRendered(Box::new(error))
    }
}
