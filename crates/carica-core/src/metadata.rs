//! Resolved per-action metadata.
//!
//! [`ActionMetadata`] is what the pipeline actually consults: declared
//! parameter types by name, which parameter wants the parsed body or the
//! request, which parameters are fed from request attributes or uploads,
//! and which extra middleware to run.

use crate::error::ConfigurationFault;
use crate::types::TypeName;
use indexmap::IndexMap;
use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// An opaque authentication or authorization marker.
///
/// The pipeline carries markers from declarations into metadata without
/// interpreting them; security middleware downcasts the payload.
#[derive(Clone)]
pub struct SecurityMarker {
    name: Cow<'static, str>,
    payload: Arc<dyn Any + Send + Sync>,
}

impl SecurityMarker {
    /// Creates a marker with a descriptive name and a payload.
    pub fn new<T: Any + Send + Sync>(name: impl Into<Cow<'static, str>>, payload: T) -> Self {
        Self {
            name: name.into(),
            payload: Arc::new(payload),
        }
    }

    /// Returns the marker name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Borrows the payload if it is a `T`.
    #[must_use]
    pub fn payload<T: Any>(&self) -> Option<&T> {
        (*self.payload).downcast_ref::<T>()
    }
}

impl PartialEq for SecurityMarker {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && Arc::ptr_eq(&self.payload, &other.payload)
    }
}

impl fmt::Debug for SecurityMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityMarker")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Metadata derived once per action and shared by every request to it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionMetadata {
    parameter_types: IndexMap<String, TypeName>,
    parsed_body_parameter: Option<String>,
    request_parameter: Option<String>,
    request_attributes: IndexMap<String, String>,
    uploaded_file_parameters: IndexMap<String, Vec<String>>,
    additional_middleware: Vec<String>,
    authentication: Option<SecurityMarker>,
    authorization: Option<SecurityMarker>,
}

impl ActionMetadata {
    /// Starts building metadata by hand.
    pub fn builder() -> ActionMetadataBuilder {
        ActionMetadataBuilder::default()
    }

    /// Declared parameter types in declaration order.
    #[must_use]
    pub const fn parameter_types(&self) -> &IndexMap<String, TypeName> {
        &self.parameter_types
    }

    /// The declared type of one parameter.
    #[must_use]
    pub fn parameter_type(&self, name: &str) -> Option<&TypeName> {
        self.parameter_types.get(name)
    }

    /// Returns true if the action declares a parameter called `name`.
    #[must_use]
    pub fn declares(&self, name: &str) -> bool {
        self.parameter_types.contains_key(name)
    }

    /// The parameter receiving the parsed body.
    #[must_use]
    pub fn parsed_body_parameter(&self) -> Option<&str> {
        self.parsed_body_parameter.as_deref()
    }

    /// The parameter receiving the request.
    #[must_use]
    pub fn request_parameter(&self) -> Option<&str> {
        self.request_parameter.as_deref()
    }

    /// Parameter name to request attribute key.
    #[must_use]
    pub const fn request_attributes(&self) -> &IndexMap<String, String> {
        &self.request_attributes
    }

    /// Parameter name to upload tree path.
    #[must_use]
    pub const fn uploaded_file_parameters(&self) -> &IndexMap<String, Vec<String>> {
        &self.uploaded_file_parameters
    }

    /// Middleware names to run ahead of the action, outermost first.
    #[must_use]
    pub fn additional_middleware(&self) -> &[String] {
        &self.additional_middleware
    }

    /// The authentication marker.
    #[must_use]
    pub const fn authentication(&self) -> Option<&SecurityMarker> {
        self.authentication.as_ref()
    }

    /// The authorization marker.
    #[must_use]
    pub const fn authorization(&self) -> Option<&SecurityMarker> {
        self.authorization.as_ref()
    }
}

/// Builder for [`ActionMetadata`].
///
/// `build` checks that every special-role parameter is also a declared
/// parameter.
#[derive(Debug, Default)]
#[must_use]
pub struct ActionMetadataBuilder {
    metadata: ActionMetadata,
}

impl ActionMetadataBuilder {
    /// Declares a parameter and its type.
    pub fn parameter(mut self, name: impl Into<String>, ty: impl Into<TypeName>) -> Self {
        self.metadata.parameter_types.insert(name.into(), ty.into());
        self
    }

    /// Names the parsed-body parameter.
    pub fn parsed_body(mut self, name: impl Into<String>) -> Self {
        self.metadata.parsed_body_parameter = Some(name.into());
        self
    }

    /// Names the request parameter.
    pub fn request_parameter(mut self, name: impl Into<String>) -> Self {
        self.metadata.request_parameter = Some(name.into());
        self
    }

    /// Feeds `parameter` from the request attribute `key`.
    pub fn request_attribute(mut self, parameter: impl Into<String>, key: impl Into<String>) -> Self {
        self.metadata
            .request_attributes
            .insert(parameter.into(), key.into());
        self
    }

    /// Feeds `parameter` from the upload at `path`.
    pub fn uploaded_file<I, S>(mut self, parameter: impl Into<String>, path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.metadata
            .uploaded_file_parameters
            .insert(parameter.into(), path.into_iter().map(Into::into).collect());
        self
    }

    /// Appends a middleware name.
    pub fn middleware(mut self, name: impl Into<String>) -> Self {
        self.metadata.additional_middleware.push(name.into());
        self
    }

    /// Sets the authentication marker.
    pub fn authentication(mut self, marker: SecurityMarker) -> Self {
        self.metadata.authentication = Some(marker);
        self
    }

    /// Sets the authorization marker.
    pub fn authorization(mut self, marker: SecurityMarker) -> Self {
        self.metadata.authorization = Some(marker);
        self
    }

    /// Validates and returns the metadata.
    pub fn build(self) -> Result<ActionMetadata, ConfigurationFault> {
        let metadata = self.metadata;
        let declared = |name: &str, role: &'static str| {
            if metadata.parameter_types.contains_key(name) {
                Ok(())
            } else {
                Err(ConfigurationFault::UndeclaredParameter {
                    parameter: name.to_string(),
                    role,
                })
            }
        };
        if let Some(name) = &metadata.parsed_body_parameter {
            declared(name, "parsed-body")?;
        }
        if let Some(name) = &metadata.request_parameter {
            declared(name, "request")?;
        }
        for name in metadata.request_attributes.keys() {
            declared(name, "request-attribute")?;
        }
        for name in metadata.uploaded_file_parameters.keys() {
            declared(name, "uploaded-file")?;
        }
        Ok(metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_keeps_declaration_order() {
        let metadata = ActionMetadata::builder()
            .parameter("b", TypeName::INT)
            .parameter("a", TypeName::STRING)
            .middleware("first")
            .middleware("second")
            .build()
            .unwrap();

        let names: Vec<_> = metadata.parameter_types().keys().cloned().collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(metadata.additional_middleware(), &["first", "second"]);
        assert_eq!(metadata.parameter_type("a"), Some(&TypeName::STRING));
    }

    #[test]
    fn test_builder_rejects_undeclared_body_parameter() {
        let fault = ActionMetadata::builder()
            .parameter("a", TypeName::INT)
            .parsed_body("body")
            .build()
            .unwrap_err();
        assert!(matches!(
            fault,
            ConfigurationFault::UndeclaredParameter { role: "parsed-body", .. }
        ));
    }

    #[test]
    fn test_security_marker_payload() {
        #[derive(Debug, PartialEq)]
        struct Scope(&'static str);

        let marker = SecurityMarker::new("scope", Scope("admin"));
        assert_eq!(marker.name(), "scope");
        assert_eq!(marker.payload::<Scope>(), Some(&Scope("admin")));
        assert!(marker.payload::<String>().is_none());
        assert_eq!(marker.clone(), marker);
    }
}
