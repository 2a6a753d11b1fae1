//! Metadata derivation stage.
//!
//! Routers may attach pre-computed metadata; for everything else this stage
//! asks the [`MetadataResolver`] and attaches the result, so every stage
//! after it can rely on [`RouteSuccess::resolved`].
//!
//! [`RouteSuccess::resolved`]: carica_core::RouteSuccess::resolved

use super::route_outcome;
use crate::metadata::MetadataResolver;
use crate::middleware::{Handler, Middleware};
use carica_core::{CaricaResult, MetadataState, Request, Response, RouteOutcome};
use std::sync::Arc;

const STAGE: &str = "derive_metadata";

/// Resolves metadata for matched actions that do not carry it yet.
#[derive(Debug, Clone)]
pub struct DeriveMetadataMiddleware {
    resolver: Arc<MetadataResolver>,
}

impl DeriveMetadataMiddleware {
    /// Creates the stage.
    pub fn new(resolver: Arc<MetadataResolver>) -> Self {
        Self { resolver }
    }
}

impl Middleware for DeriveMetadataMiddleware {
    fn name(&self) -> &'static str {
        STAGE
    }

    fn process(&self, request: Request, next: &dyn Handler) -> CaricaResult<Response> {
        let success = match route_outcome(&request, STAGE)? {
            RouteOutcome::Success(success)
                if matches!(success.metadata(), MetadataState::Unresolved) =>
            {
                success.clone()
            }
            _ => return next.handle(request),
        };

        let metadata = self.resolver.resolve(success.action())?;
        let outcome = RouteOutcome::Success(success.with_metadata(metadata));
        next.handle(request.with_route_outcome(outcome))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::testing::{request, routed, Capture};
    use carica_core::{
        ActionDeclaration, ActionMetadata, ActionOutput, ActionRef, DeclaredType,
        ParameterDeclaration, RouteSuccess, TypeCatalog, TypeName, Value,
    };
    use http::Method;

    fn resolver() -> Arc<MetadataResolver> {
        Arc::new(MetadataResolver::with_defaults(Arc::new(TypeCatalog::new())))
    }

    #[test]
    fn test_unresolved_metadata_is_derived() {
        let declaration = ActionDeclaration::new()
            .parameter(ParameterDeclaration::new("id", DeclaredType::int()))
            .parameter(ParameterDeclaration::new("note", DeclaredType::array()).parsed_body());
        let action = ActionRef::from_fn("show", declaration, |_| {
            Ok(ActionOutput::from(Value::Null))
        });
        let request = request(Method::POST, "/things/1")
            .with_route_outcome(RouteOutcome::Success(RouteSuccess::new(action)));
        let capture = Capture::new();

        DeriveMetadataMiddleware::new(resolver())
            .process(request, &capture.handler())
            .unwrap();

        let success = capture.success();
        let route = success.resolved("test").unwrap();
        assert_eq!(route.metadata.parameter_type("id"), Some(&TypeName::INT));
        assert_eq!(route.metadata.parsed_body_parameter(), Some("note"));
    }

    #[test]
    fn test_precomputed_metadata_is_kept() {
        let precomputed = ActionMetadata::builder()
            .parameter("custom", TypeName::STRING)
            .build()
            .unwrap();
        let capture = Capture::new();

        DeriveMetadataMiddleware::new(resolver())
            .process(routed(precomputed.clone(), vec![]), &capture.handler())
            .unwrap();

        let success = capture.success();
        assert_eq!(success.resolved("test").unwrap().metadata, &precomputed);
    }

    #[test]
    fn test_routing_failures_pass_through() {
        let capture = Capture::new();
        let request = request(Method::GET, "/").with_route_outcome(RouteOutcome::NotFound);
        DeriveMetadataMiddleware::new(resolver())
            .process(request, &capture.handler())
            .unwrap();
        assert_eq!(
            capture.request().unwrap().route_outcome(),
            Some(&RouteOutcome::NotFound)
        );
    }
}
