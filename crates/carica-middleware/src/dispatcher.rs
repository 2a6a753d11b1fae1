//! The terminal handler: binds arguments and calls the routed action.
//!
//! Arguments are assembled from the bound route arguments restricted to
//! the declared parameters, then the injected values are applied in order:
//!
//! 1. request attributes (`Null` when the attribute is absent)
//! 2. uploaded files by path (`Null` when the path does not lead to a file)
//! 3. the parsed body
//! 4. the request itself, last, so it reflects every earlier stage
//!
//! An action returning a response is answered as is. Any other value goes
//! to the [`ResultRenderer`]; if there is none or it declines, the request
//! fails with [`ActionResultNotRendered`].

use crate::middleware::Handler;
use crate::render::ResultRenderer;
use carica_core::{
    ActionId, ActionOutput, ActionResultNotRendered, Arguments, CallArguments, CaricaError,
    CaricaResult, ConfigurationFault, Request, Response, RouteOutcome, Value,
};
use std::fmt;
use std::sync::Arc;

const STAGE: &str = "action_dispatcher";

/// Calls the action a request was routed to.
#[derive(Default, Clone)]
pub struct ActionDispatcher {
    renderer: Option<Arc<dyn ResultRenderer>>,
}

impl ActionDispatcher {
    /// Creates a dispatcher without a renderer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the renderer for non-response results.
    #[must_use]
    pub fn with_renderer(mut self, renderer: Arc<dyn ResultRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    fn render(&self, request: Request, action: &ActionId, result: Value) -> CaricaResult<Response> {
        let rendered = match &self.renderer {
            Some(renderer) => renderer.render(&request, &result)?,
            None => None,
        };
        match rendered {
            Some(response) => Ok(response),
            None => {
                tracing::error!(
                    action = %action,
                    path = request.path(),
                    result_type = result.debug_type(),
                    "Action returned a non-response and no renderer produced one"
                );
                Err(ActionResultNotRendered::new(action.clone(), request, result).into())
            }
        }
    }
}

/// Builds the call arguments for a routed request.
fn bind_arguments(request: &Request) -> CaricaResult<(carica_core::ActionRef, Arguments)> {
    let outcome = request
        .route_outcome()
        .ok_or(ConfigurationFault::RouteOutcomeMissing { stage: STAGE })?;
    let RouteOutcome::Success(success) = outcome else {
        return Err(ConfigurationFault::RouteNotMatched { stage: STAGE }.into());
    };
    let route = success.resolved(STAGE)?;
    let metadata = route.metadata;

    let mut arguments: Arguments = route
        .arguments
        .iter()
        .filter(|(name, _)| metadata.declares(name))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();

    for (parameter, key) in metadata.request_attributes() {
        let value = request.attribute(key).cloned().unwrap_or(Value::Null);
        arguments.insert(parameter.clone(), value);
    }
    for (parameter, path) in metadata.uploaded_file_parameters() {
        let value = request
            .uploaded_files()
            .resolve(path.as_slice())
            .cloned()
            .map_or(Value::Null, Value::File);
        arguments.insert(parameter.clone(), value);
    }
    if let Some(parameter) = metadata.parsed_body_parameter() {
        let value = request.parsed_body().cloned().unwrap_or(Value::Null);
        arguments.insert(parameter.to_string(), value);
    }
    if let Some(parameter) = metadata.request_parameter() {
        arguments.insert(parameter.to_string(), Value::Request(Box::new(request.clone())));
    }

    Ok((route.action.clone(), arguments))
}

impl Handler for ActionDispatcher {
    fn handle(&self, request: Request) -> CaricaResult<Response> {
        let (action, arguments) = bind_arguments(&request)?;
        tracing::debug!(action = %action.id(), arguments = arguments.len(), "Dispatching action");

        let output = action
            .call(CallArguments::new(arguments))
            .map_err(|error| CaricaError::action(action.id(), error))?;

        match output {
            ActionOutput::Response(response) => Ok(response),
            ActionOutput::Value(value) => self.render(request, action.id(), value),
        }
    }
}

impl fmt::Debug for ActionDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionDispatcher")
            .field("has_renderer", &self.renderer.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::JsonResultRenderer;
    use carica_core::{
        ActionDeclaration, ActionMetadata, ActionRef, ResponseBuilder, RouteSuccess, TypeName,
        UploadedFile, UploadedFileTree,
    };
    use http::{Method, StatusCode, Uri};
    use std::sync::Mutex;

    fn routed(action: ActionRef, metadata: ActionMetadata, args: Arguments) -> Request {
        let success = RouteSuccess::new(action)
            .with_added_args(args)
            .with_metadata(Arc::new(metadata));
        Request::new(Method::POST, Uri::from_static("/things"))
            .with_route_outcome(RouteOutcome::Success(success))
    }

    /// An action that records the arguments it received.
    fn capturing(seen: Arc<Mutex<Option<CallArguments>>>) -> ActionRef {
        ActionRef::from_fn("capture", ActionDeclaration::new(), move |arguments| {
            *seen.lock().unwrap() = Some(arguments);
            Ok(ActionOutput::from(ResponseBuilder::new().no_content()))
        })
    }

    #[test]
    fn test_arguments_are_restricted_and_injected() {
        let seen = Arc::new(Mutex::new(None));
        let metadata = ActionMetadata::builder()
            .parameter("id", TypeName::INT)
            .parameter("user", TypeName::MIXED)
            .parameter("missing_attr", TypeName::MIXED)
            .parameter("avatar", TypeName::UPLOADED_FILE)
            .parameter("absent_file", TypeName::UPLOADED_FILE)
            .parameter("body", TypeName::ARRAY)
            .parameter("req", TypeName::REQUEST)
            .request_attribute("user", "auth_user")
            .request_attribute("missing_attr", "nothing")
            .uploaded_file("avatar", ["images", "avatar"])
            .uploaded_file("absent_file", ["images", "nope"])
            .parsed_body("body")
            .request_parameter("req")
            .build()
            .unwrap();
        let args: Arguments = [
            ("id".to_string(), Value::Int(7)),
            ("stray".to_string(), Value::from("dropped")),
        ]
        .into_iter()
        .collect();
        let avatar = UploadedFile::new("png-bytes").with_client_filename("me.png");
        let request = routed(capturing(seen.clone()), metadata, args)
            .with_attribute("auth_user", "ada")
            .with_uploaded_files(UploadedFileTree::new().with_file(&["images", "avatar"], avatar.clone()))
            .with_parsed_body(serde_json::json!({"k": 1}));

        let response = ActionDispatcher::new().handle(request).unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let arguments = seen.lock().unwrap().take().unwrap();
        assert_eq!(arguments.get_int("id").unwrap(), 7);
        assert!(!arguments.contains("stray"));
        assert_eq!(arguments.get_str("user").unwrap(), "ada");
        assert_eq!(arguments.get("missing_attr"), Some(&Value::Null));
        assert_eq!(arguments.get_file("avatar").unwrap(), Some(&avatar));
        assert_eq!(arguments.get("absent_file"), Some(&Value::Null));
        assert!(arguments.get("body").unwrap().as_map().is_some());
        assert_eq!(arguments.get_request("req").unwrap().attribute("auth_user"), Some(&Value::from("ada")));
    }

    #[test]
    fn test_response_results_bypass_renderer() {
        struct Refusing;
        impl ResultRenderer for Refusing {
            fn render(&self, _: &Request, _: &Value) -> CaricaResult<Option<Response>> {
                panic!("renderer must not run for responses");
            }
        }

        let action = ActionRef::from_fn("direct", ActionDeclaration::new(), |_| {
            Ok(ActionOutput::from(ResponseBuilder::new().ok("direct", None)))
        });
        let request = routed(action, ActionMetadata::default(), Arguments::new());
        let response = ActionDispatcher::new()
            .with_renderer(Arc::new(Refusing))
            .handle(request)
            .unwrap();
        assert_eq!(response.body().as_ref(), b"direct");
    }

    #[test]
    fn test_values_go_through_renderer() {
        let action = ActionRef::from_fn("value", ActionDeclaration::new(), |_| {
            Ok(ActionOutput::from(serde_json::json!({"ok": true})))
        });
        let request = routed(action, ActionMetadata::default(), Arguments::new());
        let response = ActionDispatcher::new()
            .with_renderer(Arc::new(JsonResultRenderer::new()))
            .handle(request)
            .unwrap();
        assert_eq!(response.body().as_ref(), br#"{"ok":true}"#);
    }

    #[test]
    fn test_unrendered_value_is_an_error() {
        let action = ActionRef::from_fn("value", ActionDeclaration::new(), |_| {
            Ok(ActionOutput::from(Value::from("plain")))
        });
        let request = routed(action, ActionMetadata::default(), Arguments::new());
        let error = ActionDispatcher::new().handle(request).unwrap_err();

        let CaricaError::NotRendered(fault) = error else {
            panic!("expected an unrendered result");
        };
        assert_eq!(fault.result(), &Value::from("plain"));
        assert_eq!(fault.request().path(), "/things");
        assert_eq!(fault.action().as_str(), "value");
    }

    #[test]
    fn test_action_failure_names_the_action() {
        let action = ActionRef::from_fn("failing", ActionDeclaration::new(), |_| {
            Err(anyhow::anyhow!("database unavailable"))
        });
        let request = routed(action, ActionMetadata::default(), Arguments::new());
        let error = ActionDispatcher::new().handle(request).unwrap_err();

        let report = error.report();
        assert!(report.contains("action `failing` failed"));
        assert!(report.contains("database unavailable"));
    }

    #[test]
    fn test_unresolved_metadata_is_a_fault() {
        let action = ActionRef::from_fn("x", ActionDeclaration::new(), |_| {
            Ok(ActionOutput::from(Value::Null))
        });
        let request = Request::new(Method::GET, Uri::from_static("/"))
            .with_route_outcome(RouteOutcome::Success(RouteSuccess::new(action)));
        let error = ActionDispatcher::new().handle(request).unwrap_err();
        assert!(matches!(
            error.as_configuration(),
            Some(ConfigurationFault::MetadataUnresolved { .. })
        ));
    }

    #[test]
    fn test_missing_or_unmatched_outcome_is_a_fault() {
        let bare = Request::new(Method::GET, Uri::from_static("/"));
        let error = ActionDispatcher::new().handle(bare.clone()).unwrap_err();
        assert_eq!(
            error.as_configuration(),
            Some(&ConfigurationFault::RouteOutcomeMissing { stage: STAGE })
        );

        let unmatched = bare.with_route_outcome(RouteOutcome::NotFound);
        let error = ActionDispatcher::new().handle(unmatched).unwrap_err();
        assert_eq!(
            error.as_configuration(),
            Some(&ConfigurationFault::RouteNotMatched { stage: STAGE })
        );
    }
}
