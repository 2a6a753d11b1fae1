//! Standard middleware stages.
//!
//! The recommended order, outermost first:
//!
//! 1. [`exception_catcher`] - converts any failure into a 500
//! 2. [`default_content_type`] - fills missing `content-type` / `accept`
//! 3. [`enforce_head`] - strips bodies from HEAD responses
//! 4. [`routing`] - attaches the route outcome
//! 5. [`not_found`] - answers unmatched paths with 404
//! 6. [`method_not_allowed`] - answers unmatched methods with 405 (204 for OPTIONS)
//! 7. [`derive_metadata`] - resolves action metadata
//! 8. [`query_parameters`] - merges query parameters into the arguments
//! 9. [`normalize_arguments`] - coerces arguments to declared types
//! 10. [`parsed_body`] - decodes the body into the declared body type
//! 11. [`additional_middleware`] - runs per-action middleware
//!
//! The [`ActionDispatcher`](crate::ActionDispatcher) is the endpoint.
//!
//! Every stage after routing expects a route outcome on the request and
//! fails with [`ConfigurationFault::RouteOutcomeMissing`] otherwise. Stages
//! after the two routing-failure stages pass non-matching outcomes through
//! untouched.
//!
//! [`ConfigurationFault::RouteOutcomeMissing`]: carica_core::ConfigurationFault::RouteOutcomeMissing

pub mod additional_middleware;
pub mod default_content_type;
pub mod derive_metadata;
pub mod enforce_head;
pub mod exception_catcher;
pub mod method_not_allowed;
pub mod normalize_arguments;
pub mod not_found;
pub mod parsed_body;
pub mod query_parameters;
pub mod routing;

pub use additional_middleware::AdditionalMiddlewareMiddleware;
pub use default_content_type::DefaultContentTypeMiddleware;
pub use derive_metadata::DeriveMetadataMiddleware;
pub use enforce_head::EnforceHeadMiddleware;
pub use exception_catcher::ExceptionCatcherMiddleware;
pub use method_not_allowed::MethodNotAllowedMiddleware;
pub use normalize_arguments::NormalizeArgumentsMiddleware;
pub use not_found::NotFoundMiddleware;
pub use parsed_body::ParsedBodyMiddleware;
pub use query_parameters::QueryParametersMiddleware;
pub use routing::RouterMiddleware;

use carica_core::{CaricaResult, ConfigurationFault, Request, RouteOutcome};

/// Returns the request's route outcome, or the fault naming `stage`.
pub(crate) fn route_outcome<'r>(
    request: &'r Request,
    stage: &'static str,
) -> CaricaResult<&'r RouteOutcome> {
    request
        .route_outcome()
        .ok_or_else(|| ConfigurationFault::RouteOutcomeMissing { stage }.into())
}

#[cfg(test)]
pub(crate) mod testing {
    //! Helpers shared by the stage tests.

    use crate::middleware::FnHandler;
    use carica_core::{
        ActionDeclaration, ActionMetadata, ActionOutput, ActionRef, CaricaResult, Request,
        Response, ResponseBuilder, RouteOutcome, RouteSuccess, Value,
    };
    use http::{Method, Uri};
    use std::sync::{Arc, Mutex};

    /// An endpoint that answers 204 and keeps the request it saw.
    pub(crate) struct Capture {
        seen: Arc<Mutex<Option<Request>>>,
    }

    impl Capture {
        pub(crate) fn new() -> Self {
            Self {
                seen: Arc::new(Mutex::new(None)),
            }
        }

        pub(crate) fn handler(
            &self,
        ) -> FnHandler<impl Fn(Request) -> CaricaResult<Response> + Send + Sync> {
            let seen = Arc::clone(&self.seen);
            FnHandler::new(move |request| {
                *seen.lock().unwrap() = Some(request);
                Ok(ResponseBuilder::new().no_content())
            })
        }

        pub(crate) fn request(&self) -> Option<Request> {
            self.seen.lock().unwrap().clone()
        }

        pub(crate) fn success(&self) -> RouteSuccess {
            let request = self.request().expect("endpoint was not reached");
            request
                .route_outcome()
                .and_then(RouteOutcome::as_success)
                .cloned()
                .expect("request carries no success")
        }
    }

    pub(crate) fn noop_action(id: &'static str) -> ActionRef {
        ActionRef::from_fn(id, ActionDeclaration::new(), |_| {
            Ok(ActionOutput::from(Value::Null))
        })
    }

    pub(crate) fn request(method: Method, uri: &'static str) -> Request {
        Request::new(method, Uri::from_static(uri))
    }

    /// A GET request already routed to a no-op action with `metadata`.
    pub(crate) fn routed(metadata: ActionMetadata, args: Vec<(&str, Value)>) -> Request {
        let success = RouteSuccess::new(noop_action("noop"))
            .with_added_args(args.into_iter().map(|(k, v)| (k.to_string(), v)))
            .with_metadata(Arc::new(metadata));
        request(Method::GET, "/").with_route_outcome(RouteOutcome::Success(success))
    }
}
