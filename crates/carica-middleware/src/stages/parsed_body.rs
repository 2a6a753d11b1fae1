//! Request body decoding.
//!
//! Runs only when the action names a body parameter. The first registered
//! [`BodyParser`] that accepts the request's content type and the declared
//! type decodes the body:
//!
//! - a body already decoded into an object is left alone
//! - a body already decoded into a container satisfies an `array` target;
//!   for any other target it is handed to the parser under
//!   [`GENERIC_MAP_CONTENT_TYPE`]
//! - otherwise the raw body is parsed under the request's `content-type`
//!
//! A parse error answers `400 text/plain` with the parser's message.

use super::route_outcome;
use crate::body::{BodyInput, BodyParser, BodyParsers, ParseOutcome, GENERIC_MAP_CONTENT_TYPE};
use crate::middleware::{Handler, Middleware};
use carica_core::{CaricaResult, Request, Response, ResponseBuilder, RouteOutcome, Value};
use http::header::CONTENT_TYPE;

const STAGE: &str = "parsed_body";

/// Decodes the request body into the declared body parameter type.
#[derive(Debug, Clone, Default)]
pub struct ParsedBodyMiddleware {
    parsers: BodyParsers,
    responses: ResponseBuilder,
}

impl ParsedBodyMiddleware {
    /// Creates the stage; parsers are tried in registration order.
    pub fn new(parsers: BodyParsers) -> Self {
        Self {
            parsers,
            responses: ResponseBuilder::new(),
        }
    }

    fn parse_body(&self, request: &Request) -> CaricaResult<Option<ParseOutcome>> {
        let RouteOutcome::Success(success) = route_outcome(request, STAGE)? else {
            return Ok(None);
        };
        let metadata = success.resolved(STAGE)?.metadata;
        let Some(target) = metadata
            .parsed_body_parameter()
            .and_then(|parameter| metadata.parameter_type(parameter))
        else {
            return Ok(None);
        };

        let parsed = request.parsed_body();
        if matches!(parsed, Some(Value::Object(_))) {
            return Ok(None);
        }
        if target.is_container() && parsed.is_some_and(Value::is_container) {
            return Ok(None);
        }

        let (content_type, input) = match parsed {
            Some(container) if container.is_container() => (
                GENERIC_MAP_CONTENT_TYPE.to_string(),
                BodyInput::Container(container),
            ),
            _ => (request.header_line(CONTENT_TYPE), BodyInput::Raw(request.body())),
        };

        let Some(parser) = self
            .parsers
            .find(|parser| parser.can_parse(&content_type, target))
        else {
            tracing::trace!(content_type = %content_type, target = %target, "No body parser accepts request");
            return Ok(None);
        };
        Ok(Some(parser.parse(&content_type, input, target)))
    }
}

impl Middleware for ParsedBodyMiddleware {
    fn name(&self) -> &'static str {
        STAGE
    }

    fn process(&self, request: Request, next: &dyn Handler) -> CaricaResult<Response> {
        match self.parse_body(&request)? {
            Some(ParseOutcome::Parsed(body)) => next.handle(request.with_parsed_body(body)),
            Some(ParseOutcome::Error(error)) => {
                tracing::debug!(path = request.path(), error = %error, "Rejecting request body");
                Ok(self
                    .responses
                    .bad_request(error.message().to_string(), Some("text/plain")))
            }
            Some(ParseOutcome::Unchanged) | None => next.handle(request),
        }
    }
}
