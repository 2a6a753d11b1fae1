//! Rendering of action results that are not already responses.

use carica_core::{CaricaError, CaricaResult, Request, Response, ResponseBuilder, Value};

/// Turns an action's return value into a response.
pub trait ResultRenderer: Send + Sync {
    /// Renders `result`, or returns `None` to decline.
    fn render(&self, request: &Request, result: &Value) -> CaricaResult<Option<Response>>;
}

/// Renders every serializable value as a `200 application/json` response.
///
/// Values with no JSON form, such as the request itself, fail with
/// [`CaricaError::Render`].
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonResultRenderer {
    responses: ResponseBuilder,
}

impl JsonResultRenderer {
    /// Creates a renderer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            responses: ResponseBuilder::new(),
        }
    }
}

impl ResultRenderer for JsonResultRenderer {
    fn render(&self, _request: &Request, result: &Value) -> CaricaResult<Option<Response>> {
        let body = serde_json::to_vec(result).map_err(CaricaError::Render)?;
        Ok(Some(self.responses.ok(body, Some("application/json"))))
    }
}
