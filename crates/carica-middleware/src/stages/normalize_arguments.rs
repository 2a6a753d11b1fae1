//! Argument type coercion.
//!
//! Every bound argument whose name matches a declared parameter is
//! converted to the declared type. Arguments that are not declared are
//! left alone; the dispatcher drops them later.
//!
//! | Declared type        | Accepted input                                            |
//! |----------------------|-----------------------------------------------------------|
//! | `string`             | any scalar; booleans become `"true"` / `"false"`          |
//! | `float`              | floats, ints, numeric strings (finite)                    |
//! | `int`                | ints, floats and numeric strings with no fractional part  |
//! | `bool`               | booleans, `0`/`1`, `true/false/yes/no/on/off` (any case)  |
//! | `array`, `mixed`     | anything, unchanged                                       |
//! | catalog type         | an assignable object, or the first loader that succeeds   |
//! | anything else        | anything, unchanged                                       |
//!
//! A failed conversion short-circuits with `400 text/plain`:
//!
//! ```text
//! The {name} parameter expects a {type}. {actual} provided.
//! ```

use super::route_outcome;
use crate::loader::ValueLoaders;
use crate::middleware::{Handler, Middleware};
use carica_core::{
    Arguments, CaricaResult, Request, Response, ResponseBuilder, RouteOutcome, TypeCatalog,
    TypeName, Value,
};
use std::sync::Arc;

const STAGE: &str = "normalize_arguments";

/// Result of converting one argument.
#[derive(Debug, Clone, PartialEq)]
enum Coercion {
    /// Already acceptable.
    Unchanged,
    /// Replaced by a converted value.
    Converted(Value),
    /// No conversion exists.
    Rejected,
}

impl From<Option<Value>> for Coercion {
    fn from(value: Option<Value>) -> Self {
        value.map_or(Self::Rejected, Self::Converted)
    }
}

/// Coerces bound arguments to their declared parameter types.
#[derive(Clone)]
pub struct NormalizeArgumentsMiddleware {
    catalog: Arc<TypeCatalog>,
    loaders: ValueLoaders,
    responses: ResponseBuilder,
}

impl NormalizeArgumentsMiddleware {
    /// Creates the stage.
    pub fn new(catalog: Arc<TypeCatalog>, loaders: ValueLoaders) -> Self {
        Self {
            catalog,
            loaders,
            responses: ResponseBuilder::new(),
        }
    }

    fn coerce(&self, value: &Value, target: &TypeName) -> Coercion {
        match target.as_str() {
            "string" => to_string(value).into(),
            "float" => to_float(value).into(),
            "int" => to_int(value).into(),
            "bool" => to_bool(value).into(),
            "array" | "mixed" => Coercion::Unchanged,
            _ if self.catalog.contains(target) => self.load(value, target),
            _ => Coercion::Unchanged,
        }
    }

    fn load(&self, value: &Value, target: &TypeName) -> Coercion {
        let actual = match value {
            Value::Object(object) => object.type_name().clone(),
            other => TypeName::new(other.debug_type()),
        };
        if self.catalog.is_assignable(&actual, target) {
            return Coercion::Unchanged;
        }

        self.loaders
            .find_map(|loader| {
                if !self.catalog.is_assignable(loader.target(), target) {
                    return None;
                }
                loader.load(value, target)
            })
            .map(Value::Object)
            .into()
    }

    fn reject(&self, name: &str, target: &TypeName, value: &Value) -> Response {
        tracing::debug!(
            parameter = name,
            expected = %target,
            actual = value.debug_type(),
            "Rejecting argument"
        );
        let message = format!(
            "The {name} parameter expects a {target}. {} provided.",
            value.debug_type()
        );
        self.responses.bad_request(message, Some("text/plain"))
    }
}

impl Middleware for NormalizeArgumentsMiddleware {
    fn name(&self) -> &'static str {
        STAGE
    }

    fn process(&self, request: Request, next: &dyn Handler) -> CaricaResult<Response> {
        let RouteOutcome::Success(success) = route_outcome(&request, STAGE)? else {
            return next.handle(request);
        };
        let route = success.resolved(STAGE)?;

        let mut converted = Arguments::new();
        for (name, value) in route.arguments {
            let Some(target) = route.metadata.parameter_type(name) else {
                continue;
            };
            match self.coerce(value, target) {
                Coercion::Unchanged => {}
                Coercion::Converted(value) => {
                    converted.insert(name.clone(), value);
                }
                Coercion::Rejected => return Ok(self.reject(name, target, value)),
            }
        }

        if converted.is_empty() {
            return next.handle(request);
        }
        let outcome = RouteOutcome::Success(success.clone().with_added_args(converted));
        next.handle(request.with_route_outcome(outcome))
    }
}

impl std::fmt::Debug for NormalizeArgumentsMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NormalizeArgumentsMiddleware")
            .field("loaders", &self.loaders.len())
            .finish_non_exhaustive()
    }
}

fn to_string(value: &Value) -> Option<Value> {
    let text = match value {
        Value::String(_) => return Some(value.clone()),
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        _ => return None,
    };
    Some(Value::String(text))
}

fn parse_float(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|f| f.is_finite())
}

fn to_float(value: &Value) -> Option<Value> {
    match value {
        Value::Float(_) => Some(value.clone()),
        #[allow(clippy::cast_precision_loss)]
        Value::Int(i) => Some(Value::Float(*i as f64)),
        Value::String(s) => parse_float(s).map(Value::Float),
        _ => None,
    }
}

/// Converts a float with no fractional part that fits in an `i64`.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn integral(f: f64) -> Option<i64> {
    let in_range = f >= i64::MIN as f64 && f < i64::MAX as f64;
    (f.is_finite() && f.fract() == 0.0 && in_range).then_some(f as i64)
}

fn to_int(value: &Value) -> Option<Value> {
    match value {
        Value::Int(_) => Some(value.clone()),
        Value::Float(f) => integral(*f).map(Value::Int),
        Value::String(s) => {
            let text = s.trim();
            text.parse::<i64>()
                .ok()
                .or_else(|| parse_float(text).and_then(integral))
                .map(Value::Int)
        }
        _ => None,
    }
}

fn to_bool(value: &Value) -> Option<Value> {
    let flag = match value {
        Value::Bool(_) => return Some(value.clone()),
        Value::Int(1) => true,
        Value::Int(0) => false,
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => return None,
        },
        _ => return None,
    };
    Some(Value::Bool(flag))
}
