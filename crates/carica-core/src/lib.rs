//! # Carica Core
//!
//! Core types shared by every Carica crate.
//!
//! - [`Request`] / [`Response`] - the HTTP messages stages exchange
//! - [`RouteOutcome`] - per-request routing result threaded through the chain
//! - [`ActionRef`] / [`ActionDeclaration`] - application actions and what they declare
//! - [`ActionMetadata`] - the resolved, cached description of an action
//! - [`Value`] / [`Object`] - dynamic argument values
//! - [`TypeCatalog`] - application types, their supertypes and decoders
//! - [`CaricaError`] / [`ConfigurationFault`] - error types

#![doc(html_root_url = "https://docs.rs/carica-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod action;
mod error;
mod locator;
mod metadata;
mod registry;
mod request;
pub mod response;
mod route;
mod types;
mod upload;
mod value;

pub use action::{
    Action, ActionDeclaration, ActionId, ActionOutput, ActionRef, ArgumentError, CallArguments,
    FnAction, ParameterDeclaration, ParameterMarker,
};
pub use error::{ActionResultNotRendered, CaricaError, CaricaResult, ConfigurationFault};
pub use locator::{Container, ServiceLocator};
pub use metadata::{ActionMetadata, ActionMetadataBuilder, SecurityMarker};
pub use registry::OrderedRegistry;
pub use request::Request;
pub use response::{Response, ResponseBuilder};
pub use route::{Arguments, MetadataState, ResolvedRoute, RouteOutcome, RouteSuccess, Router};
pub use types::{DeclaredType, TypeCatalog, TypeName, TypeRegistration};
pub use upload::{UploadedFile, UploadedFileNode, UploadedFileTree};
pub use value::{Object, Typed, Value};
