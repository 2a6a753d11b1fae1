//! # Carica Test
//!
//! In-memory helpers for testing Carica pipelines: build a request, push it
//! through any [`Handler`](carica_middleware::Handler) and assert on the
//! response. Nothing touches the network.
//!
//! ```ignore
//! use carica_test::TestClient;
//! use http::StatusCode;
//!
//! let client = TestClient::new(kernel);
//! client
//!     .post("/points")
//!     .json(&serde_json::json!({"x": 3, "y": 5}))
//!     .send()?
//!     .assert_status(StatusCode::OK)
//!     .assert_json(&serde_json::json!({"x": 3, "y": 5}));
//! ```

#![doc(html_root_url = "https://docs.rs/carica-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod request;
mod response;

pub use client::{TestClient, TestClientRequest};
pub use error::TestError;
pub use request::TestRequestBuilder;
pub use response::TestResponse;
