//! Core types and traits for the courier HTTP dispatcher.
//!
//! This crate provides the foundational types used by courier:
//! - [`Method`] - HTTP method enum
//! - [`Request`] and [`RequestBuilder`] - HTTP request types
//! - [`Response`] - HTTP response type
//! - [`Outcome`], [`TransportError`] and [`ErrorKind`] - result of a dispatch
//! - [`Error`] and [`Result`] - Error handling
//! - [`Fingerprint`] - Cache key for a request
//! - [`CancelSignal`] - Cooperative cancellation
//! - [`Transport`] - Single network call seam

mod body;
mod cancel;
mod error;
mod fingerprint;
mod method;
mod outcome;
pub mod prelude;
mod request;
mod response;
mod transport;

pub use body::{ContentType, from_json, to_form, to_json, to_query_string};
pub use cancel::CancelSignal;
pub use error::{Error, Result};
pub use fingerprint::Fingerprint;
pub use method::Method;
pub use outcome::{ErrorKind, Outcome, TransportError};
pub use request::{Request, RequestBuilder};
pub use response::Response;
pub use transport::Transport;

// Re-export http crate types for status codes and headers
pub use http::{StatusCode, header};
