//! Prelude module for convenient imports.
//!
//! ```ignore
//! use courier_core::prelude::*;
//! ```

pub use crate::{
    CancelSignal, ContentType, Error, ErrorKind, Fingerprint, Method, Outcome, Request,
    RequestBuilder, Response, Result, Transport, TransportError, from_json, to_form, to_json,
};
