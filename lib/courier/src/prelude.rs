//! Prelude module for convenient imports.
//!
//! ```ignore
//! use courier::prelude::*;
//! ```

pub use crate::{
    CancelSignal, Dispatcher, DispatcherConfig, Error, ErrorKind, Fingerprint, HyperTransport,
    Method, Outcome, Request, RequestBuilder, Response, Result, Transport, from_json, to_json,
    interceptor::{RequestInterceptor, ResponseInterceptor},
    retry::{Backoff, DefaultRetryPolicy, RetryPolicy},
};
pub use serde::{Deserialize, Serialize};
