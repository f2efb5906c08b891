//! HTTP request dispatcher with interceptors, retries and response caching.
//!
//! A [`Dispatcher`] turns one [`Request`] into one [`Outcome`]:
//!
//! - a bounded [`CacheStore`] answers repeated GETs without touching the network;
//! - [request interceptors](interceptor::RequestInterceptor) edit or reject the request;
//! - a [`Transport`] (by default [`HyperTransport`], hyper over rustls) performs the call;
//! - a [`RetryPolicy`](retry::RetryPolicy) decides whether failures are retried;
//! - [response interceptors](interceptor::ResponseInterceptor) transform the final outcome.
//!
//! # Example
//!
//! ```ignore
//! use courier::prelude::*;
//!
//! #[derive(Debug, Deserialize)]
//! struct Item {
//!     id: u64,
//!     title: String,
//! }
//!
//! let dispatcher = Dispatcher::builder()
//!     .base_url("https://api.example.com/".parse()?)
//!     .with_bearer_auth("my-token")
//!     .with_retry(2)
//!     .build();
//!
//! let request = Request::builder(Method::Get, dispatcher.url("items")?)
//!     .query("page", "1")
//!     .build();
//!
//! match dispatcher.send(request).await {
//!     Outcome::Success(response) => {
//!         let items: Vec<Item> = response.json()?;
//!     }
//!     Outcome::TransportError(err) => eprintln!("failed: {err}"),
//!     Outcome::Cancelled => {}
//! }
//! ```

mod cache;
mod config;
mod dispatcher;
pub mod interceptor;
pub mod prelude;
pub mod retry;
mod transport;

pub use cache::{CacheStore, CachedResponse};
pub use config::{DEFAULT_CACHE_CAPACITY, DispatcherConfig, DispatcherConfigBuilder};
pub use dispatcher::{Dispatcher, DispatcherBuilder};
pub use transport::HyperTransport;

// Re-export core types
pub use courier_core::{
    CancelSignal, ContentType, Error, ErrorKind, Fingerprint, Method, Outcome, Request,
    RequestBuilder, Response, Result, Transport, TransportError, from_json, to_form, to_json,
    to_query_string,
};

// Re-export http types for status codes and headers
pub use courier_core::{StatusCode, header};

pub use url;
