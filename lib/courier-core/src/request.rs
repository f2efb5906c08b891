//! HTTP request building.
//!
//! Use [`Request::builder`] to construct requests with headers, query parameters,
//! a body, a timeout and a cancellation signal.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use courier_core::{Method, Request};
//!
//! let request = Request::builder(Method::Get, "https://api.example.com/items".parse().unwrap())
//!     .header("Accept", "application/json")
//!     .query("page", "1")
//!     .timeout(Duration::from_secs(5))
//!     .build();
//!
//! assert_eq!(request.effective_url().as_str(), "https://api.example.com/items?page=1");
//! ```

use std::collections::HashMap;
use std::time::Duration;

use bytes::Bytes;
use url::Url;

use crate::{CancelSignal, Method};

/// An HTTP request.
///
/// Header names are case-insensitive: they are stored lowercased, so setting
/// `authorization` and then `Authorization` leaves a single header.
///
/// Query parameters are kept apart from the URL until [`effective_url`](Self::effective_url)
/// so that interceptors can edit them and fingerprints can normalize them.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    url: Url,
    headers: HashMap<String, String>,
    body: Option<Bytes>,
    query: Vec<(String, String)>,
    timeout: Option<Duration>,
    cancel: Option<CancelSignal>,
}

impl Request {
    /// Creates a new [`RequestBuilder`].
    #[must_use]
    pub fn builder(method: Method, url: Url) -> RequestBuilder {
        RequestBuilder::new(method, url)
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Request URL, without the query parameters added through the builder.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// URL with every query parameter appended, as sent on the wire.
    #[must_use]
    pub fn effective_url(&self) -> Url {
        let mut url = self.url.clone();
        if !self.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in &self.query {
                pairs.append_pair(name, value);
            }
        }
        url
    }

    /// Request headers, keyed by lowercase name.
    #[must_use]
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Single header value by name, ignoring case.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Sets a header, replacing any value stored under the same name in any case.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers
            .insert(name.into().to_ascii_lowercase(), value.into());
    }

    /// Removes a header, ignoring case. Returns its previous value.
    pub fn remove_header(&mut self, name: &str) -> Option<String> {
        self.headers.remove(&name.to_ascii_lowercase())
    }

    /// Request body.
    #[must_use]
    pub const fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Replaces the request body.
    pub fn set_body(&mut self, body: Option<Bytes>) {
        self.body = body;
    }

    /// Query parameters, in insertion order.
    #[must_use]
    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    /// Mutable access to the query parameters.
    #[must_use]
    pub fn query_mut(&mut self) -> &mut Vec<(String, String)> {
        &mut self.query
    }

    /// Per-request timeout, if set.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Cancellation signal, if set.
    #[must_use]
    pub const fn cancel_signal(&self) -> Option<&CancelSignal> {
        self.cancel.as_ref()
    }

    /// Attaches or replaces the cancellation signal.
    pub fn set_cancel_signal(&mut self, signal: CancelSignal) {
        self.cancel = Some(signal);
    }

    /// Returns `true` if a cancellation signal is attached and raised.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelSignal::is_cancelled)
    }
}

/// Builder for constructing [`Request`] instances.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    request: Request,
}

impl RequestBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            request: Request {
                method,
                url,
                headers: HashMap::new(),
                body: None,
                query: Vec::new(),
                timeout: None,
                cancel: None,
            },
        }
    }

    /// Sets a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request.set_header(name, value);
        self
    }

    /// Sets multiple headers.
    #[must_use]
    pub fn headers(mut self, headers: impl IntoIterator<Item = (String, String)>) -> Self {
        for (name, value) in headers {
            self.request.set_header(name, value);
        }
        self
    }

    /// Appends a query parameter.
    #[must_use]
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request.query.push((name.into(), value.into()));
        self
    }

    /// Appends multiple query parameters.
    #[must_use]
    pub fn query_pairs(mut self, pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        self.request.query.extend(pairs);
        self
    }

    /// Appends the fields of a serializable value as query parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be serialized as a query string.
    pub fn query_params<T: serde::Serialize>(self, value: &T) -> crate::Result<Self> {
        let encoded = crate::to_query_string(value)?;
        let pairs = url::form_urlencoded::parse(encoded.as_bytes()).into_owned();
        Ok(self.query_pairs(pairs))
    }

    /// Sets the request body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.request.body = Some(body.into());
        self
    }

    /// Sets the timeout for this request, overriding the dispatcher default.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.request.timeout = Some(timeout);
        self
    }

    /// Attaches a cancellation signal.
    #[must_use]
    pub fn cancel_signal(mut self, signal: CancelSignal) -> Self {
        self.request.cancel = Some(signal);
        self
    }

    /// Set a JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn json<T: serde::Serialize>(self, value: &T) -> crate::Result<Self> {
        let body = crate::to_json(value)?;
        Ok(self
            .header("Content-Type", crate::ContentType::Json.as_str())
            .body(body))
    }

    /// Set a form-urlencoded body.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn form<T: serde::Serialize>(self, value: &T) -> crate::Result<Self> {
        let body = crate::to_form(value)?;
        Ok(self
            .header("Content-Type", crate::ContentType::FormUrlEncoded.as_str())
            .body(body))
    }

    /// Builds the [`Request`].
    #[must_use]
    pub fn build(self) -> Request {
        self.request
    }
}
