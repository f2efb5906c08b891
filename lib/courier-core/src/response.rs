//! HTTP response handling.
//!
//! [`Response`] provides access to status, headers, body and the originating
//! [`Request`], with JSON/text deserialization.
//!
//! # Example
//!
//! ```ignore
//! let items: Vec<Item> = response.json()?;
//! ```

use std::collections::HashMap;

use bytes::Bytes;

use crate::Request;

/// HTTP response with status, headers, body, and the request that produced it.
///
/// A response is immutable once constructed; [`map_body`](Self::map_body)
/// consumes it and builds a new one.
#[derive(Debug, Clone)]
pub struct Response {
    status: u16,
    headers: HashMap<String, String>,
    body: Bytes,
    request: Request,
}

impl Response {
    /// Creates a new response.
    #[must_use]
    pub fn new(
        status: u16,
        headers: HashMap<String, String>,
        body: impl Into<Bytes>,
        request: Request,
    ) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
            request,
        }
    }

    /// HTTP status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Response headers.
    #[must_use]
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Single header value by name, compared case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Response body.
    #[must_use]
    pub const fn body(&self) -> &Bytes {
        &self.body
    }

    /// The request this response answers.
    #[must_use]
    pub const fn request(&self) -> &Request {
        &self.request
    }

    /// Consume into body.
    #[must_use]
    pub fn into_body(self) -> Bytes {
        self.body
    }

    /// Consume into (status, headers, body, request).
    #[must_use]
    pub fn into_parts(self) -> (u16, HashMap<String, String>, Bytes, Request) {
        (self.status, self.headers, self.body, self.request)
    }

    /// Status is 2xx.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Status is 3xx.
    #[must_use]
    pub const fn is_redirection(&self) -> bool {
        self.status >= 300 && self.status < 400
    }

    /// Status is 4xx.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        self.status >= 400 && self.status < 500
    }

    /// Status is 5xx.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        self.status >= 500 && self.status < 600
    }

    /// Rebuild the response with a transformed body.
    #[must_use]
    pub fn map_body<F>(self, f: F) -> Self
    where
        F: FnOnce(Bytes) -> Bytes,
    {
        Self {
            body: f(self.body),
            ..self
        }
    }

    /// Deserialize the response body as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> crate::Result<T> {
        crate::from_json(&self.body)
    }

    /// Get the response body as text.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not valid UTF-8.
    pub fn text(&self) -> Result<String, std::string::FromUtf8Error> {
        String::from_utf8(self.body.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Method;

    fn request() -> Request {
        Request::builder(
            Method::Get,
            url::Url::parse("https://api.example.com/users/1").expect("valid URL"),
        )
        .build()
    }

    #[test]
    fn response_basic() {
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), "application/json".to_string());

        let response = Response::new(200, headers, r#"{"id":1}"#, request());

        assert_eq!(response.status(), 200);
        assert_eq!(response.header("Content-Type"), Some("application/json"));
        assert_eq!(response.request().method(), Method::Get);
        assert!(response.is_success());
        assert!(!response.is_client_error());
        assert!(!response.is_server_error());
    }

    #[test]
    fn response_status_checks() {
        let response = Response::new(301, HashMap::new(), Bytes::new(), request());
        assert!(response.is_redirection());

        let response = Response::new(404, HashMap::new(), Bytes::new(), request());
        assert!(response.is_client_error());

        let response = Response::new(500, HashMap::new(), Bytes::new(), request());
        assert!(response.is_server_error());
    }

    #[test]
    fn response_json() {
        #[derive(Debug, PartialEq, serde::Deserialize)]
        struct User {
            id: u64,
            name: String,
        }

        let response = Response::new(200, HashMap::new(), r#"{"id":1,"name":"test"}"#, request());

        let user: User = response.json().expect("deserialize");
        assert_eq!(
            user,
            User {
                id: 1,
                name: "test".to_string()
            }
        );
    }

    #[test]
    fn response_text() {
        let response = Response::new(200, HashMap::new(), "Hello, World!", request());
        assert_eq!(response.text().expect("text"), "Hello, World!");
    }

    #[test]
    fn response_map_body() {
        let response = Response::new(200, HashMap::new(), "test", request());
        let mapped = response.map_body(|body| Bytes::from(body.to_ascii_uppercase()));

        assert_eq!(mapped.status(), 200);
        assert_eq!(mapped.body(), &Bytes::from("TEST"));
        assert_eq!(
            mapped.request().url().as_str(),
            "https://api.example.com/users/1"
        );
    }
}
