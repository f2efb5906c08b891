//! Error types for courier.
//!
//! [`Outcome`](crate::Outcome) is what a dispatch returns; [`Error`] is what
//! building a request can fail with, and what [`Outcome::into_result`](crate::Outcome::into_result)
//! converts a failed outcome into for callers who prefer `?`.

use derive_more::{Display, Error, From};

/// Main error type for courier operations.
#[derive(Debug, Display, Error, From)]
pub enum Error {
    /// Connection-level failure: no response was received.
    #[display("network error: {_0}")]
    #[from(skip)]
    Network(#[error(not(source))] String),

    /// No response within the configured duration.
    #[display("request timeout")]
    #[from(skip)]
    Timeout,

    /// The server answered with an error status.
    #[display("HTTP error {status}: {message}")]
    #[from(skip)]
    Http {
        /// HTTP status code.
        status: u16,
        /// Error message.
        message: String,
        /// Response body, if available.
        #[error(not(source))]
        body: Option<bytes::Bytes>,
    },

    /// The caller cancelled the request.
    #[display("request cancelled")]
    #[from(skip)]
    Cancelled,

    /// A request interceptor refused to let the request through.
    #[display("rejected by interceptor: {_0}")]
    #[from(skip)]
    InterceptorRejected(#[error(not(source))] String),

    /// Invalid request configuration.
    #[display("invalid request: {_0}")]
    #[from(skip)]
    InvalidRequest(#[error(not(source))] String),

    /// JSON serialization error.
    #[display("JSON serialization error: {_0}")]
    #[from]
    JsonSerialization(serde_json::Error),

    /// JSON deserialization error with path context.
    #[display("JSON deserialization error at '{path}': {message}")]
    #[from(skip)]
    JsonDeserialization {
        /// JSON path to the error (e.g., "items.0.id").
        path: String,
        /// Error message.
        message: String,
    },

    /// Form or query string serialization error.
    #[display("form serialization error: {_0}")]
    #[from]
    FormSerialization(serde_html_form::ser::Error),

    /// URL parsing error.
    #[display("invalid URL: {_0}")]
    #[from]
    InvalidUrl(url::ParseError),
}

/// Result type alias using [`crate::Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an HTTP error from status code and message.
    #[must_use]
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
            body: None,
        }
    }

    /// Create an HTTP error with body.
    #[must_use]
    pub fn http_with_body(status: u16, message: impl Into<String>, body: bytes::Bytes) -> Self {
        Self::Http {
            status,
            message: message.into(),
            body: Some(body),
        }
    }

    /// Create a network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Create an interceptor rejection.
    #[must_use]
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::InterceptorRejected(message.into())
    }

    /// Create an invalid request error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Create a JSON deserialization error with path context.
    #[must_use]
    pub fn json_deserialization(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::JsonDeserialization {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Returns `true` if this is a timeout error.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// Returns `true` if this is a network error.
    #[must_use]
    pub const fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    /// Returns `true` if the request was cancelled.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns the HTTP status code if this is an HTTP error.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns `true` if this is a client error (4xx).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.status().is_some_and(|s| (400..500).contains(&s))
    }

    /// Returns `true` if this is a server error (5xx).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status().is_some_and(|s| (500..600).contains(&s))
    }

    /// Returns the response body if this is an HTTP error with a body.
    #[must_use]
    pub fn body(&self) -> Option<&bytes::Bytes> {
        match self {
            Self::Http { body, .. } => body.as_ref(),
            _ => None,
        }
    }

    /// Try to decode the HTTP error body as JSON.
    ///
    /// Returns `None` if there is no body or this is not an HTTP error.
    pub fn decode_body<T: serde::de::DeserializeOwned>(&self) -> Option<Result<T>> {
        self.body().map(|body| crate::from_json(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        assert_eq!(
            Error::http(404, "Not Found").to_string(),
            "HTTP error 404: Not Found"
        );
        assert_eq!(Error::Timeout.to_string(), "request timeout");
        assert_eq!(Error::Cancelled.to_string(), "request cancelled");
        assert_eq!(
            Error::network("connection refused").to_string(),
            "network error: connection refused"
        );
        assert_eq!(
            Error::rejected("missing token").to_string(),
            "rejected by interceptor: missing token"
        );
        assert_eq!(
            Error::json_deserialization("items.0.id", "invalid type").to_string(),
            "JSON deserialization error at 'items.0.id': invalid type"
        );
    }

    #[test]
    fn error_status() {
        let err = Error::http(404, "Not Found");
        assert_eq!(err.status(), Some(404));
        assert!(err.is_client_error());
        assert!(!err.is_server_error());

        let err = Error::http(503, "Service Unavailable");
        assert!(err.is_server_error());

        assert_eq!(Error::Timeout.status(), None);
        assert!(!Error::Timeout.is_client_error());
    }

    #[test]
    fn error_predicates() {
        assert!(Error::Timeout.is_timeout());
        assert!(Error::network("down").is_network());
        assert!(Error::Cancelled.is_cancelled());
        assert!(!Error::http(500, "boom").is_network());
    }

    #[test]
    fn error_decode_body() {
        #[derive(Debug, PartialEq, serde::Deserialize)]
        struct ApiError {
            error: String,
        }

        let body = bytes::Bytes::from(r#"{"error": "not found"}"#);
        let err = Error::http_with_body(404, "Not Found", body);

        let decoded = err
            .decode_body::<ApiError>()
            .expect("should have body")
            .expect("should decode");
        assert_eq!(
            decoded,
            ApiError {
                error: "not found".to_string()
            }
        );

        assert!(Error::http(404, "Not Found").decode_body::<ApiError>().is_none());
        assert!(Error::Timeout.decode_body::<ApiError>().is_none());
    }

    #[test]
    fn url_parse_error_converts() {
        let err: Error = url::Url::parse("not a url").expect_err("invalid").into();
        assert!(matches!(err, Error::InvalidUrl(_)));
    }
}
