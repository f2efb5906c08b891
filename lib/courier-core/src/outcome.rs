//! The tagged result of dispatching a request.

use derive_more::Display;

use crate::{Error, Response, Result};

/// Classification of a failed dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ErrorKind {
    /// Connection-level failure, no response received.
    #[display("network")]
    Network,
    /// No response within the allotted duration.
    #[display("timeout")]
    Timeout,
    /// A response arrived with an error-range status.
    #[display("HTTP {_0}")]
    HttpStatus(u16),
    /// A request interceptor short-circuited the dispatch.
    #[display("interceptor rejected")]
    InterceptorRejected,
    /// The request could not be put on the wire (bad header, bad URI).
    /// Nothing was sent.
    #[display("invalid request")]
    InvalidRequest,
}

/// A failed dispatch: what went wrong, and the response if one was received.
#[derive(Debug, Clone, Display)]
#[display("{kind}: {message}")]
pub struct TransportError {
    kind: ErrorKind,
    message: String,
    response: Option<Box<Response>>,
}

impl TransportError {
    /// Creates a transport error without a response.
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            response: None,
        }
    }

    /// Failure classification.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Human readable description.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The response that carried the error status, for [`ErrorKind::HttpStatus`].
    #[must_use]
    pub fn response(&self) -> Option<&Response> {
        self.response.as_deref()
    }

    /// HTTP status, for [`ErrorKind::HttpStatus`].
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self.kind {
            ErrorKind::HttpStatus(status) => Some(status),
            _ => None,
        }
    }
}

impl From<TransportError> for Error {
    fn from(err: TransportError) -> Self {
        match err.kind {
            ErrorKind::Network => Self::network(err.message),
            ErrorKind::Timeout => Self::Timeout,
            ErrorKind::InterceptorRejected => Self::rejected(err.message),
            ErrorKind::InvalidRequest => Self::invalid_request(err.message),
            ErrorKind::HttpStatus(status) => match err.response {
                Some(response) => Self::http_with_body(status, err.message, response.into_body()),
                None => Self::http(status, err.message),
            },
        }
    }
}

/// Result of one logical `send`. Exactly one case is active.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// A response in the success range.
    Success(Response),
    /// The dispatch failed.
    TransportError(TransportError),
    /// The caller cancelled the request.
    Cancelled,
}

impl Outcome {
    /// A connection-level failure.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::TransportError(TransportError::new(ErrorKind::Network, message))
    }

    /// A timeout after `elapsed`.
    #[must_use]
    pub fn timeout(elapsed: std::time::Duration) -> Self {
        Self::TransportError(TransportError::new(
            ErrorKind::Timeout,
            format!("no response within {elapsed:?}"),
        ))
    }

    /// A request that was refused before anything was sent.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::TransportError(TransportError::new(ErrorKind::InvalidRequest, message))
    }

    /// A short-circuit produced by a request interceptor.
    #[must_use]
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::TransportError(TransportError::new(ErrorKind::InterceptorRejected, message))
    }

    /// Classifies a received response: success range or `HttpStatus` error.
    ///
    /// Statuses below 400 count as success.
    #[must_use]
    pub fn from_response(response: Response) -> Self {
        let status = response.status();
        if status < 400 {
            return Self::Success(response);
        }
        let message = http::StatusCode::from_u16(status)
            .ok()
            .and_then(|code| code.canonical_reason())
            .unwrap_or("error status")
            .to_string();
        Self::TransportError(TransportError {
            kind: ErrorKind::HttpStatus(status),
            message,
            response: Some(Box::new(response)),
        })
    }

    /// Returns `true` for [`Outcome::Success`].
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Returns `true` for [`Outcome::Cancelled`].
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// The response, whether successful or carried by an `HttpStatus` error.
    #[must_use]
    pub fn response(&self) -> Option<&Response> {
        match self {
            Self::Success(response) => Some(response),
            Self::TransportError(err) => err.response(),
            Self::Cancelled => None,
        }
    }

    /// The transport error, if the dispatch failed.
    #[must_use]
    pub const fn error(&self) -> Option<&TransportError> {
        match self {
            Self::TransportError(err) => Some(err),
            _ => None,
        }
    }

    /// Failure classification, if the dispatch failed.
    #[must_use]
    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error().map(TransportError::kind)
    }

    /// Convert into a `Result` for use with `?`.
    ///
    /// # Errors
    ///
    /// Returns the [`Error`] matching the failed outcome.
    pub fn into_result(self) -> Result<Response> {
        match self {
            Self::Success(response) => Ok(response),
            Self::TransportError(err) => Err(err.into()),
            Self::Cancelled => Err(Error::Cancelled),
        }
    }
}

impl From<Response> for Outcome {
    fn from(response: Response) -> Self {
        Self::from_response(response)
    }
}
