//! Request/outcome logging.
//!
//! Logs with the `tracing` crate. Timing is recorded by the dispatcher span,
//! so this interceptor only reports what goes out and what comes back.

use std::ops::ControlFlow;

use tracing::{debug, info, warn};

use super::{RequestInterceptor, ResponseInterceptor};
use crate::{Outcome, Request};

/// Log level for the logging interceptor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    /// Log at debug level (request/response details).
    Debug,
    /// Log at info level (summary only).
    #[default]
    Info,
}

/// Logs each request before it is sent and each final outcome.
///
/// Register it as both a request and a response interceptor, or use
/// [`DispatcherBuilder::with_logging`](crate::DispatcherBuilder::with_logging).
#[derive(Debug, Clone, Copy, Default)]
pub struct Logging {
    level: LogLevel,
}

impl Logging {
    /// Create a logging interceptor at info level.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a logging interceptor that logs at debug level, including headers.
    #[must_use]
    pub fn debug() -> Self {
        Self {
            level: LogLevel::Debug,
        }
    }

    /// The configured level.
    #[must_use]
    pub const fn level(&self) -> LogLevel {
        self.level
    }
}

impl RequestInterceptor for Logging {
    fn on_request(&self, request: Request) -> ControlFlow<Outcome, Request> {
        let method = request.method();
        let url = request.effective_url();
        match self.level {
            LogLevel::Debug => {
                debug!(
                    method = %method,
                    url = %url,
                    headers = ?request.headers(),
                    "sending request"
                );
            }
            LogLevel::Info => {
                info!(method = %method, url = %url, "sending request");
            }
        }
        ControlFlow::Continue(request)
    }
}

impl ResponseInterceptor for Logging {
    fn on_outcome(&self, outcome: Outcome) -> Outcome {
        match &outcome {
            Outcome::Success(response) => match self.level {
                LogLevel::Debug => debug!(
                    status = response.status(),
                    headers = ?response.headers(),
                    bytes = response.body().len(),
                    "request completed"
                ),
                LogLevel::Info => info!(status = response.status(), "request completed"),
            },
            Outcome::TransportError(err) => {
                warn!(kind = %err.kind(), error = %err.message(), "request failed");
            }
            Outcome::Cancelled => info!("request cancelled"),
        }
        outcome
    }
}
