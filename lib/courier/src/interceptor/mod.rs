//! Request and response interceptors.
//!
//! Request interceptors run in registration order before the transport. Each
//! receives the working copy of the request and either passes it on
//! ([`ControlFlow::Continue`]) or ends the dispatch with an outcome of its own
//! ([`ControlFlow::Break`]), in which case later request interceptors and the
//! transport are skipped.
//!
//! Response interceptors run in registration order on the final, fully retried
//! outcome, success or failure.
//!
//! # Example
//!
//! ```ignore
//! use std::ops::ControlFlow;
//! use courier::{Dispatcher, Outcome};
//!
//! let dispatcher = Dispatcher::builder()
//!     .on_request(|mut request| {
//!         request.set_header("X-Client", "courier");
//!         ControlFlow::Continue(request)
//!     })
//!     .on_outcome(|outcome| match outcome {
//!         Outcome::Cancelled => Outcome::rejected("cancelled by user"),
//!         other => other,
//!     })
//!     .build();
//! ```

use std::ops::ControlFlow;
use std::sync::Arc;

use crate::{Outcome, Request};

mod auth;
mod logging;

pub use auth::BearerAuth;
pub use logging::{LogLevel, Logging};

/// Runs before the transport.
pub trait RequestInterceptor: Send + Sync {
    /// Pass the (possibly modified) request on, or short-circuit with an outcome.
    fn on_request(&self, request: Request) -> ControlFlow<Outcome, Request>;
}

impl<F> RequestInterceptor for F
where
    F: Fn(Request) -> ControlFlow<Outcome, Request> + Send + Sync,
{
    fn on_request(&self, request: Request) -> ControlFlow<Outcome, Request> {
        self(request)
    }
}

/// Runs on the final outcome.
pub trait ResponseInterceptor: Send + Sync {
    /// Observe or transform the outcome.
    fn on_outcome(&self, outcome: Outcome) -> Outcome;
}

impl<F> ResponseInterceptor for F
where
    F: Fn(Outcome) -> Outcome + Send + Sync,
{
    fn on_outcome(&self, outcome: Outcome) -> Outcome {
        self(outcome)
    }
}

/// Ordered request and response interceptors.
#[derive(Clone, Default)]
pub struct InterceptorChain {
    request: Vec<Arc<dyn RequestInterceptor>>,
    response: Vec<Arc<dyn ResponseInterceptor>>,
}

impl std::fmt::Debug for InterceptorChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterceptorChain")
            .field("request_count", &self.request.len())
            .field("response_count", &self.response.len())
            .finish()
    }
}

impl InterceptorChain {
    /// Create an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a request interceptor.
    pub fn push_request(&mut self, interceptor: Arc<dyn RequestInterceptor>) {
        self.request.push(interceptor);
    }

    /// Append a response interceptor.
    pub fn push_response(&mut self, interceptor: Arc<dyn ResponseInterceptor>) {
        self.response.push(interceptor);
    }

    /// Number of request interceptors.
    #[must_use]
    pub fn request_len(&self) -> usize {
        self.request.len()
    }

    /// Number of response interceptors.
    #[must_use]
    pub fn response_len(&self) -> usize {
        self.response.len()
    }

    /// Returns `true` if no interceptor is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.request.is_empty() && self.response.is_empty()
    }

    /// Run the request interceptors in order, stopping at the first break.
    pub fn apply_request(&self, request: Request) -> ControlFlow<Outcome, Request> {
        self.request
            .iter()
            .try_fold(request, |request, interceptor| interceptor.on_request(request))
    }

    /// Run the response interceptors in order.
    #[must_use]
    pub fn apply_response(&self, outcome: Outcome) -> Outcome {
        self.response
            .iter()
            .fold(outcome, |outcome, interceptor| interceptor.on_outcome(outcome))
    }
}
