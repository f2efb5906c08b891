//! The transport seam.
//!
//! A [`Transport`] performs exactly one network call. Retries, caching and
//! interceptors live above it, in the dispatcher.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::{Outcome, Request};

/// Performs a single HTTP exchange.
///
/// Implementations must:
/// - answer with [`ErrorKind::Timeout`](crate::ErrorKind::Timeout) if no response
///   arrives within `timeout`;
/// - answer with [`Outcome::Cancelled`] if the request's
///   [`CancelSignal`](crate::CancelSignal) is raised before or during the call;
/// - classify error-range statuses with [`Outcome::from_response`].
///
/// The request is borrowed: a transport cannot alter what the caller handed it.
pub trait Transport: Send + Sync {
    /// Execute the request.
    fn execute(
        &self,
        request: &Request,
        timeout: Duration,
    ) -> impl Future<Output = Outcome> + Send;
}

impl<T: Transport> Transport for Arc<T> {
    fn execute(
        &self,
        request: &Request,
        timeout: Duration,
    ) -> impl Future<Output = Outcome> + Send {
        (**self).execute(request, timeout)
    }
}
