//! Retry policies.
//!
//! A [`RetryPolicy`] decides, after a failed transport call, whether the
//! dispatcher should issue the same request again. Policies hold no per-request
//! state: the attempt counter lives in a [`RetryState`] owned by the dispatcher.

use std::time::Duration;

use crate::{ErrorKind, Outcome, Request};

/// Decides whether a failed attempt is retried.
pub trait RetryPolicy: Send + Sync {
    /// Returns `true` to re-issue `request` after `outcome`.
    ///
    /// `attempt` counts transport calls made so far, starting at 1.
    fn should_retry(&self, outcome: &Outcome, attempt: u32, request: &Request) -> bool;

    /// Delay before the next attempt. Defaults to none.
    fn backoff(&self, attempt: u32) -> Duration {
        let _ = attempt;
        Duration::ZERO
    }
}

/// Delay between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backoff {
    /// Retry immediately.
    #[default]
    None,
    /// Wait the same duration before every retry.
    Fixed(Duration),
    /// Wait `base * factor^(attempt - 1)`, capped at `max`.
    Exponential {
        /// Delay before the first retry.
        base: Duration,
        /// Multiplier applied per attempt.
        factor: u32,
        /// Upper bound.
        max: Duration,
    },
}

impl Backoff {
    /// Delay to wait after the given (1-based) attempt.
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        match *self {
            Self::None => Duration::ZERO,
            Self::Fixed(delay) => delay,
            Self::Exponential { base, factor, max } => {
                let exponent = attempt.saturating_sub(1);
                base.saturating_mul(factor.saturating_pow(exponent)).min(max)
            }
        }
    }
}

/// The default policy.
///
/// Retries `5xx` statuses until `max_retries` additional attempts have been
/// made. Never retries `4xx`, cancellations, interceptor rejections or
/// requests that could not be built.
/// Network errors and timeouts are retried only with
/// [`retry_on_network`](Self::retry_on_network).
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use courier::retry::{Backoff, DefaultRetryPolicy};
///
/// let policy = DefaultRetryPolicy::new(3)
///     .retry_on_network(true)
///     .idempotent_only(true)
///     .backoff(Backoff::Fixed(Duration::from_millis(100)));
/// ```
#[derive(Debug, Clone)]
pub struct DefaultRetryPolicy {
    max_retries: u32,
    retry_on_network: bool,
    idempotent_only: bool,
    backoff: Backoff,
}

impl Default for DefaultRetryPolicy {
    fn default() -> Self {
        Self::new(1)
    }
}

impl DefaultRetryPolicy {
    /// Create a policy allowing `max_retries` retries after the first attempt.
    #[must_use]
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            retry_on_network: false,
            idempotent_only: false,
            backoff: Backoff::None,
        }
    }

    /// Also retry network errors and timeouts.
    #[must_use]
    pub const fn retry_on_network(mut self, enabled: bool) -> Self {
        self.retry_on_network = enabled;
        self
    }

    /// Only retry idempotent methods (GET, PUT, DELETE).
    #[must_use]
    pub const fn idempotent_only(mut self, enabled: bool) -> Self {
        self.idempotent_only = enabled;
        self
    }

    /// Set the delay between attempts.
    #[must_use]
    pub const fn backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// The retry ceiling.
    #[must_use]
    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }

    fn is_retryable(&self, kind: ErrorKind) -> bool {
        match kind {
            ErrorKind::HttpStatus(status) => (500..600).contains(&status),
            ErrorKind::Network | ErrorKind::Timeout => self.retry_on_network,
            ErrorKind::InterceptorRejected | ErrorKind::InvalidRequest => false,
        }
    }
}

impl RetryPolicy for DefaultRetryPolicy {
    fn should_retry(&self, outcome: &Outcome, attempt: u32, request: &Request) -> bool {
        if attempt > self.max_retries {
            return false;
        }
        if self.idempotent_only && !request.method().is_idempotent() {
            return false;
        }
        outcome.error_kind().is_some_and(|kind| self.is_retryable(kind))
    }

    fn backoff(&self, attempt: u32) -> Duration {
        self.backoff.delay(attempt)
    }
}

/// A policy that never retries.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRetry;

impl RetryPolicy for NoRetry {
    fn should_retry(&self, _outcome: &Outcome, _attempt: u32, _request: &Request) -> bool {
        false
    }
}

/// Per-dispatch retry bookkeeping.
///
/// Owns the final request for the lifetime of the retry loop and only lends
/// it out immutably, so every attempt sends exactly the same request.
#[derive(Debug)]
pub struct RetryState {
    attempt: u32,
    last: Option<Outcome>,
    request: Request,
}

impl RetryState {
    /// Start bookkeeping for `request`. No attempt has been made yet.
    #[must_use]
    pub fn new(request: Request) -> Self {
        Self {
            attempt: 0,
            last: None,
            request,
        }
    }

    /// Transport calls made so far.
    #[must_use]
    pub const fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Outcome of the previous failed attempt, if any.
    #[must_use]
    pub const fn last_outcome(&self) -> Option<&Outcome> {
        self.last.as_ref()
    }

    /// The request every attempt sends.
    #[must_use]
    pub const fn request(&self) -> &Request {
        &self.request
    }

    /// Count a new transport call.
    pub fn begin_attempt(&mut self) {
        self.attempt = self.attempt.saturating_add(1);
    }

    /// Remember a failed outcome before retrying.
    pub fn record_failure(&mut self, outcome: Outcome) {
        self.last = Some(outcome);
    }
}
