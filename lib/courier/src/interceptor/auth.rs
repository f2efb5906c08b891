//! Bearer token authentication.

use std::ops::ControlFlow;
use std::sync::Arc;

use super::RequestInterceptor;
use crate::{Outcome, Request};

/// Adds an `Authorization: Bearer <token>` header to every outgoing request.
///
/// # Example
///
/// ```ignore
/// use courier::{Dispatcher, interceptor::BearerAuth};
///
/// let dispatcher = Dispatcher::builder()
///     .request_interceptor(BearerAuth::new("my-secret-token"))
///     .build();
/// ```
#[derive(Clone)]
pub struct BearerAuth {
    token: Arc<str>,
}

impl std::fmt::Debug for BearerAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerAuth")
            .field("token", &"<redacted>")
            .finish()
    }
}

impl BearerAuth {
    /// Create a new bearer auth interceptor with the given token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Arc::from(token.into()),
        }
    }
}

impl RequestInterceptor for BearerAuth {
    fn on_request(&self, mut request: Request) -> ControlFlow<Outcome, Request> {
        request.set_header("Authorization", format!("Bearer {}", self.token));
        ControlFlow::Continue(request)
    }
}
