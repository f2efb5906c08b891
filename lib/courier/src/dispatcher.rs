//! Request dispatcher: cache, interceptors, transport and retries as one `send`.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{Instrument, debug, info_span, warn};
use url::Url;

use crate::{
    CacheStore, CancelSignal, DispatcherConfig, DispatcherConfigBuilder, Fingerprint,
    HyperTransport, Method, Outcome, Request, Result, Transport,
    interceptor::{BearerAuth, InterceptorChain, Logging, RequestInterceptor, ResponseInterceptor},
    retry::{DefaultRetryPolicy, RetryPolicy, RetryState},
};

/// Orchestrates one logical request.
///
/// [`send`](Self::send) proceeds as follows:
///
/// 1. A raised cancel signal ends the dispatch with [`Outcome::Cancelled`].
/// 2. For cacheable methods, a live cache entry is returned as-is, skipping
///    interceptors and transport.
/// 3. Request interceptors run in order; a break skips straight to step 6.
/// 4. The transport is called.
/// 5. Failures go to the retry policy, which may send the same request again.
///    Interceptors are not re-run. Cancellation ends the loop.
/// 6. Response interceptors run on the final outcome.
/// 7. A final success for a cacheable method that reached the transport and
///    was not cancelled is written to the cache.
///
/// # Example
///
/// ```ignore
/// use courier::Dispatcher;
///
/// let dispatcher = Dispatcher::builder()
///     .base_url("https://api.example.com/".parse()?)
///     .with_retry(2)
///     .with_logging()
///     .build();
///
/// let items: Vec<Item> = dispatcher.get("items").await?.into_result()?.json()?;
/// ```
pub struct Dispatcher<T = HyperTransport> {
    transport: T,
    interceptors: InterceptorChain,
    retry: Arc<dyn RetryPolicy>,
    cache: Arc<CacheStore>,
    config: DispatcherConfig,
}

impl<T: Clone> Clone for Dispatcher<T> {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            interceptors: self.interceptors.clone(),
            retry: Arc::clone(&self.retry),
            cache: Arc::clone(&self.cache),
            config: self.config.clone(),
        }
    }
}

impl<T> std::fmt::Debug for Dispatcher<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("interceptors", &self.interceptors)
            .field("cache", &self.cache)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Dispatcher<HyperTransport> {
    /// Create a dispatcher with the default configuration, transport and retry policy.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create a new dispatcher builder.
    #[must_use]
    pub fn builder() -> DispatcherBuilder<HyperTransport> {
        DispatcherBuilder::default()
    }
}

impl Default for Dispatcher<HyperTransport> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Transport> Dispatcher<T> {
    /// Create a dispatcher over a custom transport, with default settings.
    #[must_use]
    pub fn with_transport(transport: T) -> Self
    where
        T: 'static,
    {
        Dispatcher::<HyperTransport>::builder()
            .transport(transport)
            .build()
    }

    /// The configuration in use.
    #[must_use]
    pub const fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// The response cache owned by this dispatcher.
    #[must_use]
    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// The underlying transport.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Send one logical request and return its final outcome.
    pub async fn send(&self, request: Request) -> Outcome {
        let span = info_span!(
            "courier.send",
            method = %request.method(),
            url = %request.effective_url(),
        );
        self.dispatch(request).instrument(span).await
    }

    async fn dispatch(&self, request: Request) -> Outcome {
        if request.is_cancelled() {
            debug!("cancelled before dispatch");
            return Outcome::Cancelled;
        }

        let fingerprint = request
            .method()
            .is_cacheable()
            .then(|| Fingerprint::of(&request));

        if let Some(cached) = fingerprint.as_ref().and_then(|key| self.cache.get(key)) {
            debug!(status = cached.status(), "served from cache");
            return Outcome::Success(cached.into_response(request));
        }

        let request = match self.interceptors.apply_request(request) {
            ControlFlow::Continue(request) => request,
            ControlFlow::Break(outcome) => {
                debug!("short-circuited by request interceptor");
                return self.interceptors.apply_response(outcome);
            }
        };

        // Interceptors may attach or replace the signal
        let cancel = request.cancel_signal().cloned();
        let timeout = request.timeout().unwrap_or(self.config.timeout);
        let started = Instant::now();
        let outcome = self.execute_with_retry(request, timeout).await;
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let outcome = self.interceptors.apply_response(outcome);

        match (&outcome, fingerprint) {
            (Outcome::Success(response), Some(key)) => {
                if cancel.as_ref().is_some_and(CancelSignal::is_cancelled) {
                    debug!(elapsed_ms, "cancelled after completion, not caching");
                } else {
                    self.cache.put(key, response);
                    debug!(elapsed_ms, status = response.status(), "completed, cached");
                }
            }
            (Outcome::Success(response), None) => {
                debug!(elapsed_ms, status = response.status(), "completed");
            }
            (Outcome::TransportError(err), _) => {
                debug!(elapsed_ms, kind = %err.kind(), error = %err.message(), "failed");
            }
            (Outcome::Cancelled, _) => debug!(elapsed_ms, "cancelled"),
        }

        outcome
    }

    async fn execute_with_retry(&self, request: Request, timeout: Duration) -> Outcome {
        let mut state = RetryState::new(request);
        loop {
            if state.request().is_cancelled() {
                return Outcome::Cancelled;
            }
            state.begin_attempt();
            let outcome = self.transport.execute(state.request(), timeout).await;

            if outcome.is_success() || outcome.is_cancelled() {
                return outcome;
            }

            let attempt = state.attempt();
            if !self.retry.should_retry(&outcome, attempt, state.request()) {
                return outcome;
            }

            if let Some(err) = outcome.error() {
                warn!(attempt, kind = %err.kind(), error = %err.message(), "retrying request");
            }
            let delay = self.retry.backoff(attempt);
            state.record_failure(outcome);

            if !delay.is_zero() {
                match state.request().cancel_signal() {
                    Some(signal) => {
                        tokio::select! {
                            biased;
                            () = signal.cancelled() => return Outcome::Cancelled,
                            () = tokio::time::sleep(delay) => {}
                        }
                    }
                    None => tokio::time::sleep(delay).await,
                }
            }
        }
    }

    /// Resolve a path against the configured base URL, or parse it as absolute.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`](crate::Error::InvalidUrl) if the result is not a valid URL.
    pub fn url(&self, path: &str) -> Result<Url> {
        let url = match &self.config.base_url {
            Some(base) => base.join(path)?,
            None => Url::parse(path)?,
        };
        Ok(url)
    }

    /// Send a GET request.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` does not resolve to a valid URL. Dispatch
    /// failures are reported in the [`Outcome`].
    pub async fn get(&self, path: &str) -> Result<Outcome> {
        let request = Request::builder(Method::Get, self.url(path)?).build();
        Ok(self.send(request).await)
    }

    /// Send a DELETE request.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` does not resolve to a valid URL.
    pub async fn delete(&self, path: &str) -> Result<Outcome> {
        let request = Request::builder(Method::Delete, self.url(path)?).build();
        Ok(self.send(request).await)
    }

    /// Send a POST request with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or serialization fails.
    pub async fn post_json<B: serde::Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Outcome> {
        self.send_json(Method::Post, path, body).await
    }

    /// Send a PUT request with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or serialization fails.
    pub async fn put_json<B: serde::Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Outcome> {
        self.send_json(Method::Put, path, body).await
    }

    /// Send a PATCH request with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or serialization fails.
    pub async fn patch_json<B: serde::Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Outcome> {
        self.send_json(Method::Patch, path, body).await
    }

    async fn send_json<B: serde::Serialize + Sync>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<Outcome> {
        let request = Request::builder(method, self.url(path)?).json(body)?.build();
        Ok(self.send(request).await)
    }
}

type TransportFactory<T> = Box<dyn FnOnce(&DispatcherConfig) -> T + Send>;

/// Builder for [`Dispatcher`].
///
/// # Example
///
/// ```ignore
/// use std::time::Duration;
/// use courier::Dispatcher;
///
/// let dispatcher = Dispatcher::builder()
///     .timeout(Duration::from_secs(10))
///     .cache_capacity(512)
///     .with_bearer_auth("token")
///     .with_retry(3)
///     .build();
/// ```
pub struct DispatcherBuilder<T = HyperTransport> {
    config: DispatcherConfigBuilder,
    transport: TransportFactory<T>,
    interceptors: InterceptorChain,
    retry: Arc<dyn RetryPolicy>,
}

impl Default for DispatcherBuilder<HyperTransport> {
    fn default() -> Self {
        Self {
            config: DispatcherConfigBuilder::default(),
            transport: Box::new(HyperTransport::with_config),
            interceptors: InterceptorChain::new(),
            retry: Arc::new(DefaultRetryPolicy::default()),
        }
    }
}

impl<T> std::fmt::Debug for DispatcherBuilder<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatcherBuilder")
            .field("config", &self.config)
            .field("interceptors", &self.interceptors)
            .finish_non_exhaustive()
    }
}

impl<T: Transport> DispatcherBuilder<T> {
    // ========================================================================
    // Core Configuration
    // ========================================================================

    /// Replace the whole configuration.
    #[must_use]
    pub fn config(mut self, config: DispatcherConfigBuilder) -> Self {
        self.config = config;
        self
    }

    /// Set the default request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.timeout(timeout);
        self
    }

    /// Set the connection timeout of the default transport.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.connect_timeout(timeout);
        self
    }

    /// Set the cache capacity. `0` disables caching.
    #[must_use]
    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.config = self.config.cache_capacity(capacity);
        self
    }

    /// Expire cached responses after `ttl`.
    #[must_use]
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.config = self.config.cache_ttl(ttl);
        self
    }

    /// Set the base URL used by the convenience methods.
    #[must_use]
    pub fn base_url(mut self, url: Url) -> Self {
        self.config = self.config.base_url(url);
        self
    }

    /// Use a custom transport instead of [`HyperTransport`].
    #[must_use]
    pub fn transport<U: Transport + 'static>(self, transport: U) -> DispatcherBuilder<U> {
        DispatcherBuilder {
            config: self.config,
            transport: Box::new(move |_config: &DispatcherConfig| transport),
            interceptors: self.interceptors,
            retry: self.retry,
        }
    }

    // ========================================================================
    // Interceptors
    // ========================================================================

    /// Append a request interceptor.
    #[must_use]
    pub fn request_interceptor(mut self, interceptor: impl RequestInterceptor + 'static) -> Self {
        self.interceptors.push_request(Arc::new(interceptor));
        self
    }

    /// Append a response interceptor.
    #[must_use]
    pub fn response_interceptor(
        mut self,
        interceptor: impl ResponseInterceptor + 'static,
    ) -> Self {
        self.interceptors.push_response(Arc::new(interceptor));
        self
    }

    /// Append a request interceptor written as a closure.
    #[must_use]
    pub fn on_request<F>(self, f: F) -> Self
    where
        F: Fn(Request) -> ControlFlow<Outcome, Request> + Send + Sync + 'static,
    {
        self.request_interceptor(f)
    }

    /// Append a response interceptor written as a closure.
    #[must_use]
    pub fn on_outcome<F>(self, f: F) -> Self
    where
        F: Fn(Outcome) -> Outcome + Send + Sync + 'static,
    {
        self.response_interceptor(f)
    }

    /// Add bearer token authentication.
    #[must_use]
    pub fn with_bearer_auth(self, token: impl Into<String>) -> Self {
        self.request_interceptor(BearerAuth::new(token))
    }

    /// Add request/outcome logging at info level.
    #[must_use]
    pub fn with_logging(self) -> Self {
        self.request_interceptor(Logging::new())
            .response_interceptor(Logging::new())
    }

    /// Add debug-level logging (includes headers).
    #[must_use]
    pub fn with_debug_logging(self) -> Self {
        self.request_interceptor(Logging::debug())
            .response_interceptor(Logging::debug())
    }

    // ========================================================================
    // Retry
    // ========================================================================

    /// Use a custom retry policy.
    #[must_use]
    pub fn retry_policy(mut self, policy: impl RetryPolicy + 'static) -> Self {
        self.retry = Arc::new(policy);
        self
    }

    /// Use the default policy with the given retry ceiling.
    #[must_use]
    pub fn with_retry(self, max_retries: u32) -> Self {
        self.retry_policy(DefaultRetryPolicy::new(max_retries))
    }

    // ========================================================================
    // Build
    // ========================================================================

    /// Build the dispatcher.
    #[must_use]
    pub fn build(self) -> Dispatcher<T> {
        let config = self.config.build();
        let transport = (self.transport)(&config);

        let mut cache = CacheStore::new(config.cache_capacity);
        if let Some(ttl) = config.cache_ttl {
            cache = cache.with_ttl(ttl);
        }

        Dispatcher {
            transport,
            interceptors: self.interceptors,
            retry: self.retry,
            cache: Arc::new(cache),
            config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatcher_default() {
        let dispatcher = Dispatcher::new();
        assert_eq!(dispatcher.config().timeout, Duration::from_secs(30));
        assert_eq!(dispatcher.cache().capacity(), 256);
        assert!(dispatcher.cache().is_empty());
    }

    #[test]
    fn builder_applies_config() {
        let dispatcher = Dispatcher::builder()
            .timeout(Duration::from_secs(5))
            .cache_capacity(3)
            .cache_ttl(Duration::from_secs(30))
            .with_logging()
            .with_bearer_auth("token")
            .build();

        assert_eq!(dispatcher.config().timeout, Duration::from_secs(5));
        assert_eq!(dispatcher.cache().capacity(), 3);
        assert_eq!(dispatcher.cache().ttl(), Some(Duration::from_secs(30)));
        assert_eq!(dispatcher.interceptors.request_len(), 2);
        assert_eq!(dispatcher.interceptors.response_len(), 1);
    }

    #[test]
    fn url_resolution() {
        let dispatcher = Dispatcher::builder()
            .base_url(Url::parse("https://api.example.com/v1/").expect("valid URL"))
            .build();
        assert_eq!(
            dispatcher.url("items?page=2").expect("url").as_str(),
            "https://api.example.com/v1/items?page=2"
        );

        let dispatcher = Dispatcher::new();
        assert!(dispatcher.url("items").is_err());
        assert_eq!(
            dispatcher.url("https://other.example.com/x").expect("url").as_str(),
            "https://other.example.com/x"
        );
    }

    #[test]
    fn clones_share_the_cache() {
        let dispatcher = Dispatcher::new();
        let clone = dispatcher.clone();
        assert!(Arc::ptr_eq(&dispatcher.cache, &clone.cache));
    }

    #[test]
    fn dispatcher_is_debug() {
        let debug = format!("{:?}", Dispatcher::new());
        assert!(debug.contains("Dispatcher"));
    }
}
