//! Dispatcher configuration types.

use std::time::Duration;

use url::Url;

/// Default number of responses kept by the cache.
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

/// Configuration for a [`Dispatcher`](crate::Dispatcher) and its default transport.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Request timeout, used when a request carries none of its own.
    pub timeout: Duration,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Maximum idle connections per host.
    pub pool_idle_per_host: usize,
    /// Idle connection timeout.
    pub pool_idle_timeout: Duration,
    /// Maximum number of cached responses. `0` disables caching.
    pub cache_capacity: usize,
    /// How long a cached response stays valid. `None` keeps it until evicted or invalidated.
    pub cache_ttl: Option<Duration>,
    /// Base URL that relative paths given to the convenience methods resolve against.
    pub base_url: Option<Url>,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            pool_idle_per_host: 32,
            pool_idle_timeout: Duration::from_secs(90),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            cache_ttl: None,
            base_url: None,
        }
    }
}

impl DispatcherConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> DispatcherConfigBuilder {
        DispatcherConfigBuilder::default()
    }
}

/// Builder for [`DispatcherConfig`].
#[derive(Debug, Clone, Default)]
pub struct DispatcherConfigBuilder {
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    pool_idle_per_host: Option<usize>,
    pool_idle_timeout: Option<Duration>,
    cache_capacity: Option<usize>,
    cache_ttl: Option<Duration>,
    base_url: Option<Url>,
}

impl DispatcherConfigBuilder {
    /// Set the default request timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the connection timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set the maximum idle connections per host.
    #[must_use]
    pub const fn pool_idle_per_host(mut self, count: usize) -> Self {
        self.pool_idle_per_host = Some(count);
        self
    }

    /// Set the idle connection timeout.
    #[must_use]
    pub const fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = Some(timeout);
        self
    }

    /// Set the cache capacity.
    #[must_use]
    pub const fn cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = Some(capacity);
        self
    }

    /// Expire cached responses after `ttl`.
    #[must_use]
    pub const fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    /// Set the base URL.
    #[must_use]
    pub fn base_url(mut self, url: Url) -> Self {
        self.base_url = Some(url);
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> DispatcherConfig {
        let defaults = DispatcherConfig::default();
        DispatcherConfig {
            timeout: self.timeout.unwrap_or(defaults.timeout),
            connect_timeout: self.connect_timeout.unwrap_or(defaults.connect_timeout),
            pool_idle_per_host: self
                .pool_idle_per_host
                .unwrap_or(defaults.pool_idle_per_host),
            pool_idle_timeout: self.pool_idle_timeout.unwrap_or(defaults.pool_idle_timeout),
            cache_capacity: self.cache_capacity.unwrap_or(defaults.cache_capacity),
            cache_ttl: self.cache_ttl.or(defaults.cache_ttl),
            base_url: self.base_url.or(defaults.base_url),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = DispatcherConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.pool_idle_per_host, 32);
        assert_eq!(config.cache_capacity, DEFAULT_CACHE_CAPACITY);
        assert!(config.cache_ttl.is_none());
        assert!(config.base_url.is_none());
    }

    #[test]
    fn builder_overrides() {
        let config = DispatcherConfig::builder()
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(5))
            .cache_capacity(8)
            .cache_ttl(Duration::from_secs(120))
            .base_url(Url::parse("https://api.example.com/v1/").expect("valid URL"))
            .build();

        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.pool_idle_per_host, 32);
        assert_eq!(config.cache_capacity, 8);
        assert_eq!(config.cache_ttl, Some(Duration::from_secs(120)));
        assert_eq!(
            config.base_url.as_ref().map(Url::as_str),
            Some("https://api.example.com/v1/")
        );
    }
}
