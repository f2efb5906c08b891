//! In-memory response cache.
//!
//! [`CacheStore`] maps a request [`Fingerprint`] to the last successful
//! response observed for it. It is bounded: once `capacity` entries are held,
//! inserting a new one evicts the least recently used. Entries never go stale
//! unless a time-to-live is configured.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use bytes::Bytes;
use lru::LruCache;
use tokio::time::Instant;

use crate::{Fingerprint, Request, Response};

/// A stored response.
#[derive(Debug, Clone)]
pub struct CachedResponse {
    status: u16,
    headers: HashMap<String, String>,
    body: Bytes,
    created_at: Instant,
}

impl CachedResponse {
    fn capture(response: &Response) -> Self {
        Self {
            status: response.status(),
            headers: response.headers().clone(),
            body: response.body().clone(),
            created_at: Instant::now(),
        }
    }

    /// Stored status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Stored body.
    #[must_use]
    pub const fn body(&self) -> &Bytes {
        &self.body
    }

    /// When the entry was written.
    #[must_use]
    pub const fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Rebuild a response answering `request`.
    #[must_use]
    pub fn into_response(self, request: Request) -> Response {
        Response::new(self.status, self.headers, self.body, request)
    }
}

/// Bounded LRU response cache, safe to share between concurrent dispatches.
///
/// Every read updates recency, so reads and writes share one lock. Concurrent
/// writes for the same fingerprint are last-write-wins.
///
/// # Example
///
/// ```ignore
/// let cache = CacheStore::new(128).with_ttl(Duration::from_secs(60));
/// cache.put(fingerprint.clone(), &response);
/// assert!(cache.get(&fingerprint).is_some());
/// cache.invalidate(&fingerprint);
/// ```
#[derive(Debug)]
pub struct CacheStore {
    // `None` when the capacity is zero
    entries: Option<Mutex<LruCache<Fingerprint, CachedResponse>>>,
    ttl: Option<Duration>,
}

impl CacheStore {
    /// Create a cache holding at most `capacity` responses. `0` disables caching.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: NonZeroUsize::new(capacity).map(|cap| Mutex::new(LruCache::new(cap))),
            ttl: None,
        }
    }

    /// Expire entries older than `ttl`.
    #[must_use]
    pub const fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    fn lock(&self) -> Option<MutexGuard<'_, LruCache<Fingerprint, CachedResponse>>> {
        self.entries
            .as_ref()
            .map(|entries| entries.lock().unwrap_or_else(PoisonError::into_inner))
    }

    fn is_expired(&self, value: &CachedResponse) -> bool {
        self.ttl
            .is_some_and(|ttl| value.created_at.elapsed() >= ttl)
    }

    /// Look up a live entry, marking it most recently used.
    ///
    /// Expired entries are dropped on the way.
    #[must_use]
    pub fn get(&self, fingerprint: &Fingerprint) -> Option<CachedResponse> {
        let mut entries = self.lock()?;
        let value = entries.get(fingerprint)?;
        if self.is_expired(value) {
            entries.pop(fingerprint);
            return None;
        }
        Some(value.clone())
    }

    /// Store `response` under `fingerprint`, replacing any previous entry.
    pub fn put(&self, fingerprint: Fingerprint, response: &Response) {
        if let Some(mut entries) = self.lock() {
            entries.put(fingerprint, CachedResponse::capture(response));
        }
    }

    /// Remove one entry. Returns `true` if it was present.
    pub fn invalidate(&self, fingerprint: &Fingerprint) -> bool {
        self.lock()
            .is_some_and(|mut entries| entries.pop(fingerprint).is_some())
    }

    /// Remove every entry.
    pub fn clear(&self) {
        if let Some(mut entries) = self.lock() {
            entries.clear();
        }
    }

    /// Returns `true` if an entry is stored, expired or not, without touching recency.
    #[must_use]
    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.lock()
            .is_some_and(|entries| entries.contains(fingerprint))
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().map_or(0, |entries| entries.len())
    }

    /// Returns `true` if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of entries.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.lock().map_or(0, |entries| entries.cap().get())
    }

    /// Configured time-to-live.
    #[must_use]
    pub const fn ttl(&self) -> Option<Duration> {
        self.ttl
    }
}
