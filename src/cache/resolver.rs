//! Freshness cache and fallback resolver
//!
//! Given a cache key and the request that produces it, returns the freshest
//! acceptable data: a fresh cached entry, else a live fetch (which is then
//! cached), else the caller's fallback. Failures never surface as errors;
//! a failed fetch writes nothing, so the next call retries the network.

use chrono::Utc;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use super::entry::CacheEntry;
use super::key::CacheKey;
use super::store::{KeyValueStore, StoreError};
use super::transport::{FetchError, RemoteRequest, Transport};

/// Freshness window used when the caller does not specify one
pub const DEFAULT_FRESHNESS_MINS: u64 = 5;

/// Resolves cache keys against the store, the network and a fallback
#[derive(Clone)]
pub struct Resolver {
    store: Arc<dyn KeyValueStore>,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver").finish_non_exhaustive()
    }
}

impl Resolver {
    pub fn new(store: Arc<dyn KeyValueStore>, transport: Arc<dyn Transport>) -> Self {
        Self { store, transport }
    }

    /// The underlying key-value store
    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// Returns the freshest acceptable value for `key`
    ///
    /// 1. A cached entry that has not reached its expiry is returned without
    ///    touching the network.
    /// 2. Otherwise `request` is performed once; a decoded success is stored
    ///    with `expiry = now + freshness` and returned.
    /// 3. Any failure returns `fallback` as-is and leaves the store untouched.
    pub async fn resolve<T>(
        &self,
        key: &CacheKey,
        request: &RemoteRequest,
        fallback: Option<T>,
        freshness_mins: Option<u64>,
    ) -> Option<T>
    where
        T: Serialize + DeserializeOwned + Send,
    {
        let store_key = key.as_store_key();

        if let Some(entry) = self.read_entry::<T>(&store_key) {
            if entry.is_fresh_at(Utc::now()) {
                debug!(key = %store_key, "cache hit");
                return Some(entry.data);
            }
            debug!(key = %store_key, "cache entry expired");
        }

        match self.fetch_decoded::<T>(request).await {
            Ok(data) => {
                let window = freshness_mins.unwrap_or(DEFAULT_FRESHNESS_MINS);
                self.write_entry(&store_key, &data, window);
                Some(data)
            }
            Err(e) => {
                warn!(key = %store_key, error = %e, "fallback active");
                fallback
            }
        }
    }

    /// Like [`Resolver::resolve`] for callers that always have a fallback
    pub async fn resolve_or<T>(
        &self,
        key: &CacheKey,
        request: &RemoteRequest,
        fallback: T,
        freshness_mins: Option<u64>,
    ) -> T
    where
        T: Serialize + DeserializeOwned + Send + Clone,
    {
        let backup = fallback.clone();
        self.resolve(key, request, Some(fallback), freshness_mins)
            .await
            .unwrap_or(backup)
    }

    /// Reads whatever is cached for `key`, ignoring expiry
    pub fn peek_any<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        self.read_entry(&key.as_store_key()).map(|entry| entry.data)
    }

    /// Removes the entries for `keys` so the next resolve goes to the network
    pub fn invalidate(&self, keys: &[CacheKey]) {
        for key in keys {
            debug!(key = %key, "invalidating cache entry");
            self.store.remove(&key.as_store_key());
        }
    }

    /// Removes every entry whose store key starts with `prefix`
    pub fn invalidate_prefix(&self, prefix: &str) {
        debug!(prefix, "invalidating cache entries by prefix");
        self.store.remove_prefix(prefix);
    }

    async fn fetch_decoded<T: DeserializeOwned>(
        &self,
        request: &RemoteRequest,
    ) -> Result<T, FetchError> {
        debug!(url = %request.url, "fetching");
        let body = self.transport.fetch(request).await?;
        Ok(serde_json::from_str(&body)?)
    }

    fn read_entry<T: DeserializeOwned>(&self, store_key: &str) -> Option<CacheEntry<T>> {
        let text = self.store.get(store_key)?;
        match CacheEntry::from_text(&text) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(key = %store_key, error = %e, "ignoring unreadable cache entry");
                None
            }
        }
    }

    fn write_entry<T: Serialize>(&self, store_key: &str, data: &T, freshness_mins: u64) {
        let entry = CacheEntry::new(data, Utc::now(), freshness_mins);
        let result = entry
            .to_text()
            .map_err(StoreError::from)
            .and_then(|text| self.store.set(store_key, &text));
        if let Err(e) = result {
            warn!(key = %store_key, error = %e, "failed to persist cache entry");
        }
    }
}
