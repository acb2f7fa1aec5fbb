//! Freshness cache for provider responses
//!
//! Responses are persisted in a key-value store wrapped in an expiry envelope.
//! The resolver serves fresh entries, refetches stale or missing ones, and
//! falls back to a caller-supplied value when the network is unavailable.

mod entry;
mod key;
mod resolver;
mod store;
mod transport;

pub use entry::CacheEntry;
pub use key::CacheKey;
pub use resolver::{Resolver, DEFAULT_FRESHNESS_MINS};
pub use store::{
    default_cache_root, FileStore, KeyValueStore, MemoryStore, StoreError, STORE_MARKER,
    STORE_VERSION,
};
pub use transport::{FetchError, HttpTransport, OfflineTransport, RemoteRequest, Transport};

#[cfg(test)]
pub(crate) use resolver::tests::{Reply, ScriptedTransport};
