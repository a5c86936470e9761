//! Shared Cache Handle
//!
//! Serializes access to one [`Cache`] for callers spread across tasks. The
//! engine stays lock-free; this handle owns the lock.

use std::borrow::Borrow;
use std::hash::Hash;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;

use crate::cache::{Cache, CacheStats, Clock, SystemClock};
use crate::config::CacheConfig;

/// Cloneable async handle around a cache.
///
/// Operations that sweep or mutate take the write lock; `grab`, `has`, `len`
/// and `stats` only need the read lock. Values leave the lock by clone.
pub struct SharedCache<K, V, C = SystemClock> {
    /// Lock-guarded cache engine
    inner: Arc<RwLock<Cache<K, V, C>>>,
}

impl<K, V, C> Clone for SharedCache<K, V, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V> SharedCache<K, V, SystemClock>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    // == From Config ==
    /// Creates a shared cache from configuration using the system clock.
    pub fn from_config(config: CacheConfig) -> Self {
        Self::new(Cache::new(config))
    }
}

impl<K, V, C> SharedCache<K, V, C>
where
    K: Eq + Hash + Clone,
    V: Clone,
    C: Clock,
{
    // == Constructor ==
    /// Wraps an existing cache.
    pub fn new(cache: Cache<K, V, C>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(cache)),
        }
    }

    // == Write ==
    /// Stores a value, following the cache's override and capacity rules.
    pub async fn write(&self, key: K, value: V) {
        self.inner.write().await.write(key, value);
    }

    // == Get ==
    /// Sweeps expired entries, then returns a clone of the value under `key`.
    pub async fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        // Write lock: the lookup sweeps and records stats
        self.inner.write().await.get(key).cloned()
    }

    // == Grab ==
    /// Returns a clone of the value under `key` without sweeping.
    pub async fn grab<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.read().await.grab(key).cloned()
    }

    // == Steal ==
    /// Sweeps expired entries, then removes and returns the value under `key`.
    pub async fn steal<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.write().await.steal(key)
    }

    // == Update ==
    /// Replaces the value under an existing key and resets its timestamp.
    pub async fn update<Q>(&self, key: &Q, value: V)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.write().await.update(key, value);
    }

    // == Purge ==
    /// Removes the entry under `key` if present.
    pub async fn purge<Q>(&self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.write().await.purge(key);
    }

    // == Has ==
    /// Checks whether `key` is present, without sweeping.
    pub async fn has<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.read().await.has(key)
    }

    // == Prune ==
    /// Forces a sweep and returns the number of removed entries.
    pub async fn prune(&self) -> usize {
        self.inner.write().await.prune()
    }

    // == Clear ==
    /// Removes every entry. Statistics are kept.
    pub async fn clear(&self) {
        self.inner.write().await.clear();
    }

    // == Length ==
    /// Returns the current number of entries, expired ones included.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    // == Is Empty ==
    /// Returns true if the cache holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub async fn stats(&self) -> CacheStats {
        self.inner.read().await.stats()
    }
}

impl<K, V, C> SharedCache<K, V, C>
where
    K: Eq + Hash + Clone,
    V: Clone + Serialize,
    C: Clock,
{
    // == Consumed Memory ==
    /// Best-effort size of stored values in bytes, after a sweep.
    pub async fn consumed_memory(&self) -> usize {
        self.inner.write().await.consumed_memory()
    }
}
