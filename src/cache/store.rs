//! Cache Store Module
//!
//! Main cache engine combining HashMap storage with lazy age expiration and
//! oldest-first capacity eviction.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::cache::{CacheEntry, CacheStats, Clock, SystemClock};
use crate::config::CacheConfig;
use crate::error::Result;

// == Cache ==
/// Bounded, age-aware key-value cache.
///
/// Expired entries are removed lazily: every write and every sweeping read
/// first drops entries older than the configured maximum age. When a new key
/// is admitted into a full cache, the entry with the oldest creation
/// timestamp is evicted.
///
/// The cache has a single owner and no internal locking; wrap it in a
/// [`SharedCache`](crate::SharedCache) to share it between tasks.
#[derive(Debug)]
pub struct Cache<K, V, C = SystemClock> {
    /// Key-value storage
    entries: HashMap<K, CacheEntry<V>>,
    /// Policy the cache was built with
    config: CacheConfig,
    /// Time source for timestamps and age checks
    clock: C,
    /// Performance statistics
    stats: CacheStats,
    /// Next admission counter
    next_sequence: u64,
}

impl<K, V> Cache<K, V, SystemClock>
where
    K: Eq + Hash + Clone,
{
    // == Constructor ==
    /// Creates an empty cache using the system wall clock.
    pub fn new(config: CacheConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<K, V> Default for Cache<K, V, SystemClock>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl<K, V, C> Cache<K, V, C>
where
    K: Eq + Hash + Clone,
    C: Clock,
{
    /// Creates an empty cache reading time from `clock`.
    pub fn with_clock(config: CacheConfig, clock: C) -> Self {
        Self {
            entries: HashMap::new(),
            config,
            clock,
            stats: CacheStats::new(),
            next_sequence: 0,
        }
    }

    // == Write ==
    /// Stores a value under `key`.
    ///
    /// If the key is already present and overriding is disabled, the call is
    /// a silent no-op. Otherwise expired entries are swept, the oldest entry
    /// is evicted if a new key would overflow the capacity, and the entry is
    /// stored with a fresh timestamp.
    pub fn write(&mut self, key: K, value: V) {
        if !self.config.override_entries && self.entries.contains_key(&key) {
            trace!("Write declined: key already present");
            return;
        }

        self.sweep();

        if !self.entries.contains_key(&key) {
            self.evict_for_capacity();
        }

        let entry = CacheEntry::new(value, self.clock.now_ms(), self.take_sequence());
        self.entries.insert(key, entry);
    }

    // == Get ==
    /// Sweeps expired entries, then looks up `key`.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.sweep();

        match self.entries.get(key) {
            Some(entry) => {
                self.stats.record_hit();
                Some(&entry.value)
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Grab ==
    /// Looks up `key` without sweeping.
    ///
    /// May return a value that has outlived the maximum age but has not been
    /// swept yet.
    pub fn grab<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.get(key).map(|entry| &entry.value)
    }

    // == Steal ==
    /// Sweeps expired entries, then removes and returns the value under `key`.
    pub fn steal<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.sweep();

        match self.entries.remove(key) {
            Some(entry) => {
                self.stats.record_hit();
                Some(entry.value)
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Update ==
    /// Replaces the value under an existing key and resets its timestamp.
    ///
    /// Does nothing if the key is absent.
    pub fn update<Q>(&mut self, key: &Q, value: V)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        if !self.entries.contains_key(key) {
            trace!("Update skipped: key not present");
            return;
        }

        let created_at = self.clock.now_ms();
        let sequence = self.take_sequence();
        if let Some(entry) = self.entries.get_mut(key) {
            entry.value = value;
            entry.created_at = created_at;
            entry.sequence = sequence;
        }
    }

    // == Purge ==
    /// Removes the entry under `key` if present.
    pub fn purge<Q>(&mut self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.remove(key);
    }

    // == Has ==
    /// Checks whether `key` is present, without sweeping.
    pub fn has<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.contains_key(key)
    }

    // == Prune ==
    /// Forces a sweep of expired entries.
    ///
    /// Returns the number of entries removed.
    pub fn prune(&mut self) -> usize {
        self.sweep()
    }

    // == Age Of ==
    /// Returns how long ago the entry under `key` was written or updated.
    pub fn age_of<Q>(&self, key: &Q) -> Option<Duration>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = self.clock.now_ms();
        self.entries
            .get(key)
            .map(|entry| Duration::from_millis(entry.age_ms(now)))
    }

    // == Clear ==
    /// Removes every entry. Statistics are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    // == Length ==
    /// Returns the current number of entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    /// Returns the policy the cache was built with.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    // == Sweep ==
    /// Removes every entry older than the maximum age.
    ///
    /// Victim keys are collected first and removed in a second pass.
    fn sweep(&mut self) -> usize {
        let Some(max_age_ms) = self.config.max_age_ms() else {
            return 0;
        };
        let now = self.clock.now_ms();

        let expired_keys: Vec<K> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now, max_age_ms))
            .map(|(key, _)| key.clone())
            .collect();

        let count = expired_keys.len();

        for key in expired_keys {
            self.entries.remove(&key);
        }

        if count > 0 {
            self.stats.record_expirations(count);
            debug!(
                removed = count,
                remaining = self.entries.len(),
                "Swept expired entries"
            );
        }
        count
    }

    // == Evict For Capacity ==
    /// Evicts the oldest entry if the cache holds `max_amount` entries.
    fn evict_for_capacity(&mut self) {
        let Some(max_amount) = self.config.max_amount else {
            return;
        };
        if self.entries.len() < max_amount.get() {
            return;
        }

        let oldest_key = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.eviction_rank())
            .map(|(key, _)| key.clone());

        if let Some(key) = oldest_key {
            self.entries.remove(&key);
            self.stats.record_eviction();
            debug!(capacity = max_amount.get(), "Evicted oldest entry");
        }
    }

    // == Take Sequence ==
    /// Hands out the next admission counter.
    fn take_sequence(&mut self) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        sequence
    }
}

impl<K, V, C> Cache<K, V, C>
where
    K: Eq + Hash + Clone,
    V: Serialize,
    C: Clock,
{
    // == Consumed Memory ==
    /// Estimates the memory held by stored values, in bytes.
    ///
    /// Sweeps expired entries, then sums the length of each value serialized
    /// as JSON text. Values that fail to serialize are skipped.
    pub fn consumed_memory(&mut self) -> usize {
        self.sweep();

        self.entries
            .values()
            .filter_map(|entry| match serde_json::to_string(&entry.value) {
                Ok(text) => Some(text.len()),
                Err(err) => {
                    warn!(error = %err, "Skipping unserializable value in memory estimate");
                    None
                }
            })
            .sum()
    }

    /// Like [`consumed_memory`](Self::consumed_memory), but fails on the
    /// first value that cannot be serialized.
    pub fn try_consumed_memory(&mut self) -> Result<usize> {
        self.sweep();

        self.entries.values().try_fold(0, |total, entry| {
            Ok(total + serde_json::to_string(&entry.value)?.len())
        })
    }
}
