//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with age tracking.

// == Cache Entry ==
/// A stored value together with its admission metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Creation timestamp (Unix milliseconds), reset on update
    pub created_at: u64,
    /// Admission counter, breaks ties between equal timestamps
    pub sequence: u64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new entry stamped with `now_ms`.
    pub fn new(value: V, now_ms: u64, sequence: u64) -> Self {
        Self {
            value,
            created_at: now_ms,
            sequence,
        }
    }

    // == Age ==
    /// Returns the entry age in milliseconds at `now_ms`.
    ///
    /// A clock that moved backwards yields an age of zero.
    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.created_at)
    }

    // == Is Expired ==
    /// Checks if the entry has outlived `max_age_ms` at `now_ms`.
    ///
    /// Boundary condition: an entry whose age equals `max_age_ms` exactly is
    /// still fresh; it expires once the age strictly exceeds the limit.
    pub fn is_expired(&self, now_ms: u64, max_age_ms: u64) -> bool {
        self.age_ms(now_ms) > max_age_ms
    }

    // == Eviction Rank ==
    /// Sort key for eviction: the smallest rank is the oldest entry.
    pub fn eviction_rank(&self) -> (u64, u64) {
        (self.created_at, self.sequence)
    }
}
