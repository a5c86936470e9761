//! Cache Module
//!
//! Provides the in-memory cache engine with lazy age expiration and
//! oldest-first capacity eviction.

mod clock;
mod entry;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::CacheEntry;
pub use stats::CacheStats;
pub use store::Cache;
