//! Mini Cache - An embeddable in-process key-value cache
//!
//! Provides a bounded store with lazy age expiration and oldest-first eviction.
//!
//! # Example
//! ```
//! use mini_cache::{Cache, CacheConfig};
//!
//! let config = CacheConfig::new().with_max_amount(2);
//! let mut cache: Cache<&str, i32> = Cache::new(config);
//!
//! cache.write("a", 1);
//! cache.write("b", 2);
//! cache.write("c", 3);
//!
//! assert_eq!(cache.len(), 2);
//! assert!(!cache.has("a"));
//! assert_eq!(cache.get("c"), Some(&3));
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod shared;

pub use cache::{Cache, CacheStats, Clock, ManualClock, SystemClock};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use shared::SharedCache;
