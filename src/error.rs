//! Error types for the cache
//!
//! Provides unified error handling using thiserror. Cache accessors never fail
//! on missing keys; errors only surface at the configuration and
//! serialization edges.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache.
#[derive(Error, Debug)]
pub enum CacheError {
    /// A configuration value was present but could not be parsed
    #[error("Invalid configuration: {var}={value:?} ({reason})")]
    InvalidConfig {
        var: &'static str,
        value: String,
        reason: String,
    },

    /// A stored value could not be serialized for memory accounting
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
