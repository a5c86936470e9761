//! Configuration Module
//!
//! Construction-time policy for a cache: maximum entry age, maximum entry
//! count and the override rule for occupied keys.

use std::env;
use std::num::NonZeroUsize;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CacheError, Result};

/// Environment variable holding the maximum entry age in seconds
pub const ENV_MAX_AGE: &str = "CACHE_MAX_AGE";
/// Environment variable holding the maximum entry count (`0` = unbounded)
pub const ENV_MAX_AMOUNT: &str = "CACHE_MAX_AMOUNT";
/// Environment variable holding the override policy
pub const ENV_OVERRIDE_ENTRIES: &str = "CACHE_OVERRIDE_ENTRIES";

/// Cache policy parameters.
///
/// Every field is optional; the default is an unbounded cache that never
/// expires entries and declines writes to occupied keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum entry lifetime, None = entries never expire
    #[serde(with = "max_age_secs")]
    pub max_age: Option<Duration>,
    /// Maximum number of entries held at once, None = no capacity eviction
    pub max_amount: Option<NonZeroUsize>,
    /// Whether writing to an occupied key replaces its entry
    pub override_entries: bool,
}

impl CacheConfig {
    /// Creates an unbounded configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum entry lifetime.
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    /// Sets the maximum entry lifetime in whole seconds.
    pub fn with_max_age_secs(self, secs: u64) -> Self {
        self.with_max_age(Duration::from_secs(secs))
    }

    /// Sets the maximum number of entries. Zero removes the limit.
    pub fn with_max_amount(mut self, max_amount: usize) -> Self {
        self.max_amount = NonZeroUsize::new(max_amount);
        self
    }

    /// Sets whether writes replace entries under occupied keys.
    pub fn with_override_entries(mut self, override_entries: bool) -> Self {
        self.override_entries = override_entries;
        self
    }

    /// Loads a configuration from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_MAX_AGE` - Maximum entry age in seconds, fractions allowed (default: unbounded)
    /// - `CACHE_MAX_AMOUNT` - Maximum entry count, `0` = unbounded (default: unbounded)
    /// - `CACHE_OVERRIDE_ENTRIES` - `true`/`false`/`1`/`0`/`yes`/`no` (default: false)
    ///
    /// Missing variables fall back to defaults; unparsable ones are an error.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Builds a configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_MAX_AGE) {
            let max_age = raw
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
                .ok_or_else(|| CacheError::InvalidConfig {
                    var: ENV_MAX_AGE,
                    value: raw.clone(),
                    reason: "expected a non-negative number of seconds".to_string(),
                })?;
            config = config.with_max_age(max_age);
        }

        if let Some(raw) = lookup(ENV_MAX_AMOUNT) {
            let amount: usize = raw.trim().parse().map_err(|_| CacheError::InvalidConfig {
                var: ENV_MAX_AMOUNT,
                value: raw.clone(),
                reason: "expected an entry count".to_string(),
            })?;
            config = config.with_max_amount(amount);
        }

        if let Some(raw) = lookup(ENV_OVERRIDE_ENTRIES) {
            let flag = parse_flag(&raw).ok_or_else(|| CacheError::InvalidConfig {
                var: ENV_OVERRIDE_ENTRIES,
                value: raw.clone(),
                reason: "expected true or false".to_string(),
            })?;
            config = config.with_override_entries(flag);
        }

        Ok(config)
    }

    /// Maximum age in milliseconds, the unit entry timestamps use.
    pub(crate) fn max_age_ms(&self) -> Option<u64> {
        self.max_age
            .map(|age| u64::try_from(age.as_millis()).unwrap_or(u64::MAX))
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// Serializes `max_age` as fractional seconds.
mod max_age_secs {
    use std::time::Duration;

    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(age) => serializer.serialize_some(&age.as_secs_f64()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<f64>::deserialize(deserializer)?
            .map(|secs| Duration::try_from_secs_f64(secs).map_err(de::Error::custom))
            .transpose()
    }
}
