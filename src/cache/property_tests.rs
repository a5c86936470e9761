//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the entry lifecycle under arbitrary operation
//! sequences, with a manual clock standing in for wall time.

use proptest::prelude::*;
use std::collections::HashSet;
use std::time::Duration;

use crate::cache::{Cache, Clock, ManualClock};
use crate::config::CacheConfig;

// == Test Configuration ==
const START_MS: u64 = 1_700_000_000_000;
const TEST_MAX_AGE_MS: u64 = 1_000;

// == Strategies ==
/// Generates keys from a small alphabet so operations collide often
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-f]{1,2}".prop_map(|s| s)
}

fn value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{0,32}".prop_map(|s| s)
}

/// A single call against the cache, or a clock movement
#[derive(Debug, Clone)]
enum CacheOp {
    Write { key: String, value: String },
    Get { key: String },
    Grab { key: String },
    Steal { key: String },
    Update { key: String, value: String },
    Purge { key: String },
    Prune,
    Advance { ms: u64 },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        3 => (key_strategy(), value_strategy())
            .prop_map(|(key, value)| CacheOp::Write { key, value }),
        2 => key_strategy().prop_map(|key| CacheOp::Get { key }),
        1 => key_strategy().prop_map(|key| CacheOp::Grab { key }),
        1 => key_strategy().prop_map(|key| CacheOp::Steal { key }),
        1 => (key_strategy(), value_strategy())
            .prop_map(|(key, value)| CacheOp::Update { key, value }),
        1 => key_strategy().prop_map(|key| CacheOp::Purge { key }),
        1 => Just(CacheOp::Prune),
        2 => (0u64..700).prop_map(|ms| CacheOp::Advance { ms }),
    ]
}

fn config_strategy() -> impl Strategy<Value = CacheConfig> {
    (
        prop::option::of(Just(Duration::from_millis(TEST_MAX_AGE_MS))),
        0usize..6,
        any::<bool>(),
    )
        .prop_map(|(max_age, max_amount, override_entries)| CacheConfig {
            max_age,
            ..CacheConfig::new()
                .with_max_amount(max_amount)
                .with_override_entries(override_entries)
        })
}

/// Applies `op`, returning whether it swept expired entries.
fn apply(
    cache: &mut Cache<String, String, ManualClock>,
    clock: &ManualClock,
    op: CacheOp,
) -> bool {
    match op {
        CacheOp::Write { key, value } => {
            // A declined write returns before sweeping
            let swept = cache.config().override_entries || !cache.has(&key);
            cache.write(key, value);
            swept
        }
        CacheOp::Get { key } => {
            let _ = cache.get(&key);
            true
        }
        CacheOp::Grab { key } => {
            let _ = cache.grab(&key);
            false
        }
        CacheOp::Steal { key } => {
            let _ = cache.steal(&key);
            true
        }
        CacheOp::Update { key, value } => {
            cache.update(&key, value);
            false
        }
        CacheOp::Purge { key } => {
            cache.purge(&key);
            false
        }
        CacheOp::Prune => {
            cache.prune();
            true
        }
        CacheOp::Advance { ms } => {
            clock.advance(Duration::from_millis(ms));
            false
        }
    }
}

fn new_cache(config: CacheConfig) -> (Cache<String, String, ManualClock>, ManualClock) {
    let clock = ManualClock::new(START_MS);
    (Cache::with_clock(config, clock.clone()), clock)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    // *For any* sequence of operations, the store never holds more than
    // `max_amount` entries once a write completes.
    #[test]
    fn prop_capacity_enforcement(
        config in config_strategy(),
        ops in prop::collection::vec(cache_op_strategy(), 1..80)
    ) {
        let max_amount = config.max_amount;
        let (mut cache, clock) = new_cache(config);

        for op in ops {
            let is_write = matches!(op, CacheOp::Write { .. });
            apply(&mut cache, &clock, op);

            if let (true, Some(limit)) = (is_write, max_amount) {
                prop_assert!(
                    cache.len() <= limit.get(),
                    "Cache size {} exceeds max {}",
                    cache.len(),
                    limit
                );
            }
        }
    }

    // *For any* sequence of operations, no entry older than `max_age`
    // survives a sweeping call.
    #[test]
    fn prop_no_stale_entry_after_sweep(
        ops in prop::collection::vec(cache_op_strategy(), 1..80)
    ) {
        let config = CacheConfig::new().with_max_age(Duration::from_millis(TEST_MAX_AGE_MS));
        let (mut cache, clock) = new_cache(config);
        let mut seen_keys = HashSet::new();

        for op in ops {
            if let CacheOp::Write { key, .. } = &op {
                seen_keys.insert(key.clone());
            }
            let swept = apply(&mut cache, &clock, op);

            if swept {
                for key in &seen_keys {
                    if let Some(age) = cache.age_of(key.as_str()) {
                        prop_assert!(
                            age <= Duration::from_millis(TEST_MAX_AGE_MS),
                            "Key '{}' survived a sweep at age {:?}",
                            key,
                            age
                        );
                    }
                }
            }
        }
    }

    // *For any* sequence of operations, hits and misses count exactly the
    // `get` and `steal` calls that found or missed a value.
    #[test]
    fn prop_statistics_accuracy(
        config in config_strategy(),
        ops in prop::collection::vec(cache_op_strategy(), 1..60)
    ) {
        let (mut cache, clock) = new_cache(config);
        let mut expected_hits: u64 = 0;
        let mut expected_misses: u64 = 0;

        for op in ops {
            match op {
                CacheOp::Get { key } => match cache.get(&key) {
                    Some(_) => expected_hits += 1,
                    None => expected_misses += 1,
                },
                CacheOp::Steal { key } => match cache.steal(&key) {
                    Some(_) => expected_hits += 1,
                    None => expected_misses += 1,
                },
                other => {
                    apply(&mut cache, &clock, other);
                }
            }
        }

        let stats = cache.stats();
        prop_assert_eq!(stats.hits, expected_hits, "Hits mismatch");
        prop_assert_eq!(stats.misses, expected_misses, "Misses mismatch");
        prop_assert_eq!(stats.total_entries, cache.len(), "Total entries mismatch");
    }

    // *For any* key and value, a write into an unbounded cache is
    // immediately readable.
    #[test]
    fn prop_roundtrip_storage(key in key_strategy(), value in value_strategy()) {
        let (mut cache, _) = new_cache(CacheConfig::new());

        cache.write(key.clone(), value.clone());

        prop_assert_eq!(cache.get(&key), Some(&value), "Round-trip value mismatch");
    }

    // *For any* occupied key, writing again keeps the first value unless
    // overriding is enabled.
    #[test]
    fn prop_override_policy(
        key in key_strategy(),
        value1 in value_strategy(),
        value2 in value_strategy(),
        override_entries in any::<bool>()
    ) {
        let config = CacheConfig::new().with_override_entries(override_entries);
        let (mut cache, _) = new_cache(config);

        cache.write(key.clone(), value1.clone());
        cache.write(key.clone(), value2.clone());

        let expected = if override_entries { value2 } else { value1 };
        prop_assert_eq!(cache.get(&key), Some(&expected));
        prop_assert_eq!(cache.len(), 1, "Should have exactly one entry");
    }

    // *For any* stored key, `steal` hands the value back once and leaves
    // the key absent.
    #[test]
    fn prop_steal_removes_entry(key in key_strategy(), value in value_strategy()) {
        let (mut cache, _) = new_cache(CacheConfig::new());

        cache.write(key.clone(), value.clone());

        prop_assert_eq!(cache.steal(&key), Some(value));
        prop_assert!(!cache.has(&key), "Key should be gone after steal");
        prop_assert_eq!(cache.steal(&key), None);
    }

    // *For any* set of distinct keys written at increasing times into a full
    // cache, the next new key evicts the first one written.
    #[test]
    fn prop_oldest_first_eviction(
        keys in prop::collection::vec("[a-z]{1,8}", 2..10),
        new_key in "[A-Z]{1,8}",
        step_ms in 1u64..1_000
    ) {
        let mut seen = HashSet::new();
        let unique_keys: Vec<String> = keys
            .into_iter()
            .filter(|key| seen.insert(key.clone()))
            .collect();
        prop_assume!(unique_keys.len() >= 2);

        let capacity = unique_keys.len();
        let (mut cache, clock) = new_cache(CacheConfig::new().with_max_amount(capacity));

        for key in &unique_keys {
            cache.write(key.clone(), format!("value_{}", key));
            clock.advance(Duration::from_millis(step_ms));
        }
        prop_assert_eq!(cache.len(), capacity, "Cache should be at capacity");

        cache.write(new_key.clone(), "new".to_string());

        prop_assert_eq!(cache.len(), capacity);
        prop_assert!(!cache.has(&unique_keys[0]), "Oldest key should have been evicted");
        prop_assert!(cache.has(&new_key), "New key should exist");
        for key in unique_keys.iter().skip(1) {
            prop_assert!(cache.has(key), "Key '{}' should still exist", key);
        }
    }

    // *For any* entry, once the clock passes `max_age` a sweeping read
    // misses while a sweep-free read still sees it.
    #[test]
    fn prop_expiration_behavior(
        key in key_strategy(),
        value in value_strategy(),
        overshoot_ms in 1u64..10_000
    ) {
        let config = CacheConfig::new().with_max_age(Duration::from_millis(TEST_MAX_AGE_MS));
        let (mut cache, clock) = new_cache(config);

        cache.write(key.clone(), value.clone());
        clock.advance(Duration::from_millis(TEST_MAX_AGE_MS + overshoot_ms));
        prop_assert!(clock.now_ms() > START_MS + TEST_MAX_AGE_MS);

        prop_assert_eq!(cache.grab(&key), Some(&value), "Grab should not sweep");
        prop_assert_eq!(cache.get(&key), None, "Entry should be expired");
        prop_assert!(!cache.has(&key));
    }
}
