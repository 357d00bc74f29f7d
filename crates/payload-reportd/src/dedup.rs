//! Bounded, time-expiring record of chat events already handled.
//!
//! The chat platform retries deliveries it considers slow, so the same event
//! timestamp can arrive more than once. Entries expire after `ttl` and the
//! cache holds at most `capacity` of them.

use std::time::Duration;

use moka::sync::Cache;

pub struct EventCache {
    seen: Cache<String, ()>,
}

impl EventCache {
    pub fn new(capacity: u64, ttl: Duration) -> Self {
        let seen = Cache::builder()
            .max_capacity(capacity.max(1))
            .time_to_live(ttl)
            .build();
        Self { seen }
    }

    /// Record `key`; true the first time it is seen within the TTL.
    pub fn first_sighting(&self, key: &str) -> bool {
        self.seen.entry(key.to_string()).or_insert(()).is_fresh()
    }

    /// Approximate number of remembered events.
    pub fn len(&self) -> u64 {
        self.seen.entry_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_is_rejected() {
        let cache = EventCache::new(8, Duration::from_secs(60));
        assert!(cache.first_sighting("1700000000.000100"));
        assert!(!cache.first_sighting("1700000000.000100"));
        assert!(cache.first_sighting("1700000000.000200"));
        cache.seen.run_pending_tasks();
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_entries_expire() {
        let cache = EventCache::new(8, Duration::from_millis(50));
        assert!(cache.first_sighting("a"));
        assert!(!cache.first_sighting("a"));
        std::thread::sleep(Duration::from_millis(120));
        assert!(cache.first_sighting("a"));
    }

    #[test]
    fn test_capacity_is_bounded() {
        let cache = EventCache::new(2, Duration::from_secs(60));
        for key in ["a", "b", "c", "d"] {
            cache.first_sighting(key);
        }
        cache.seen.run_pending_tasks();
        assert!(cache.len() <= 2);
    }
}
