use std::hash::Hash;
use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;

struct Slot<V> {
    value: V,
    expires_at: Instant,
}

/// A bounded concurrent map whose entries expire after a fixed time-to-live.
///
/// Expired entries are dropped lazily on lookup and in bulk by
/// [`TtlCache::purge_expired`]. When the map is full, expired entries are
/// purged first and then the entry closest to expiry is evicted.
pub struct TtlCache<K, V> {
    map: DashMap<K, Slot<V>>,
    ttl: Duration,
    capacity: usize,
}

impl<K: Hash + Eq + Clone, V: Clone> TtlCache<K, V> {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            map: DashMap::new(),
            ttl,
            capacity: capacity.max(1),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let now = Instant::now();
        if let Some(slot) = self.map.get(key) {
            if slot.expires_at > now {
                return Some(slot.value.clone());
            }
        } else {
            return None;
        }
        self.map.remove_if(key, |_, slot| slot.expires_at <= now);
        None
    }

    pub fn insert(&self, key: K, value: V) {
        if !self.map.contains_key(&key) && self.map.len() >= self.capacity {
            self.make_room();
        }
        self.map.insert(
            key,
            Slot {
                value,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    pub fn invalidate(&self, key: &K) -> Option<V> {
        self.map.remove(key).map(|(_, slot)| slot.value)
    }

    /// Drop every entry whose key matches `pred`.
    pub fn invalidate_if(&self, mut pred: impl FnMut(&K) -> bool) {
        self.map.retain(|k, _| !pred(k));
    }

    pub fn clear(&self) {
        self.map.clear();
    }

    /// Remove all expired entries, returning how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.map.len();
        self.map.retain(|_, slot| slot.expires_at > now);
        before.saturating_sub(self.map.len())
    }

    fn make_room(&self) {
        if self.purge_expired() > 0 && self.map.len() < self.capacity {
            return;
        }
        let victim = self
            .map
            .iter()
            .min_by_key(|e| e.value().expires_at)
            .map(|e| e.key().clone());
        if let Some(key) = victim {
            self.map.remove(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires() {
        let cache = TtlCache::new(Duration::from_secs(5), 16);
        cache.insert("/a/b.txt".to_string(), 1u64);
        assert_eq!(cache.get(&"/a/b.txt".to_string()), Some(1));

        tokio::time::advance(Duration::from_secs(6)).await;
        assert_eq!(cache.get(&"/a/b.txt".to_string()), None);
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_capacity_evicts_oldest() {
        let cache = TtlCache::new(Duration::from_secs(60), 2);
        cache.insert(1, "one");
        tokio::time::advance(Duration::from_secs(1)).await;
        cache.insert(2, "two");
        tokio::time::advance(Duration::from_secs(1)).await;
        cache.insert(3, "three");

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&1), None);
        assert_eq!(cache.get(&2), Some("two"));
        assert_eq!(cache.get(&3), Some("three"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired() {
        let cache = TtlCache::new(Duration::from_secs(1), 8);
        cache.insert(1, ());
        cache.insert(2, ());
        tokio::time::advance(Duration::from_secs(2)).await;
        cache.insert(3, ());
        assert_eq!(cache.purge_expired(), 2);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_invalidate() {
        let cache = TtlCache::new(Duration::from_secs(60), 8);
        cache.insert("/d/x".to_string(), 1);
        cache.insert("/d/y".to_string(), 2);
        cache.insert("/e".to_string(), 3);
        assert_eq!(cache.invalidate(&"/d/x".to_string()), Some(1));
        cache.invalidate_if(|k| k.starts_with("/d/"));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&"/e".to_string()), Some(3));
    }
}
