use std::hash::Hash;

use hashbrown::HashMap;

/// Map with a capacity, evicting the least recently used entry on overflow.
///
/// Recency is a logical clock stamped on every hit and insert. Eviction scans
/// for the smallest stamp; capacities here are small enough that a scan beats
/// maintaining an ordered index.
#[derive(Debug)]
pub(crate) struct BoundedCache<K, V> {
    capacity: usize,
    clock: u64,
    entries: HashMap<K, (V, u64)>,
}

impl<K: Eq + Hash + Clone, V: Clone> BoundedCache<K, V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            clock: 0,
            entries: HashMap::new(),
        }
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    /// Looks `key` up and marks it as most recently used.
    pub fn get(&mut self, key: &K) -> Option<V> {
        let now = self.tick();
        let (value, stamp) = self.entries.get_mut(key)?;
        *stamp = now;
        Some(value.clone())
    }

    /// Inserts or replaces `key`, returning the entry evicted to make room.
    pub fn insert(&mut self, key: K, value: V) -> Option<(K, V)> {
        let now = self.tick();
        if let Some(slot) = self.entries.get_mut(&key) {
            *slot = (value, now);
            return None;
        }
        let evicted = if self.entries.len() >= self.capacity {
            self.evict_oldest()
        } else {
            None
        };
        self.entries.insert(key, (value, now));
        evicted
    }

    fn evict_oldest(&mut self) -> Option<(K, V)> {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, (_, stamp))| *stamp)
            .map(|(key, _)| key.clone())?;
        self.entries
            .remove_entry(&oldest)
            .map(|(key, (value, _))| (key, value))
    }

    /// Removes every entry, returning the values.
    pub fn drain(&mut self) -> Vec<V> {
        self.entries.drain().map(|(_, (value, _))| value).collect()
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evicts_least_recently_used() {
        let mut cache = BoundedCache::new(2);
        assert_eq!(cache.insert("a", 1), None);
        assert_eq!(cache.insert("b", 2), None);
        assert_eq!(cache.get(&"a"), Some(1));

        assert_eq!(cache.insert("c", 3), Some(("b", 2)));
        assert!(cache.contains_key(&"a"));
        assert!(cache.contains_key(&"c"));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_replace_does_not_evict() {
        let mut cache = BoundedCache::new(1);
        cache.insert("a", 1);
        assert_eq!(cache.insert("a", 2), None);
        assert_eq!(cache.get(&"a"), Some(2));
    }

    #[test]
    fn test_zero_capacity_holds_one() {
        let mut cache = BoundedCache::new(0);
        cache.insert(1, ());
        assert_eq!(cache.capacity(), 1);
        assert_eq!(cache.insert(2, ()), Some((1, ())));
        assert_eq!(cache.drain(), vec![()]);
        assert_eq!(cache.len(), 0);
    }
}
