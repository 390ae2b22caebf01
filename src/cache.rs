//! Bounded LRU cache shared by the deployment memoization sites.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

/// A small bounded LRU map.
///
/// One utility backs all three memoization sites in the deployer (commit
/// lookups, blob creations, tree creations) so eviction behaves the same
/// everywhere. Recency is tracked with a monotonic counter; at the sizes
/// used here (a few hundred entries) the linear eviction scan is fine.
#[derive(Debug)]
pub struct LruCache<K, V> {
    capacity: usize,
    entries: HashMap<K, (V, u64)>,
    clock: u64,
}

impl<K: Eq + Hash + Clone, V> LruCache<K, V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: HashMap::new(),
            clock: 0,
        }
    }

    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.clock += 1;
        let clock = self.clock;
        match self.entries.get_mut(key) {
            Some((value, touched)) => {
                *touched = clock;
                Some(value)
            }
            None => None,
        }
    }

    pub fn insert(&mut self, key: K, value: V) {
        self.clock += 1;
        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            self.evict_oldest();
        }
        self.entries.insert(key, (value, self.clock));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all entries. Called between deployment runs to bound memory.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn evict_oldest(&mut self) {
        if let Some(key) = self
            .entries
            .iter()
            .min_by_key(|(_, (_, touched))| *touched)
            .map(|(key, _)| key.clone())
        {
            self.entries.remove(&key);
        }
    }
}
