//! Keyed read-through cache with explicit invalidation.
//!
//! Each entry keeps the last good value, the last error and a generation
//! number. `invalidate` bumps the generation, so a fetch that started before
//! the invalidation stores its result but leaves the entry stale and the next
//! read goes back to the backend.

use std::collections::HashMap;
use std::hash::Hash;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKey {
    Symbols,
}

#[derive(Debug, Clone)]
pub struct Entry<V> {
    pub data: Option<V>,
    pub error: Option<String>,
    pub fetching: bool,
    stale: bool,
    generation: u64,
}

impl<V> Default for Entry<V> {
    fn default() -> Self {
        Self {
            data: None,
            error: None,
            fetching: false,
            stale: true,
            generation: 0,
        }
    }
}

#[derive(Debug)]
pub struct QueryCache<K, V> {
    entries: HashMap<K, Entry<V>>,
}

impl<K, V> Default for QueryCache<K, V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash + Clone, V> QueryCache<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &K) -> Option<&Entry<V>> {
        self.entries.get(key)
    }

    pub fn data(&self, key: &K) -> Option<&V> {
        self.entries.get(key).and_then(|e| e.data.as_ref())
    }

    pub fn is_fresh(&self, key: &K) -> bool {
        self.entries.get(key).map(|e| !e.stale).unwrap_or(false)
    }

    /// Mark a fetch as started and return the generation it belongs to.
    pub fn begin_fetch(&mut self, key: &K) -> u64 {
        let entry = self.entries.entry(key.clone()).or_default();
        entry.fetching = true;
        entry.generation
    }

    /// Record a fetch outcome. A failed fetch keeps the previous value and
    /// stays stale so the next read retries.
    pub fn store(&mut self, key: &K, generation: u64, result: Result<V, String>) {
        let entry = self.entries.entry(key.clone()).or_default();
        entry.fetching = false;
        match result {
            Ok(value) => {
                entry.data = Some(value);
                entry.error = None;
                entry.stale = entry.generation != generation;
            }
            Err(message) => {
                entry.error = Some(message);
                entry.stale = true;
            }
        }
    }

    pub fn invalidate(&mut self, key: &K) {
        let entry = self.entries.entry(key.clone()).or_default();
        entry.generation += 1;
        entry.stale = true;
    }
}
