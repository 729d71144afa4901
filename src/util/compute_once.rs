use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex};

use tokio::sync::OnceCell;

/// Caches values that are computed asynchronously, computing each key at most once. Concurrent
///  callers for a key that is being computed wait for that computation and share its result.
///
/// NB: Entries live as long as the cache, there is no eviction
pub struct ComputeOnceCache<K, V> {
    cells: Mutex<HashMap<K, Arc<OnceCell<V>>>>,
}
impl<K: Eq + Hash + Clone, V: Clone> ComputeOnceCache<K, V> {
    pub fn new() -> ComputeOnceCache<K, V> {
        ComputeOnceCache {
            cells: Mutex::new(HashMap::new()),
        }
    }

    pub async fn get_or_compute<F, Fut>(&self, key: K, compute: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        // the lock is only held for looking up the cell, never across an await
        let cell = self.cells.lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(key)
            .or_default()
            .clone();

        cell.get_or_init(compute).await.clone()
    }

    /// The value for a key if it was computed already
    pub fn get(&self, key: &K) -> Option<V> {
        self.cells.lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .and_then(|cell| cell.get().cloned())
    }

    /// The number of keys with a computed value
    pub fn len(&self) -> usize {
        self.cells.lock()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .filter(|cell| cell.initialized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
impl<K: Eq + Hash + Clone, V: Clone> Default for ComputeOnceCache<K, V> {
    fn default() -> Self {
        ComputeOnceCache::new()
    }
}
