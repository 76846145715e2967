// ABOUTME: Process-wide lookup cache for values that never change once resolved
// ABOUTME: Populated lazily on first request; entries are never evicted or invalidated

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};

pub struct LookupCache<K, V> {
    entries: Mutex<HashMap<K, Arc<OnceCell<V>>>>,
}

impl<K, V> LookupCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub async fn get(&self, key: &K) -> Option<V> {
        self.entries.lock().await.get(key)?.get().cloned()
    }

    /// Returns the cached value for `key`, running `fetch` only on a miss.
    ///
    /// Failed fetches are not cached. Concurrent callers for the same key wait
    /// for a single fetch; other keys are never blocked by it.
    pub async fn get_or_fetch<F, Fut, E>(&self, key: K, fetch: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let cell = {
            let mut entries = self.entries.lock().await;
            Arc::clone(entries.entry(key).or_default())
        };

        let value = cell.get_or_try_init(fetch).await?;
        Ok(value.clone())
    }

    /// Number of keys with a resolved value.
    pub async fn entry_count(&self) -> usize {
        self.entries
            .lock()
            .await
            .values()
            .filter(|cell| cell.initialized())
            .count()
    }
}

impl<K, V> Default for LookupCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
