//! Stale-while-revalidate cache for listing pages.
//!
//! A hit returns the cached value straight away and refreshes it in the
//! background; a miss waits for the fetch. Each key refreshes on its own,
//! and at most one background refresh per key is in flight.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use osdi_core::OsdiResult;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Cache key for one page of a listing.
pub fn page_key(namespace: &str, page: u32) -> String {
    format!("{namespace}:all-{page}")
}

pub struct PageCache<T> {
    entries: Arc<RwLock<HashMap<String, T>>>,
    refreshing: Arc<Mutex<HashSet<String>>>,
}

impl<T> Default for PageCache<T> {
    fn default() -> Self {
        Self {
            entries: Arc::default(),
            refreshing: Arc::default(),
        }
    }
}

impl<T> PageCache<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached value for `key` (refreshed in the background by `fetch`),
    /// or the result of `fetch` when nothing is cached yet.
    ///
    /// Needs a tokio runtime for the background refresh.
    pub async fn fetch_and_update<F>(&self, key: &str, fetch: F) -> OsdiResult<T>
    where
        F: Future<Output = OsdiResult<T>> + Send + 'static,
    {
        let cached = self.entries.read().await.get(key).cloned();

        match cached {
            Some(value) => {
                debug!(key, "page cache hit");
                self.refresh_in_background(key, fetch);
                Ok(value)
            }
            None => {
                debug!(key, "page cache miss");
                let value = fetch.await?;
                self.entries
                    .write()
                    .await
                    .insert(key.to_string(), value.clone());
                Ok(value)
            }
        }
    }

    pub async fn get(&self, key: &str) -> Option<T> {
        self.entries.read().await.get(key).cloned()
    }

    pub async fn invalidate(&self, key: &str) {
        self.entries.write().await.remove(key);
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    fn refresh_in_background<F>(&self, key: &str, fetch: F)
    where
        F: Future<Output = OsdiResult<T>> + Send + 'static,
    {
        if !lock_set(&self.refreshing).insert(key.to_string()) {
            debug!(key, "refresh already in flight");
            return;
        }

        let entries = Arc::clone(&self.entries);
        let slot = RefreshSlot {
            refreshing: Arc::clone(&self.refreshing),
            key: key.to_string(),
        };

        tokio::spawn(async move {
            match fetch.await {
                Ok(value) => {
                    entries.write().await.insert(slot.key.clone(), value);
                }
                Err(e) => warn!(key = %slot.key, error = %e, "page refresh failed, keeping stale value"),
            }
            drop(slot);
        });
    }
}

/// Marks a key as refreshing until dropped, so a refresh that panics or is
/// cancelled still frees the key.
struct RefreshSlot {
    refreshing: Arc<Mutex<HashSet<String>>>,
    key: String,
}

impl Drop for RefreshSlot {
    fn drop(&mut self) {
        lock_set(&self.refreshing).remove(&self.key);
    }
}

fn lock_set(set: &Mutex<HashSet<String>>) -> MutexGuard<'_, HashSet<String>> {
    set.lock().unwrap_or_else(PoisonError::into_inner)
}
