//! Keyed query cache with fetch-or-reuse semantics.
//!
//! Each entry remembers the last fetched value and when it was fetched.
//! A value younger than the stale window is reused; anything older is
//! fetched again on the next [`QueryCache::ensure`]. Concurrent `ensure`
//! calls for the same key join a single in-flight fetch.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use crate::error::{QueryError, Result};
use crate::key::QueryKey;

/// Default freshness window of a cached value.
pub const DEFAULT_STALE_TIME: Duration = Duration::from_millis(5000);

type Value = Arc<dyn Any + Send + Sync>;
type SharedFetch = Shared<BoxFuture<'static, Result<Value>>>;

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

#[derive(Clone)]
struct CachedValue {
    value: Value,
    fetched_at: Instant,
    /// Stamp of the write that stored this value.
    stamp: u64,
    /// Set by `invalidate`; forces a refetch regardless of age.
    invalidated: bool,
}

struct InFlight {
    /// Taken from the same counter as write stamps when the fetch starts.
    id: u64,
    fetch: SharedFetch,
}

#[derive(Default)]
struct Entry {
    data: Option<CachedValue>,
    in_flight: Option<InFlight>,
}

// ---------------------------------------------------------------------------
// Query cache
// ---------------------------------------------------------------------------

/// Process-local query cache.
///
/// Cloning is cheap and every clone shares the same entries, so one cache
/// can be handed to the navigation controller, its loaders and the admin
/// commands alike. Tests build a fresh instance each.
#[derive(Clone)]
pub struct QueryCache {
    entries: Arc<Mutex<HashMap<QueryKey, Entry>>>,
    stale_time: Duration,
    stamps: Arc<AtomicU64>,
}

impl QueryCache {
    pub fn new(stale_time: Duration) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            stale_time,
            stamps: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Return the fresh value under `key`, fetching it when absent or stale.
    ///
    /// If a fetch for `key` is already running, this call waits for that
    /// fetch instead of starting another; `fetch` is then never invoked.
    /// Failures are handed to every waiter and are not cached. `fetch` runs
    /// outside the cache's lock and may read or write other keys.
    ///
    /// A value stored with [`QueryCache::set`] while the fetch was running
    /// is kept; the caller still receives what the fetch returned.
    pub async fn ensure<T, F, Fut>(&self, key: &QueryKey, fetch: F) -> Result<T>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        let (id, shared) = {
            let mut entries = self.entries.lock();
            let entry = entries.entry(key.clone()).or_default();

            if let Some(cached) = &entry.data {
                if self.is_fresh(cached) {
                    trace!(key = %key, "Query served from cache");
                    return downcast(key, &cached.value);
                }
            }

            match &entry.in_flight {
                Some(in_flight) => {
                    debug!(key = %key, "Joining in-flight fetch");
                    (in_flight.id, in_flight.fetch.clone())
                }
                None => {
                    let id = self.next_stamp();
                    let label = key.to_string();
                    // `fetch` is called on first poll, after the lock is released.
                    let shared = async move {
                        fetch()
                            .await
                            .map(|value| Arc::new(value) as Value)
                            .map_err(|e| QueryError::Fetch {
                                key: label,
                                error: Arc::new(e),
                            })
                    }
                    .boxed()
                    .shared();

                    entry.in_flight = Some(InFlight {
                        id,
                        fetch: shared.clone(),
                    });
                    debug!(key = %key, "Fetching query");
                    (id, shared)
                }
            }
        };

        let result = shared.await;
        self.settle(key, id, &result);
        downcast(key, &result?)
    }

    /// Read whatever is cached under `key`, fresh or not. Never fetches.
    pub fn get<T: Clone + 'static>(&self, key: &QueryKey) -> Option<T> {
        let entries = self.entries.lock();
        let cached = entries.get(key)?.data.as_ref()?;
        let value = (*cached.value).downcast_ref::<T>().cloned();
        if value.is_none() {
            warn!(key = %key, "Cached value has an unexpected type");
        }
        value
    }

    /// Store `value` under `key` as freshly fetched.
    pub fn set<T: Send + Sync + 'static>(&self, key: &QueryKey, value: T) {
        let mut entries = self.entries.lock();
        let entry = entries.entry(key.clone()).or_default();
        entry.data = Some(CachedValue {
            value: Arc::new(value),
            fetched_at: Instant::now(),
            stamp: self.next_stamp(),
            invalidated: false,
        });
        debug!(key = %key, "Query data set");
    }

    /// Mark every value under `prefix` stale. Values stay readable through
    /// [`QueryCache::get`] until the next fetch replaces them.
    ///
    /// Returns the number of entries marked.
    pub fn invalidate(&self, prefix: &QueryKey) -> usize {
        let mut entries = self.entries.lock();
        let mut marked = 0;
        for (key, entry) in entries.iter_mut() {
            if !key.starts_with(prefix) {
                continue;
            }
            if let Some(cached) = entry.data.as_mut() {
                cached.invalidated = true;
                marked += 1;
            }
        }
        if marked > 0 {
            debug!(prefix = %prefix, marked, "Invalidated queries");
        }
        marked
    }

    /// Drop the entry under `key`. A fetch still running for it will not
    /// repopulate the cache.
    pub fn remove(&self, key: &QueryKey) -> bool {
        self.entries.lock().remove(key).is_some()
    }

    /// `true` when the next `ensure` for `key` would fetch.
    pub fn is_stale(&self, key: &QueryKey) -> bool {
        let entries = self.entries.lock();
        match entries.get(key).and_then(|e| e.data.as_ref()) {
            Some(cached) => !self.is_fresh(cached),
            None => true,
        }
    }

    pub fn is_fetching(&self, key: &QueryKey) -> bool {
        let entries = self.entries.lock();
        entries
            .get(key)
            .map(|e| e.in_flight.is_some())
            .unwrap_or(false)
    }

    /// Number of keys holding a value.
    pub fn len(&self) -> usize {
        let entries = self.entries.lock();
        entries.values().filter(|e| e.data.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn next_stamp(&self) -> u64 {
        self.stamps.fetch_add(1, Ordering::Relaxed)
    }

    fn is_fresh(&self, cached: &CachedValue) -> bool {
        !cached.invalidated && cached.fetched_at.elapsed() < self.stale_time
    }

    /// Record the outcome of fetch `id`. Only the first waiter to finish
    /// writes; later waiters of the same fetch find it already settled.
    /// A value written after the fetch started is left in place.
    fn settle(&self, key: &QueryKey, id: u64, result: &Result<Value>) {
        let mut entries = self.entries.lock();
        let Some(entry) = entries.get_mut(key) else {
            return;
        };
        if entry.in_flight.as_ref().map(|f| f.id) != Some(id) {
            return;
        }
        entry.in_flight = None;

        match result {
            Ok(_) if entry.data.as_ref().is_some_and(|d| d.stamp > id) => {
                debug!(key = %key, "Query data set during fetch, keeping it");
            }
            Ok(value) => {
                entry.data = Some(CachedValue {
                    value: value.clone(),
                    fetched_at: Instant::now(),
                    stamp: id,
                    invalidated: false,
                });
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Query fetch failed");
            }
        }
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(DEFAULT_STALE_TIME)
    }
}

impl std::fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache")
            .field("entries", &self.len())
            .field("stale_time", &self.stale_time)
            .finish()
    }
}

fn downcast<T: Clone + 'static>(key: &QueryKey, value: &Value) -> Result<T> {
    (**value)
        .downcast_ref::<T>()
        .cloned()
        .ok_or_else(|| QueryError::TypeMismatch {
            key: key.to_string(),
        })
}
