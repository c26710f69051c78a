use std::collections::HashMap;
use std::future::Future;
use std::hash::BuildHasherDefault;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use cardsearch_core::config::CacheSettings;
use cardsearch_core::SearchResult;
use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::time::Instant;
use tracing::debug;
use twox_hash::XxHash64;

use crate::key::CacheKey;

type XxMap<K, V> = HashMap<K, V, BuildHasherDefault<XxHash64>>;
type InFlight<V> = Shared<BoxFuture<'static, Arc<V>>>;

/// Decides whether a fetched value may be stored. Fetches that failed
/// partway still reach their waiters but are not kept.
pub trait Cacheable {
    fn cacheable(&self) -> bool { true }
}

impl Cacheable for Vec<SearchResult> {}

#[derive(Debug)]
pub struct CacheEntry<V> {
    pub value: Arc<V>,
    pub fetched_at: Instant,
}

impl<V> Clone for CacheEntry<V> {
    fn clone(&self) -> Self { Self { value: self.value.clone(), fetched_at: self.fetched_at } }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Lookups that attached to a fetch already in flight.
    pub joined: u64,
    pub evictions: u64,
}

struct Inner<V> {
    entries: XxMap<CacheKey, CacheEntry<V>>,
    in_flight: XxMap<CacheKey, (u64, InFlight<V>)>,
    next_flight: u64,
    stats: CacheStats,
}

/// Shared handle; clones see the same entries.
pub struct QueryCache<V> {
    inner: Arc<Mutex<Inner<V>>>,
    fresh_for: Duration,
    evict_after: Duration,
}

impl<V> Clone for QueryCache<V> {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone(), fresh_for: self.fresh_for, evict_after: self.evict_after }
    }
}

impl<V> Default for QueryCache<V>
where
    V: Cacheable + Send + Sync + 'static,
{
    fn default() -> Self { Self::from_settings(&CacheSettings::default()) }
}

impl<V> QueryCache<V>
where
    V: Cacheable + Send + Sync + 'static,
{
    pub fn new(fresh_for: Duration, evict_after: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                entries: XxMap::default(),
                in_flight: XxMap::default(),
                next_flight: 0,
                stats: CacheStats::default(),
            })),
            fresh_for,
            evict_after: evict_after.max(fresh_for),
        }
    }

    pub fn from_settings(settings: &CacheSettings) -> Self {
        Self::new(Duration::from_secs(settings.fresh_secs), Duration::from_secs(settings.evict_secs))
    }

    fn lock(&self) -> MutexGuard<'_, Inner<V>> { self.inner.lock().unwrap_or_else(PoisonError::into_inner) }

    /// Fresh value for `key`, if any. Entries past the eviction window are dropped here.
    pub fn get(&self, key: &CacheKey) -> Option<Arc<V>> {
        let mut inner = self.lock();
        self.read_fresh(&mut inner, key, Instant::now())
    }

    /// Full entry regardless of freshness (until evicted).
    pub fn entry(&self, key: &CacheKey) -> Option<CacheEntry<V>> { self.lock().entries.get(key).cloned() }

    pub fn set(&self, key: CacheKey, value: V) {
        let mut inner = self.lock();
        let now = Instant::now();
        self.sweep_locked(&mut inner, now);
        inner.entries.insert(key, CacheEntry { value: Arc::new(value), fetched_at: now });
    }

    /// Drop the entry for `key` and forget any in-flight fetch for it, so a
    /// fetch that completes later does not repopulate the key.
    pub fn invalidate(&self, key: &CacheKey) -> bool {
        let mut inner = self.lock();
        let had_flight = inner.in_flight.remove(key).is_some();
        inner.entries.remove(key).is_some() || had_flight
    }

    pub fn invalidate_where<P>(&self, mut predicate: P) -> usize
    where
        P: FnMut(&CacheKey) -> bool,
    {
        let mut inner = self.lock();
        let before = inner.entries.len();
        inner.entries.retain(|k, _| !predicate(k));
        inner.in_flight.retain(|k, _| !predicate(k));
        before - inner.entries.len()
    }

    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.in_flight.clear();
    }

    /// Remove every entry older than the eviction window.
    pub fn sweep(&self) -> usize {
        let mut inner = self.lock();
        self.sweep_locked(&mut inner, Instant::now())
    }

    pub fn len(&self) -> usize { self.lock().entries.len() }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    pub fn stats(&self) -> CacheStats { self.lock().stats }

    pub fn in_flight(&self, key: &CacheKey) -> bool { self.lock().in_flight.contains_key(key) }

    /// Serve a fresh entry, join an in-flight fetch, or start `fetch`.
    pub async fn get_or_fetch<F, Fut>(&self, key: CacheKey, fetch: F) -> Arc<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V> + Send + 'static,
    {
        let flight = {
            let mut inner = self.lock();
            if let Some(value) = self.read_fresh(&mut inner, &key, Instant::now()) {
                inner.stats.hits += 1;
                debug!(%key, "cache hit");
                return value;
            }
            if let Some((_, flight)) = inner.in_flight.get(&key) {
                let flight = flight.clone();
                inner.stats.joined += 1;
                debug!(%key, "joining in-flight fetch");
                flight
            } else {
                inner.stats.misses += 1;
                self.start_locked(&mut inner, key, fetch())
            }
        };
        flight.await
    }

    /// Always fetch, replacing whatever is cached or in flight for `key`.
    pub async fn refresh<Fut>(&self, key: CacheKey, fetch: Fut) -> Arc<V>
    where
        Fut: Future<Output = V> + Send + 'static,
    {
        let flight = {
            let mut inner = self.lock();
            inner.entries.remove(&key);
            inner.stats.misses += 1;
            self.start_locked(&mut inner, key, fetch)
        };
        flight.await
    }

    fn start_locked<Fut>(&self, inner: &mut Inner<V>, key: CacheKey, fetch: Fut) -> InFlight<V>
    where
        Fut: Future<Output = V> + Send + 'static,
    {
        let flight_id = inner.next_flight;
        inner.next_flight += 1;
        let cache = self.clone();
        let stored_key = key.clone();
        let flight = async move {
            let value = Arc::new(fetch.await);
            cache.finish(stored_key, flight_id, value.clone());
            value
        }
        .boxed()
        .shared();
        debug!(%key, flight_id, "cache miss, fetching");
        inner.in_flight.insert(key, (flight_id, flight.clone()));
        flight
    }

    fn finish(&self, key: CacheKey, flight_id: u64, value: Arc<V>) {
        let mut inner = self.lock();
        let current = inner.in_flight.get(&key).is_some_and(|(id, _)| *id == flight_id);
        if !current {
            debug!(%key, flight_id, "fetch superseded or invalidated; not storing");
            return;
        }
        inner.in_flight.remove(&key);
        if value.cacheable() {
            let now = Instant::now();
            self.sweep_locked(&mut inner, now);
            inner.entries.insert(key, CacheEntry { value, fetched_at: now });
        }
    }

    fn read_fresh(&self, inner: &mut Inner<V>, key: &CacheKey, now: Instant) -> Option<Arc<V>> {
        let age = now.saturating_duration_since(inner.entries.get(key)?.fetched_at);
        if age >= self.evict_after {
            inner.entries.remove(key);
            inner.stats.evictions += 1;
            return None;
        }
        if age >= self.fresh_for {
            return None;
        }
        inner.entries.get(key).map(|e| e.value.clone())
    }

    fn sweep_locked(&self, inner: &mut Inner<V>, now: Instant) -> usize {
        let evict_after = self.evict_after;
        let before = inner.entries.len();
        inner.entries.retain(|_, e| now.saturating_duration_since(e.fetched_at) < evict_after);
        let removed = before - inner.entries.len();
        inner.stats.evictions += removed as u64;
        removed
    }
}
