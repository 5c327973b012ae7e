use crate::core::series::NavSeries;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// A memoised series and when it was fetched.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub scheme_code: String,
    pub series: Arc<NavSeries>,
    pub fetched_at: DateTime<Utc>,
}

struct Slot {
    entry: CacheEntry,
    last_used: u64,
}

#[derive(Default)]
struct Inner {
    slots: HashMap<String, Slot>,
    ticks: u64,
}

impl Inner {
    fn tick(&mut self) -> u64 {
        self.ticks += 1;
        self.ticks
    }
}

/// NAV series memoised by scheme code for the lifetime of the owner.
///
/// Entries never expire. Writes are last-writer-wins. An optional capacity turns
/// on least-recently-used eviction for long-running processes.
#[derive(Clone)]
pub struct SeriesCache {
    inner: Arc<Mutex<Inner>>,
    capacity: Option<usize>,
}

impl SeriesCache {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            capacity: None,
        }
    }

    /// A cache holding at most `capacity` schemes (minimum one).
    pub fn bounded(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            capacity: Some(capacity.max(1)),
        }
    }

    pub async fn get(&self, scheme_code: &str) -> Option<Arc<NavSeries>> {
        let mut cache = self.inner.lock().await;
        let tick = cache.tick();
        match cache.slots.get_mut(scheme_code) {
            Some(slot) => {
                debug!("Cache HIT for scheme: {}", scheme_code);
                slot.last_used = tick;
                Some(Arc::clone(&slot.entry.series))
            }
            None => {
                debug!("Cache MISS for scheme: {}", scheme_code);
                None
            }
        }
    }

    pub async fn entry(&self, scheme_code: &str) -> Option<CacheEntry> {
        let cache = self.inner.lock().await;
        cache.slots.get(scheme_code).map(|slot| slot.entry.clone())
    }

    /// Stores `series` for `scheme_code`, stamped with the caller's clock.
    pub async fn put(&self, scheme_code: &str, series: Arc<NavSeries>, fetched_at: DateTime<Utc>) {
        let mut cache = self.inner.lock().await;
        let tick = cache.tick();

        let full = self.capacity.is_some_and(|capacity| {
            !cache.slots.contains_key(scheme_code) && cache.slots.len() >= capacity
        });
        if full {
            let evicted = cache
                .slots
                .iter()
                .min_by_key(|(_, slot)| slot.last_used)
                .map(|(code, _)| code.clone());
            if let Some(evicted) = evicted {
                debug!("Cache EVICT for scheme: {}", evicted);
                cache.slots.remove(&evicted);
            }
        }

        debug!("Cache PUT for scheme: {}", scheme_code);
        cache.slots.insert(
            scheme_code.to_string(),
            Slot {
                entry: CacheEntry {
                    scheme_code: scheme_code.to_string(),
                    series,
                    fetched_at,
                },
                last_used: tick,
            },
        );
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.slots.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for SeriesCache {
    fn default() -> Self {
        Self::new()
    }
}
