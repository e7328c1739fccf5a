//! Time-bounded memoization in front of the quote and history fetchers.
//!
//! Entries are reusable while `now - fetched_at < ttl`. Expired entries are
//! refetched, never served. Each key owns an async read/write slot:
//!
//! - fresh entries are read under a shared lock, so readers never queue
//!   behind each other;
//! - a refresh takes the write lock and re-checks freshness, so concurrent
//!   misses on the same key collapse into one upstream call (single-flight).
//!
//! There is no size bound and no proactive eviction; the watchlist size
//! bounds the key count.

use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::debug;

use crate::history_fetcher::HistoryFetcher;
use crate::quote_fetcher::QuoteFetcher;
use crate::{FetchedQuote, HistorySeries, HistoryWindow, TickerSymbol};

/// Source of "now" for expiry checks.
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Instant>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    fetched_at: Instant,
    ttl: Duration,
}

impl<V> CacheEntry<V> {
    fn is_fresh(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.fetched_at) < self.ttl
    }
}

type Slot<V> = Arc<RwLock<Option<CacheEntry<V>>>>;

/// Generic TTL cache with per-key single-flight refresh.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    slots: Mutex<HashMap<K, Slot<V>>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh value for `key`, if any. Never fetches.
    pub async fn get(&self, key: &K) -> Option<V> {
        let slot = self.lock_slots().get(key).cloned()?;
        let entry = slot.read().await;
        entry
            .as_ref()
            .filter(|entry| entry.is_fresh(self.clock.now()))
            .map(|entry| entry.value.clone())
    }

    /// Fresh cached value, or the result of `fetch` stored for the next `ttl`.
    ///
    /// Concurrent callers for the same key wait for the in-flight fetch
    /// instead of starting their own.
    pub async fn get_or_fetch<F, Fut>(&self, key: K, fetch: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        let slot = self.slot(key);

        {
            let entry = slot.read().await;
            if let Some(entry) = entry.as_ref() {
                if entry.is_fresh(self.clock.now()) {
                    return entry.value.clone();
                }
            }
        }

        let mut entry = slot.write().await;
        // Another caller may have refreshed while we waited for the lock.
        if let Some(existing) = entry.as_ref() {
            if existing.is_fresh(self.clock.now()) {
                return existing.value.clone();
            }
        }

        let value = fetch().await;
        *entry = Some(CacheEntry {
            value: value.clone(),
            fetched_at: self.clock.now(),
            ttl: self.ttl,
        });
        value
    }

    fn slot(&self, key: K) -> Slot<V> {
        Arc::clone(self.lock_slots().entry(key).or_default())
    }

    fn lock_slots(&self) -> std::sync::MutexGuard<'_, HashMap<K, Slot<V>>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Shape of an upstream request; part of the cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestShape {
    Quote,
    History(HistoryWindow),
}

/// Cache key: one ticker, one request shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub symbol: TickerSymbol,
    pub shape: RequestShape,
}

impl CacheKey {
    pub fn quote(symbol: &TickerSymbol) -> Self {
        Self {
            symbol: symbol.clone(),
            shape: RequestShape::Quote,
        }
    }

    pub fn history(symbol: &TickerSymbol, window: HistoryWindow) -> Self {
        Self {
            symbol: symbol.clone(),
            shape: RequestShape::History(window),
        }
    }
}

/// Default time-to-live for cached quotes and history.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(10);

/// Memoized front for [`QuoteFetcher`] and [`HistoryFetcher`].
pub struct QuoteCache {
    quote_fetcher: QuoteFetcher,
    history_fetcher: HistoryFetcher,
    quotes: TtlCache<CacheKey, FetchedQuote>,
    histories: TtlCache<CacheKey, HistorySeries>,
}

impl QuoteCache {
    pub fn new(
        quote_fetcher: QuoteFetcher,
        history_fetcher: HistoryFetcher,
        ttl: Duration,
    ) -> Self {
        Self::with_clock(quote_fetcher, history_fetcher, ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(
        quote_fetcher: QuoteFetcher,
        history_fetcher: HistoryFetcher,
        ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            quote_fetcher,
            history_fetcher,
            quotes: TtlCache::with_clock(ttl, Arc::clone(&clock)),
            histories: TtlCache::with_clock(ttl, clock),
        }
    }

    pub async fn quote(&self, symbol: &TickerSymbol) -> FetchedQuote {
        self.quotes
            .get_or_fetch(CacheKey::quote(symbol), || async {
                debug!(ticker = %symbol, "quote cache miss");
                self.quote_fetcher.fetch(symbol).await
            })
            .await
    }

    pub async fn history(&self, symbol: &TickerSymbol, window: HistoryWindow) -> HistorySeries {
        self.histories
            .get_or_fetch(CacheKey::history(symbol, window), || async {
                debug!(ticker = %symbol, window = %window, "history cache miss");
                self.history_fetcher.fetch(symbol, window).await
            })
            .await
    }
}
