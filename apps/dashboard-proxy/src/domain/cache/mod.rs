//! Response Cache
//!
//! Time-based memoization of upstream responses keyed by a request
//! fingerprint. Each fingerprint holds at most one entry; a refresh
//! overwrites it and nothing is ever evicted.
//!
//! # Freshness
//!
//! An entry is fresh while `now - fetched_at < ttl`. Stale entries are
//! kept so the proxy can serve them when the upstream fails.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::time::Duration;

use parking_lot::RwLock;

// =============================================================================
// TTLs
// =============================================================================

/// Freshness window for live price responses.
pub const LIVE_PRICES_TTL: Duration = Duration::from_secs(30);

/// Freshness window for historical chart responses.
pub const HISTORICAL_PRICES_TTL: Duration = Duration::from_secs(5 * 60);

/// Freshness window for the news feed.
pub const NEWS_TTL: Duration = Duration::from_secs(5 * 60);

// =============================================================================
// Fingerprint
// =============================================================================

/// Cache key derived from the request parameters that select a response.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Wrap an already-normalized key.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Key for a live price request.
    ///
    /// Ids are trimmed, lowercased, de-duplicated and sorted so that
    /// `"ethereum,bitcoin"` and `"bitcoin, ethereum"` share an entry.
    #[must_use]
    pub fn live_prices<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let normalized: BTreeSet<String> = ids
            .into_iter()
            .map(|id| id.as_ref().trim().to_lowercase())
            .filter(|id| !id.is_empty())
            .collect();
        Self(normalized.into_iter().collect::<Vec<_>>().join(","))
    }

    /// Key for a historical chart request.
    #[must_use]
    pub fn historical_prices(id: &str, days: u32) -> Self {
        Self(format!("{}-{days}", id.trim().to_lowercase()))
    }

    /// Key for the single news feed entry.
    #[must_use]
    pub fn news() -> Self {
        Self("news".to_string())
    }

    /// The key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Entries
// =============================================================================

/// A cached upstream response.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<T> {
    /// The cached payload.
    pub payload: T,
    /// Wall-clock time of the fetch, in epoch milliseconds.
    pub fetched_at_millis: i64,
}

impl<T> CacheEntry<T> {
    /// Milliseconds since the fetch. Never negative.
    #[must_use]
    pub const fn age_millis(&self, now_millis: i64) -> i64 {
        let age = now_millis.saturating_sub(self.fetched_at_millis);
        if age < 0 { 0 } else { age }
    }

    /// Whether the entry is still within `ttl`.
    #[must_use]
    pub fn is_fresh(&self, now_millis: i64, ttl: Duration) -> bool {
        let ttl_millis = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        self.age_millis(now_millis) < ttl_millis
    }
}

/// Result of a cache lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup<T> {
    /// Entry exists and is within its TTL.
    Fresh(T),
    /// Entry exists but has expired. Usable as a fallback.
    Stale(T),
    /// No entry for the fingerprint.
    Miss,
}

// =============================================================================
// Cache
// =============================================================================

/// Fingerprint-keyed cache with a single TTL.
///
/// The lock is only taken inside synchronous methods, so callers never
/// hold it across an await point.
#[derive(Debug)]
pub struct ResponseCache<T> {
    ttl: Duration,
    entries: RwLock<HashMap<Fingerprint, CacheEntry<T>>>,
}

impl<T: Clone> ResponseCache<T> {
    /// Create an empty cache.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// The freshness window.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the entry for `fingerprint` regardless of age.
    #[must_use]
    pub fn get(&self, fingerprint: &Fingerprint) -> Option<CacheEntry<T>> {
        self.entries.read().get(fingerprint).cloned()
    }

    /// Store `payload` under `fingerprint`, replacing any previous entry.
    pub fn put(&self, fingerprint: Fingerprint, payload: T, now_millis: i64) {
        self.entries.write().insert(
            fingerprint,
            CacheEntry {
                payload,
                fetched_at_millis: now_millis,
            },
        );
    }

    /// Classify the entry for `fingerprint` at `now_millis`.
    #[must_use]
    pub fn lookup(&self, fingerprint: &Fingerprint, now_millis: i64) -> CacheLookup<T> {
        match self.entries.read().get(fingerprint) {
            Some(entry) if entry.is_fresh(now_millis, self.ttl) => {
                CacheLookup::Fresh(entry.payload.clone())
            }
            Some(entry) => CacheLookup::Stale(entry.payload.clone()),
            None => CacheLookup::Miss,
        }
    }

    /// Number of fingerprints held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the cache holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================
