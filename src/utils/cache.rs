//! Seen-Article Cache
//!
//! Thread-safe memory of article URLs that already reached Notion, so a
//! manual dispatch shortly after the scheduled run does not publish the
//! same page twice.
//!
//! Features:
//! - TTL-based expiration (48 h default)
//! - URL normalization (trimmed, lowercase scheme/host, no fragment, no trailing slash)
//! - Hit/miss counters
//! - DashMap for lock-free concurrent access

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::utils::constants::DEFAULT_SEEN_TTL_SECS;

/// Cache entry with insertion time for TTL checks
#[derive(Clone, Debug)]
struct SeenEntry {
    created_at: Instant,
}

impl SeenEntry {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.created_at.elapsed() > ttl
    }
}

#[derive(Clone)]
pub struct SeenCache {
    /// normalized url -> entry
    store: Arc<DashMap<String, SeenEntry>>,
    ttl: Duration,
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
}

impl Default for SeenCache {
    fn default() -> Self {
        Self::with_ttl(Duration::from_secs(DEFAULT_SEEN_TTL_SECS))
    }
}

impl SeenCache {
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            store: Arc::new(DashMap::new()),
            ttl,
            hits: Arc::new(AtomicU64::new(0)),
            misses: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Canonical form used as the cache key
    pub fn normalize_url(url: &str) -> String {
        let url = url.trim();
        let url = url.split('#').next().unwrap_or(url);
        let (scheme_host, rest) = match url.find("://") {
            Some(idx) => {
                let after = &url[idx + 3..];
                let host_end = after.find('/').map(|i| idx + 3 + i).unwrap_or(url.len());
                (&url[..host_end], &url[host_end..])
            }
            None => ("", url),
        };
        let mut key = scheme_host.to_lowercase();
        key.push_str(rest);
        while key.ends_with('/') {
            key.pop();
        }
        key
    }

    /// True when the URL was marked and has not expired
    pub fn contains(&self, url: &str) -> bool {
        let key = Self::normalize_url(url);

        let expired = match self.store.get(&key) {
            Some(entry) => entry.is_expired(self.ttl),
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                return false;
            }
        };

        if expired {
            self.store.remove(&key);
            self.misses.fetch_add(1, Ordering::Relaxed);
            debug!("📭 SEEN MISS (expired): {}", key);
            false
        } else {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!("✅ SEEN HIT: {}", key);
            true
        }
    }

    pub fn mark(&self, url: &str) {
        let key = Self::normalize_url(url);
        self.store.insert(
            key,
            SeenEntry {
                created_at: Instant::now(),
            },
        );
    }

    /// Drop expired entries, returns how many were removed
    pub fn cleanup_expired(&self) -> usize {
        let before = self.store.len();
        let ttl = self.ttl;
        self.store.retain(|_, entry| !entry.is_expired(ttl));
        let removed = before - self.store.len();
        if removed > 0 {
            info!("🧹 SEEN CACHE CLEANUP: {} expired entries removed", removed);
        }
        removed
    }

    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            (hits as f64 / total as f64) * 100.0
        } else {
            0.0
        };

        CacheStats {
            entries: self.store.len(),
            hits,
            misses,
            hit_rate,
            ttl_secs: self.ttl.as_secs(),
        }
    }
}

/// Cache statistics for /v1/stats
#[derive(Debug, Clone, serde::Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub ttl_secs: u64,
}
