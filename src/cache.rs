//! Session-lifetime result caching to avoid redundant provider calls.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Default entry lifetime: 10 minutes.
pub const DEFAULT_TTL: Duration = Duration::from_secs(10 * 60);

struct Entry<T> {
    value: T,
    stored_at: Instant,
}

/// Process-lifetime key-value cache with time-based expiry.
///
/// An explicit service instance rather than a global: construct one per
/// application (or per test) and share it by reference. Stale entries are
/// ignored, not deleted; the next `set` for the key overwrites them.
/// Entry count is unbounded; in practice it is capped by the number of
/// distinct queries in one short-lived session.
pub struct TtlCache<T> {
    entries: Mutex<HashMap<String, Entry<T>>>,
    ttl: Duration,
}

impl<T: Clone> TtlCache<T> {
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Returns the cached value if present and younger than the ttl.
    /// A stale entry is treated identically to a miss.
    pub fn get(&self, key: &str) -> Option<T> {
        self.get_at(key, Instant::now())
    }

    fn get_at(&self, key: &str, now: Instant) -> Option<T> {
        let entries = self.entries.lock().ok()?;
        let entry = entries.get(key)?;
        if now.duration_since(entry.stored_at) < self.ttl {
            log::debug!("cache hit for {key:?}");
            Some(entry.value.clone())
        } else {
            None
        }
    }

    /// Stores a value, unconditionally overwriting any prior entry.
    pub fn set(&self, key: &str, value: T) {
        self.set_at(key, value, Instant::now());
    }

    fn set_at(&self, key: &str, value: T, now: Instant) {
        if let Ok(mut entries) = self.entries.lock() {
            log::debug!("cached result for {key:?}");
            entries.insert(key.to_string(), Entry { value, stored_at: now });
        }
    }

    /// Drops every entry. Mainly useful in tests and on logout.
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }
}

impl<T: Clone> Default for TtlCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache key for a keyword or ingredient search: trimmed and lower-cased,
/// so "Pasta " and "pasta" share an entry.
pub fn search_key(query: &str) -> String {
    query.trim().to_lowercase()
}

/// Cache key for a detail fetch. Prefixed so detail keys can never collide
/// with search keys.
pub fn detail_key(recipe_id: &str) -> String {
    format!("detail_{recipe_id}")
}
