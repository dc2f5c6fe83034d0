//! Idempotency cache: request id to previously produced reply, with a TTL.
//!
//! Freshness is enforced at read time; the periodic sweep only bounds
//! memory. The last writer for a given id wins.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use tokio::time::Instant;

use crate::model::WorkReply;

/// How long a cached reply stays replayable.
pub const CACHE_TTL: Duration = Duration::from_secs(30);

/// How often the background sweep scans for expired entries.
pub const SWEEP_PERIOD: Duration = Duration::from_secs(30);

struct CacheEntry {
    reply: WorkReply,
    expires: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires
    }
}

/// TTL map from request id to reply.
pub struct IdempotencyCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl IdempotencyCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Returns the cached reply for `id` if present and not yet expired.
    ///
    /// An empty id is never tracked and always misses. An expired entry is
    /// never returned, whether or not the sweep has removed it yet.
    pub fn lookup(&self, id: &str) -> Option<WorkReply> {
        if id.is_empty() {
            return None;
        }
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let entry = entries.get(id)?;
        if entry.is_expired(Instant::now()) {
            return None;
        }
        Some(entry.reply.clone())
    }

    /// Insert or overwrite the entry for `id`, valid for the cache TTL.
    /// No-op when `id` is empty.
    pub fn store(&self, id: &str, reply: WorkReply) {
        if id.is_empty() {
            return;
        }
        let entry = CacheEntry {
            reply,
            expires: Instant::now() + self.ttl,
        };
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(id.to_string(), entry);
    }

    /// Remove entries whose expiry has passed. Returns how many were removed.
    ///
    /// Advisory cleanup only: `lookup` re-checks expiry itself, so
    /// correctness never depends on sweep timing.
    pub fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }

    /// Number of entries currently held, expired or not.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
