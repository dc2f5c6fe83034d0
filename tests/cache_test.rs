//! Tests for the idempotency cache: freshness, bypass, overwrite, sweep.
//!
//! All tests run on the paused tokio clock so the 30s TTL is driven
//! directly with `tokio::time::advance`.

use chokepoint::cache::{CACHE_TTL, IdempotencyCache};
use chokepoint::model::WorkReply;
use tokio::time::Duration;

fn reply(latency_ms: u64) -> WorkReply {
    WorkReply {
        ok: true,
        code: "SUCCESS".to_string(),
        latency_ms,
    }
}

fn test_cache() -> IdempotencyCache {
    IdempotencyCache::new(CACHE_TTL)
}

#[tokio::test(start_paused = true)]
async fn lookup_returns_stored_reply_before_expiry() {
    let cache = test_cache();
    cache.store("a", reply(5));
    assert_eq!(cache.lookup("a"), Some(reply(5)));
}

#[tokio::test(start_paused = true)]
async fn empty_id_is_never_tracked() {
    let cache = test_cache();
    cache.store("", reply(5));
    assert!(cache.is_empty());
    assert_eq!(cache.lookup(""), None);
}

#[tokio::test(start_paused = true)]
async fn expired_entry_misses_at_read_time() {
    let cache = test_cache();
    cache.store("a", reply(5));
    tokio::time::advance(Duration::from_secs(31)).await;

    // Not yet swept, but freshness is checked on read.
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.lookup("a"), None);
}

#[tokio::test(start_paused = true)]
async fn last_writer_wins_for_same_id() {
    let cache = test_cache();
    cache.store("a", reply(5));
    cache.store("a", reply(9));
    assert_eq!(cache.lookup("a"), Some(reply(9)));
    assert_eq!(cache.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn store_refreshes_expiry() {
    let cache = test_cache();
    cache.store("a", reply(5));
    tokio::time::advance(Duration::from_secs(20)).await;
    cache.store("a", reply(7));
    tokio::time::advance(Duration::from_secs(20)).await;

    // 40s after the first store but only 20s after the overwrite.
    assert_eq!(cache.lookup("a"), Some(reply(7)));
}

#[tokio::test(start_paused = true)]
async fn sweep_removes_only_expired_entries() {
    let cache = test_cache();
    cache.store("old", reply(1));
    tokio::time::advance(Duration::from_secs(31)).await;
    cache.store("fresh", reply(2));

    let removed = cache.sweep_expired();
    assert_eq!(removed, 1);
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.lookup("fresh"), Some(reply(2)));
    assert_eq!(cache.lookup("old"), None);
}

#[tokio::test(start_paused = true)]
async fn sweep_on_fresh_cache_removes_nothing() {
    let cache = test_cache();
    cache.store("a", reply(1));
    cache.store("b", reply(2));
    assert_eq!(cache.sweep_expired(), 0);
    assert_eq!(cache.len(), 2);
}
