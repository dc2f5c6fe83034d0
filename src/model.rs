//! Wire model for the work operation.
//!
//! A request carries an optional caller-supplied identifier; an empty id
//! opts out of idempotency tracking. Replies are immutable once produced
//! and are shared read-only by every cache hit that replays them.

use serde::{Deserialize, Serialize};

/// A unary work request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkRequest {
    /// Caller-supplied idempotency identifier. Empty means no tracking.
    #[serde(default)]
    pub id: String,
}

/// Reply to a work request. Replayed bit-identical on cache hits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkReply {
    pub ok: bool,
    /// Status code string; `"SUCCESS"` on the only success path.
    pub code: String,
    /// Measured processing duration in milliseconds (not end-to-end).
    pub latency_ms: u64,
}

/// Terminal classification of a request, used as the latency label.
///
/// Exactly one outcome is attributed per request: the first short-circuit
/// that fires, else `Success`. A closed set keeps label cardinality fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    CacheHit,
    Failure,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::CacheHit => "cache_hit",
            Outcome::Failure => "failure",
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
