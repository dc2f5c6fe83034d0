//! The work service: sequences cache lookup, failure injection, worker
//! admission, processing, and instrumentation for every inbound call.
//!
//! One explicitly constructed object owns every shared resource (counters,
//! cache, the single-worker mutex, metrics, configuration), so tests get
//! fresh, isolated instances.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::cache::{CACHE_TTL, IdempotencyCache, SWEEP_PERIOD};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::{Outcome, WorkReply, WorkRequest};
use crate::telemetry::metrics::{
    ACQUIRED, BusyGuard, FlowCounters, LatencySpan, Metrics, duration_ms,
};

/// Status code string carried by every successful reply.
pub const CODE_SUCCESS: &str = "SUCCESS";

/// The capacity-limited worker service.
pub struct WorkService {
    config: Config,
    cache: IdempotencyCache,
    /// The intentional bottleneck: at most one request processes at a time.
    worker: Mutex<()>,
    counters: FlowCounters,
    metrics: Metrics,
}

impl WorkService {
    pub fn new(config: Config) -> Result<Self> {
        let metrics = Metrics::new()?;
        metrics.fail_rate.set(config.fail_rate);
        Ok(Self {
            config,
            cache: IdempotencyCache::new(CACHE_TTL),
            worker: Mutex::new(()),
            counters: FlowCounters::default(),
            metrics,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn counters(&self) -> &FlowCounters {
        &self.counters
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn cache(&self) -> &IdempotencyCache {
        &self.cache
    }

    /// Render the metrics exposition body.
    pub fn render_metrics(&self) -> Result<String> {
        self.metrics.render(&self.counters)
    }

    /// Handle one work request.
    ///
    /// Cache hits and injected failures return before the worker is engaged;
    /// everything else waits for admission, sleeps for the configured delay,
    /// and populates the cache. The only error returned is the injected
    /// retryable rejection.
    pub async fn handle(&self, req: &WorkRequest) -> Result<WorkReply> {
        // Declared first, drops last: records end-to-end latency on every
        // exit path, under whichever outcome the first short-circuit set.
        let mut request_span =
            LatencySpan::start(self.metrics.request_latency.clone(), Outcome::Success);

        self.counters.record_received();

        if let Some(reply) = self.cache.lookup(&req.id) {
            request_span.set_outcome(Outcome::CacheHit);
            return Ok(reply);
        }

        // Injection happens before the worker is engaged, so rejected
        // requests never consume capacity.
        if injected_failure(self.config.fail_rate) {
            self.counters.record_failed();
            request_span.set_outcome(Outcome::Failure);
            return Err(Error::Exhausted("rate limited".to_string()));
        }

        let queue_start = Instant::now();
        let _admitted = self.worker.lock().await;
        self.metrics
            .queue_wait
            .with_label_values(&[ACQUIRED])
            .observe(duration_ms(queue_start.elapsed()));

        // Declared after the worker guard, drops before it: the processing
        // sample covers only the worker-held section.
        let _processing_span =
            LatencySpan::start(self.metrics.processing_latency.clone(), Outcome::Success);

        self.counters.record_started();
        let _busy = BusyGuard::raise(&self.metrics.busy);

        let processing_start = Instant::now();
        tokio::time::sleep(self.config.delay()).await;
        let latency_ms = duration_ms(processing_start.elapsed()) as u64;

        let reply = WorkReply {
            ok: true,
            code: CODE_SUCCESS.to_string(),
            latency_ms,
        };
        self.cache.store(&req.id, reply.clone());
        self.counters.record_completed();
        Ok(reply)
    }

    /// Periodically sweep expired idempotency entries, until dropped.
    ///
    /// Purely advisory: `lookup` re-checks expiry itself. This only bounds
    /// memory to the identifiers seen within the last sweep-plus-TTL window.
    pub async fn run_sweeper(self: Arc<Self>) {
        let mut ticker = tokio::time::interval(SWEEP_PERIOD);
        ticker.tick().await; // first tick completes immediately
        loop {
            ticker.tick().await;
            let removed = self.cache.sweep_expired();
            if removed > 0 {
                debug!(removed, "swept expired idempotency entries");
            }
        }
    }
}

/// Bernoulli trial against the configured rate.
///
/// Rate 0 short-circuits without drawing, so a zero-rate service is
/// deterministic under test.
fn injected_failure(rate: f64) -> bool {
    rate > 0.0 && rand::random::<f64>() < rate
}
