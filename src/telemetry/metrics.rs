//! Flow counters, latency histograms, and text exposition.
//!
//! Two layers, split the same way the hot path is split: the four flow
//! counters are bare atomics with no registry or lock on the increment
//! path, while histograms and gauges live in an owned prometheus
//! [`Registry`]. [`Metrics::render`] writes the counter lines by hand and
//! appends the encoded registry, producing one exposition body.

use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};

use prometheus::{Gauge, HistogramOpts, HistogramVec, IntGauge, Registry, TextEncoder};
use tokio::time::Instant;

use crate::error::Result;
use crate::model::Outcome;

/// Millisecond buckets for end-to-end and processing latency. The low end
/// catches fast paths (cache hits, injection), the high end saturation.
const LATENCY_BUCKETS_MS: &[f64] = &[
    1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0,
];

/// Millisecond buckets for queue wait, with sub-millisecond resolution at
/// the low end so an idle worker reads as ~0.
const QUEUE_WAIT_BUCKETS_MS: &[f64] = &[
    0.5, 1.0, 2.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0,
];

/// Label value for queue-wait samples; only requests that reach worker
/// acquisition produce one.
pub const ACQUIRED: &str = "acquired";

/// Monotonic flow counters.
///
/// `received >= started + failed` and `started >= completed` hold at every
/// instant: a request is counted received before any terminal path, and
/// admission strictly precedes completion.
#[derive(Debug, Default)]
pub struct FlowCounters {
    received: AtomicU64,
    started: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
}

impl FlowCounters {
    /// A request entered the handler.
    pub fn record_received(&self) {
        self.received.fetch_add(1, Ordering::SeqCst);
    }

    /// A request was admitted by the single worker.
    pub fn record_started(&self) {
        self.started.fetch_add(1, Ordering::SeqCst);
    }

    /// A request finished processing inside the worker.
    pub fn record_completed(&self) {
        self.completed.fetch_add(1, Ordering::SeqCst);
    }

    /// A request was rejected by failure injection.
    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::SeqCst);
    }

    /// Point-in-time copy of all four counters.
    pub fn snapshot(&self) -> FlowSnapshot {
        FlowSnapshot {
            received: self.received.load(Ordering::SeqCst),
            started: self.started.load(Ordering::SeqCst),
            completed: self.completed.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
        }
    }
}

/// Counter values captured by [`FlowCounters::snapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowSnapshot {
    pub received: u64,
    pub started: u64,
    pub completed: u64,
    pub failed: u64,
}

/// Latency instruments and gauges, backed by an owned registry so each
/// service instance measures independently.
pub struct Metrics {
    registry: Registry,
    /// End-to-end handler latency, labelled by terminal outcome.
    pub request_latency: HistogramVec,
    /// Worker-held processing latency only.
    pub processing_latency: HistogramVec,
    /// Handler-entry-to-admission wait, labelled `acquired`.
    pub queue_wait: HistogramVec,
    /// 1 while the worker is processing, 0 otherwise.
    pub busy: IntGauge,
    /// Configured failure-injection rate.
    pub fail_rate: Gauge,
}

impl Metrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let request_latency = HistogramVec::new(
            HistogramOpts::new(
                "work_request_latency_ms",
                "End-to-end handler latency in milliseconds",
            )
            .buckets(LATENCY_BUCKETS_MS.to_vec()),
            &["outcome"],
        )?;
        registry.register(Box::new(request_latency.clone()))?;

        let processing_latency = HistogramVec::new(
            HistogramOpts::new(
                "work_processing_latency_ms",
                "Worker processing latency in milliseconds (worker-held section only)",
            )
            .buckets(LATENCY_BUCKETS_MS.to_vec()),
            &["outcome"],
        )?;
        registry.register(Box::new(processing_latency.clone()))?;

        let queue_wait = HistogramVec::new(
            HistogramOpts::new(
                "work_queue_wait_ms",
                "Wait for the single worker in milliseconds (handler entry to admission)",
            )
            .buckets(QUEUE_WAIT_BUCKETS_MS.to_vec()),
            &["outcome"],
        )?;
        registry.register(Box::new(queue_wait.clone()))?;

        let busy = IntGauge::new("work_busy", "Whether the worker is currently busy (0 or 1)")?;
        registry.register(Box::new(busy.clone()))?;

        let fail_rate = Gauge::new("work_fail_rate", "Configured failure injection rate")?;
        registry.register(Box::new(fail_rate.clone()))?;

        // Materialize the fixed label sets so every series is visible at zero.
        for outcome in [Outcome::Success, Outcome::CacheHit, Outcome::Failure] {
            request_latency.with_label_values(&[outcome.as_str()]);
        }
        processing_latency.with_label_values(&[Outcome::Success.as_str()]);
        queue_wait.with_label_values(&[ACQUIRED]);

        Ok(Self {
            registry,
            request_latency,
            processing_latency,
            queue_wait,
            busy,
            fail_rate,
        })
    }

    /// Render the full exposition body: hand-rolled flow counters first,
    /// then the encoded registry (histograms and gauges).
    pub fn render(&self, counters: &FlowCounters) -> Result<String> {
        let snap = counters.snapshot();
        let mut out = String::new();

        let _ = writeln!(
            out,
            "# HELP work_requests_received_total All requests entering the work handler"
        );
        let _ = writeln!(out, "# TYPE work_requests_received_total counter");
        let _ = writeln!(out, "work_requests_received_total {}", snap.received);

        let _ = writeln!(
            out,
            "# HELP work_requests_started_total Requests admitted by the single worker"
        );
        let _ = writeln!(out, "# TYPE work_requests_started_total counter");
        let _ = writeln!(out, "work_requests_started_total {}", snap.started);

        let _ = writeln!(
            out,
            "# HELP work_requests_completed_total Requests completed inside the worker"
        );
        let _ = writeln!(out, "# TYPE work_requests_completed_total counter");
        let _ = writeln!(out, "work_requests_completed_total {}", snap.completed);

        let _ = writeln!(
            out,
            "# HELP work_requests_failed_total Requests rejected, by reason"
        );
        let _ = writeln!(out, "# TYPE work_requests_failed_total counter");
        let _ = writeln!(
            out,
            "work_requests_failed_total{{reason=\"fail_injection\"}} {}",
            snap.failed
        );

        TextEncoder::new().encode_utf8(&self.registry.gather(), &mut out)?;
        Ok(out)
    }
}

/// Measurement span that records one sample into a histogram when dropped.
///
/// Dropping at scope exit guarantees exactly one observation per span on
/// every exit path, including early returns. The outcome label defaults to
/// the one given at start and may be overwritten before the span ends.
pub struct LatencySpan {
    hist: HistogramVec,
    outcome: Outcome,
    started: Instant,
}

impl LatencySpan {
    pub fn start(hist: HistogramVec, outcome: Outcome) -> Self {
        Self {
            hist,
            outcome,
            started: Instant::now(),
        }
    }

    /// Overwrite the outcome label this span will record under.
    pub fn set_outcome(&mut self, outcome: Outcome) {
        self.outcome = outcome;
    }
}

impl Drop for LatencySpan {
    fn drop(&mut self) {
        self.hist
            .with_label_values(&[self.outcome.as_str()])
            .observe(duration_ms(self.started.elapsed()));
    }
}

/// Guard that raises the busy gauge for the duration of the processing step.
pub struct BusyGuard {
    gauge: IntGauge,
}

impl BusyGuard {
    pub fn raise(gauge: &IntGauge) -> Self {
        gauge.set(1);
        Self {
            gauge: gauge.clone(),
        }
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.gauge.set(0);
    }
}

/// A duration as fractional milliseconds, the unit all histograms use.
pub fn duration_ms(d: std::time::Duration) -> f64 {
    d.as_secs_f64() * 1_000.0
}
