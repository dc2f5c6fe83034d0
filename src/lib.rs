//! # chokepoint
//!
//! Deliberately capacity-limited worker service for overload, queueing, and
//! retry-amplification demos.
//!
//! One request is processed at a time behind a single-worker mutex; retries
//! replay through a TTL idempotency cache; a probabilistic injector sheds
//! load before the worker is engaged. Flow counters and outcome-labelled
//! latency histograms make queue buildup and tail latency externally visible.

pub mod cache;
pub mod config;
pub mod error;
pub mod model;
pub mod server;
pub mod service;
pub mod telemetry;
