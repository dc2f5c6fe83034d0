//! Typed configuration from environment variables.
//!
//! Loads once at startup and is read-only afterwards. Malformed values fail
//! fast rather than silently falling back to defaults.

use std::time::Duration;

use crate::error::{Error, Result};

/// Synthetic processing time used when `WORK_DELAY_MS` is unset.
pub const DEFAULT_DELAY_MS: u64 = 5;

#[derive(Debug, Clone)]
pub struct Config {
    /// Synthetic per-request processing time in milliseconds.
    pub delay_ms: u64,
    /// Probability in [0, 1] that a request is rejected before processing.
    pub fail_rate: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            delay_ms: DEFAULT_DELAY_MS,
            fail_rate: 0.0,
        }
    }
}

impl Config {
    /// Load configuration from `WORK_DELAY_MS` and `FAIL_RATE`.
    ///
    /// In local dev, call `dotenvy::dotenv().ok()` before this.
    pub fn from_env() -> Result<Self> {
        let delay_ms = match std::env::var("WORK_DELAY_MS") {
            Ok(raw) => raw.parse::<u64>().map_err(|_| {
                Error::Config(format!("WORK_DELAY_MS must be an integer, got {raw:?}"))
            })?,
            Err(_) => DEFAULT_DELAY_MS,
        };

        let fail_rate = match std::env::var("FAIL_RATE") {
            Ok(raw) => {
                let rate = raw.parse::<f64>().map_err(|_| {
                    Error::Config(format!("FAIL_RATE must be a number, got {raw:?}"))
                })?;
                if !(0.0..=1.0).contains(&rate) {
                    return Err(Error::Config(format!(
                        "FAIL_RATE must be within [0, 1], got {rate}"
                    )));
                }
                rate
            }
            Err(_) => 0.0,
        };

        Ok(Self { delay_ms, fail_rate })
    }

    /// The synthetic processing delay as a `Duration`.
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}
