//! Configuration loading tests.
//!
//! Env vars are process-global, so all cases run inside one test to avoid
//! cross-test races.

use chokepoint::config::{Config, DEFAULT_DELAY_MS};

#[test]
fn config_from_env_covers_defaults_parsing_and_validation() {
    // Defaults when unset
    unsafe {
        std::env::remove_var("WORK_DELAY_MS");
        std::env::remove_var("FAIL_RATE");
    }
    let config = Config::from_env().unwrap();
    assert_eq!(config.delay_ms, DEFAULT_DELAY_MS);
    assert_eq!(config.fail_rate, 0.0);

    // Parsed values
    unsafe {
        std::env::set_var("WORK_DELAY_MS", "200");
        std::env::set_var("FAIL_RATE", "0.3");
    }
    let config = Config::from_env().unwrap();
    assert_eq!(config.delay_ms, 200);
    assert_eq!(config.fail_rate, 0.3);
    assert_eq!(config.delay(), std::time::Duration::from_millis(200));

    // Malformed delay fails fast
    unsafe {
        std::env::set_var("WORK_DELAY_MS", "fast");
    }
    assert!(Config::from_env().is_err());

    // Out-of-range rate fails fast
    unsafe {
        std::env::set_var("WORK_DELAY_MS", "5");
        std::env::set_var("FAIL_RATE", "1.5");
    }
    assert!(Config::from_env().is_err());

    unsafe {
        std::env::remove_var("WORK_DELAY_MS");
        std::env::remove_var("FAIL_RATE");
    }
}
