//! Tracing setup
//!
//! Logs go to stderr so stdout stays a clean TAP stream. Nothing is
//! installed unless `TINYTEST_LOG` (or `RUST_LOG`) is set, e.g.
//! `TINYTEST_LOG=tinytest=debug`.

use std::io;
use std::sync::Once;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Filter directives for tinytest logging
pub const LOG_ENV: &str = "TINYTEST_LOG";

static TRACING_INIT: Once = Once::new();

/// Initialise the global subscriber once
pub fn init() {
    TRACING_INIT.call_once(|| {
        let filter = match std::env::var(LOG_ENV) {
            Ok(directives) => EnvFilter::new(directives),
            Err(_) if std::env::var("RUST_LOG").is_ok() => EnvFilter::from_default_env(),
            Err(_) => return,
        };

        // Another subscriber may already be set by the host program
        let _ = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(io::stderr)
                    .with_target(true)
                    .with_level(true),
            )
            .with(filter)
            .try_init();
    });
}
