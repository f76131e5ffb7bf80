//! Logging setup for the command-line front end
//!
//! Diagnostics go to stderr through `tracing-subscriber`; stdout is reserved
//! for the scan report.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Default filter when `RUST_LOG` is unset
fn default_filter() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

pub fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter()));
    let fmt_layer = fmt::layer().with_writer(std::io::stderr).with_filter(filter);
    tracing_subscriber::registry().with(fmt_layer).init();

    #[cfg(feature = "profiling")]
    tracing::info!("Logging initialized (profiling scopes emitted as tracing spans)");
}
