//! Logging setup.
//!
//! Events go to stderr so stdout stays clean for summaries and written paths.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "flaky_charts=info";

/// Install the global subscriber, honoring `RUST_LOG` when set.
///
/// Calling this more than once is harmless; later calls keep the first
/// subscriber.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
