//! Tracing subscriber setup for host binaries and tests.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// The filter is read from `HADIYA_LOG` (default `info`). Calling this more
/// than once is a no-op, so tests can call it freely.
pub fn init() {
    let filter = EnvFilter::try_from_env("HADIYA_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
