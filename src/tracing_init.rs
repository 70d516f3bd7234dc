//! Tracing subscriber setup shared by the binaries and the test suites.

use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence when set; `fallback` applies otherwise.
/// `rustysstv=debug` surfaces mode detection and the decoder's line loop;
/// `rustysstv::sync=trace` follows the per-line pulse search. Repeated
/// calls are no-ops, so every binary and test can call this
/// unconditionally.
pub fn init(fallback: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .ok();
}
