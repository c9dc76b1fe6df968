// logging.rs — tracing subscriber setup for the binary, benches, and demos.

use tracing_subscriber::{fmt, EnvFilter};

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info,conway_gpu=debug";

/// Install a fmt subscriber filtered by `RUST_LOG`, or [`DEFAULT_FILTER`].
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}
