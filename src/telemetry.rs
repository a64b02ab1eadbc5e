//! Diagnostic logging setup
//!
//! Diagnostics go to stderr; the host owns stdout.

use tracing_subscriber::EnvFilter;

/// Install a stderr fmt subscriber.
///
/// `RUST_LOG` wins when set; otherwise `log_level` is used as the filter.
/// Returns `false` if a global subscriber was already installed, in which
/// case the existing one is left alone.
pub fn init_tracing(log_level: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init()
        .is_ok()
}
