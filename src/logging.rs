//! Set up of the global `tracing` subscriber.

use tracing_subscriber::{
    EnvFilter, Layer, filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

/// Log to stdout, at `default_level` unless overridden with `RUST_LOG`.
///
/// # Errors
/// Returns an error if a global subscriber has already been set.
pub fn init_logging(
    default_level: LevelFilter,
) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    let stdout_log = tracing_subscriber::fmt::layer().pretty();

    tracing_subscriber::registry()
        .with(stdout_log.with_filter(filter))
        .try_init()
}
