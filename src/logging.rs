//! Logging setup for binaries
//!
//! Library code only emits `tracing` events; a subscriber is installed once,
//! at process start, by whoever owns `main`.

use tracing_subscriber::EnvFilter;

/// Install a stderr `fmt` subscriber.
///
/// `RUST_LOG` wins when set. Otherwise `verbose` forces `debug`, and `level`
/// (from configuration) applies. Calling this twice is harmless; the second
/// install is ignored.
pub fn init_logging(level: &str, verbose: bool) {
    let directive = if verbose { "debug" } else { level };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("lereco={},warn", directive)));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
