//! Tracing setup shared by the binaries

use tracing_subscriber::EnvFilter;

/// Install the global subscriber.
///
/// Logs always go to stderr: stdout carries protocol traffic in stdio mode.
/// `RUST_LOG` replaces the `info` default when set.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
