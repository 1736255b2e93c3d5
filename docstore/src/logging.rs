//! Console logging for the CLI.

use docstore_core::Level;
use std::io;
use tracing_subscriber::{EnvFilter, fmt};

/// Install a compact stderr subscriber.
///
/// `RUST_LOG` wins when set; otherwise `level` is used.
pub fn init(level: Level) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_for(level)));
    let _ = fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .with_writer(io::stderr)
        .try_init();
}

/// `tracing` has no fatal level; fatal messages are error events.
fn filter_for(level: Level) -> &'static str {
    match level {
        Level::Fatal => "error",
        other => other.as_str(),
    }
}
