//! Shared message formatting and logging helpers.

use tracing_subscriber::EnvFilter;

const PREFIX: &str = "graphbench";

/// Prefix an error message so failures are recognizable in mixed output.
pub fn error_message(msg: impl AsRef<str>) -> String {
    format!("{}: {}", PREFIX, msg.as_ref())
}

pub fn warn(msg: impl AsRef<str>) {
    tracing::warn!("{}", msg.as_ref());
}

pub fn info(msg: impl AsRef<str>) {
    tracing::info!("{}", msg.as_ref());
}

/// Install the stderr subscriber. `RUST_LOG` wins over `verbose`.
pub fn init(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
