//! Tracing subscriber setup.
//!
//! Logs go to stderr; stdout is reserved for command output. The filter
//! comes from `RUST_LOG`, falling back to the level passed in.

use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber. Safe to call more than once; later calls
/// are ignored.
pub fn init(default_filter: &str) {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
