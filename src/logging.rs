//! Tracing setup shared by the binaries.
//!
//! Logs go to stderr: stdout carries the RPC protocol.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "vault=info";

/// Installs the global subscriber. `RUST_LOG` overrides the default filter.
/// Calling it twice is harmless.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}
