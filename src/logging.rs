//! Logging setup.
//!
//! Structured logs go to **stderr** through `tracing-subscriber`, so stdout
//! stays parseable for scripts. Verbosity follows `RUST_LOG`
//! (e.g. `RUST_LOG=swapi_explorer=debug`) and defaults to `warn`.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber. Safe to call more than once.
pub fn init(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
