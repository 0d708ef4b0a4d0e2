//! Diagnostic output on stderr through `tracing`.

use tracing_subscriber::EnvFilter;

/// Default filter directive for the given verbosity flags.
#[must_use]
pub fn default_directive(verbose: bool, quiet: bool) -> &'static str {
    if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    }
}

/// Installs the global subscriber. `RUST_LOG` takes precedence over the
/// flags. Later calls in the same process are no-ops.
pub fn init(verbose: bool, quiet: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose, quiet)));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}
