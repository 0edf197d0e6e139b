//! Tracing/logging initialization
//!
//! Logs go to stderr so list output on stdout stays pipeable.

use tracing_subscriber::EnvFilter;

/// Default filter directive for the verbosity flags
pub fn default_directive(verbose: bool, quiet: bool) -> &'static str {
    if verbose {
        "lilerp=debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    }
}

/// Initialize tracing for the process
///
/// `RUST_LOG` wins over the flags. Safe to call more than once.
pub fn init(verbose: bool, quiet: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose, quiet)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
