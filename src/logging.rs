use std::io::IsTerminal;
use tracing_subscriber::EnvFilter;

/// Installs the global `tracing` subscriber.
///
/// Output goes to stderr so CSV written to stdout stays machine-readable.
/// `verbose` forces debug level for this crate; otherwise `filter` (an
/// env-filter directive such as `warn` or `brokerdesk=info`) applies.
pub fn init(filter: &str, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("brokerdesk=debug")
    } else {
        EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    // A second initialization (e.g. from tests) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .try_init();
}
