/*!
Logging setup for the command-line binary.

Logs are written to stderr so that stdout only carries the JSON results. When the
`profiling` feature is enabled, the `profiling` scopes in the library are emitted as
tracing spans and show up through the same subscriber.
*/

use tracing_subscriber::prelude::*;

/// Default filter used when `RUST_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Initialize logging with sensible defaults
pub fn setup_logging_and_profiling() {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::fmt;

    if std::env::var("RUST_LOG").is_err() {
        // Safety: single-threaded at startup
        unsafe {
            std::env::set_var("RUST_LOG", DEFAULT_LOG_FILTER);
        }
    }

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_default_env());
    let registry = tracing_subscriber::registry().with(fmt_layer);
    registry.init();

    if cfg!(feature = "profiling") {
        tracing::info!("Logging initialized (library scopes traced as spans)");
    } else {
        tracing::debug!("Logging initialized (profiling disabled in this build)");
    }
}
