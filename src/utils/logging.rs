//! Diagnostic logging setup.
//!
//! Provider failures are absorbed by fallback chains, so these logs are the
//! only place an operator can see that a provider is down.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `nexora=debug`.
pub const LOG_FILTER_ENV: &str = "NEXORA_LOG";

const DEFAULT_FILTER: &str = "warn";

/// Build the filter from `NEXORA_LOG`, or from `verbosity` when it is
/// unset. Invalid directives fall back to the default.
pub fn build_filter(verbosity: u8) -> EnvFilter {
    if let Some(filter) = std::env::var(LOG_FILTER_ENV)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .and_then(|value| EnvFilter::try_new(value).ok())
    {
        return filter;
    }

    let directive = match verbosity {
        0 => DEFAULT_FILTER,
        1 => "nexora=info,warn",
        2 => "nexora=debug,warn",
        _ => "nexora=trace,info",
    };
    EnvFilter::new(directive)
}

/// Install the global subscriber, writing compact lines to stderr so
/// stdout stays clean for responses. Calling it twice is harmless.
pub fn init(verbosity: u8) {
    let _ = tracing_subscriber::registry()
        .with(build_filter(verbosity))
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init();
}
