//! Logging setup for the frontend
//!
//! In the browser, events go to the devtools console through `tracing-web`;
//! native builds (tests, server-side rendering) log to stdout.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter when none is given or the given one does not parse
pub const DEFAULT_LOG_DIRECTIVE: &str = "info";

/// Build the filter from `directive`, falling back to `info`
pub fn env_filter(directive: &str) -> EnvFilter {
    EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_DIRECTIVE))
}

/// Install the global subscriber.
///
/// Returns `false` when a subscriber was already installed, in which case
/// nothing changes.
#[cfg(target_arch = "wasm32")]
pub fn init_logging(directive: &str) -> bool {
    use tracing_web::MakeWebConsoleWriter;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .without_time()
        .with_target(true)
        .with_writer(MakeWebConsoleWriter::new());

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter(directive))
        .try_init()
        .is_ok()
}

#[cfg(not(target_arch = "wasm32"))]
pub fn init_logging(directive: &str) -> bool {
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(true);

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter(directive))
        .try_init()
        .is_ok()
}
