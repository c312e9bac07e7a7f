//! Logging setup for the CLI
//!
//! Logs go to stdout alongside the REPL output. Set `DEBUG_LOGGING=1` to get
//! debug output (interval transitions, lifecycle events) from ticktock crates.

use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

pub fn init() {
    let debug_logging = std::env::var("DEBUG_LOGGING").is_ok();

    let stdout_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(true)
        .with_span_events(FmtSpan::NONE);

    let filter_directive = if debug_logging {
        "info,ticktock_core=debug,ticktock_cli=debug"
    } else {
        "warn"
    };

    tracing_subscriber::registry()
        .with(stdout_layer)
        .with(EnvFilter::new(filter_directive))
        .init();

    tracing::debug!(debug_logging, "logging initialized");
}
