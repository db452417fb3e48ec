//! Diagnostic logging for the CLI.
//!
//! Library code emits `tracing` events; this installs the subscriber that
//! prints them. Logs go to stderr so stdout carries only the command's report.

use std::io;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use tracing_subscriber::Layer;

/// Default filter directive for the given verbosity.
pub fn default_directive(verbose: bool) -> String {
    let level = if verbose { "debug" } else { "info" };
    format!("gallery_manager={level}")
}

/// Initialize the logging system.
///
/// `RUST_LOG` overrides the default filter. Calling this twice is harmless;
/// the second subscriber is ignored.
///
/// ```ignore
/// logging::init(cli.verbose);
/// ```
pub fn init(verbose: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let stderr_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .with_thread_names(verbose)
        .compact();
    let stderr_layer = if verbose {
        stderr_layer.with_filter(env_filter).boxed()
    } else {
        stderr_layer.without_time().with_filter(env_filter).boxed()
    };

    let _ = tracing_subscriber::registry().with(stderr_layer).try_init();
}
