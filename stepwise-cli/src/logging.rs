//! Diagnostic logging for the `stepwise` binary.
//!
//! Logging is off unless requested through the environment, so the
//! progress lines printed by [`crate::output`] stay the only output by
//! default. Log records go to stderr.
//!
//! # Environment Variables
//!
//! - `STEPWISE_DEBUG=true|1|yes` - Enable debug logging
//! - `STEPWISE_LOG_LEVEL=trace|debug|info|warn|error` - Set a specific level
//! - `STEPWISE_LOG_FORMAT=json|pretty|compact` - Set the format (default: json)

use std::env;
use std::sync::Once;

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

static INIT: Once = Once::new();

const CRATES: [&str; 4] = ["stepwise", "stepwise_migrate", "stepwise_sqlite", "stepwise_cli"];

/// Check if debug logging is enabled via `STEPWISE_DEBUG`.
pub fn is_debug_enabled() -> bool {
    env::var("STEPWISE_DEBUG")
        .map(|v| parse_flag(&v))
        .unwrap_or(false)
}

fn parse_flag(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "yes")
}

/// Get the configured log level.
///
/// Defaults to "debug" if `STEPWISE_DEBUG` is enabled, otherwise "warn".
pub fn get_log_level() -> &'static str {
    resolve_level(
        env::var("STEPWISE_LOG_LEVEL").ok().as_deref(),
        is_debug_enabled(),
    )
}

fn resolve_level(requested: Option<&str>, debug: bool) -> &'static str {
    let fallback = if debug { "debug" } else { "warn" };
    match requested.map(str::to_lowercase).as_deref() {
        Some("trace") => "trace",
        Some("debug") => "debug",
        Some("info") => "info",
        Some("warn") => "warn",
        Some("error") => "error",
        _ => fallback,
    }
}

/// Get the configured log format, defaulting to "json".
pub fn get_log_format() -> &'static str {
    resolve_format(env::var("STEPWISE_LOG_FORMAT").ok().as_deref())
}

fn resolve_format(requested: Option<&str>) -> &'static str {
    match requested.map(str::to_lowercase).as_deref() {
        Some("pretty") => "pretty",
        Some("compact") => "compact",
        _ => "json",
    }
}

fn filter_directives(level: &str) -> String {
    CRATES
        .iter()
        .map(|krate| format!("{}={}", krate, level))
        .collect::<Vec<_>>()
        .join(",")
}

/// Initialize logging. Subsequent calls are no-ops.
pub fn init() {
    INIT.call_once(|| {
        if !is_debug_enabled() && env::var("STEPWISE_LOG_LEVEL").is_err() {
            return;
        }

        let level = get_log_level();
        let filter =
            EnvFilter::try_new(filter_directives(level)).unwrap_or_else(|_| EnvFilter::new("warn"));

        match get_log_format() {
            "json" => {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt::layer().json().with_writer(std::io::stderr))
                    .init();
            }
            "compact" => {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt::layer().compact().with_writer(std::io::stderr))
                    .init();
            }
            _ => {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt::layer().pretty().with_writer(std::io::stderr))
                    .init();
            }
        }

        tracing::info!(level = level, format = get_log_format(), "Stepwise logging initialized");
    });
}
