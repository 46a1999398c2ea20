//! Shared logging utilities for consistent tracing across the campaign

use chrono::{DateTime, Utc};
use tracing::{error, info};

/// Crates whose events pass the default filter
const LOGGED_CRATES: &[&str] = &["band_orchestrator", "shared"];

/// Build the filter directives for a base level, e.g. `band_orchestrator=info,shared=info`
pub fn filter_directives(log_level: Option<&str>) -> String {
    let base_level = log_level.unwrap_or("info");
    LOGGED_CRATES
        .iter()
        .map(|krate| format!("{krate}={base_level}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Initialize the stdout tracing subscriber
///
/// `RUST_LOG` takes precedence over the provided level when it is set.
pub fn init_tracing(log_level: Option<&str>) {
    use tracing_subscriber::{EnvFilter, fmt};

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_directives(log_level)));

    // try_init so repeated initialisation in tests is harmless
    let _ = fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init();
}

/// Get formatted timestamp for consistent logging
pub fn format_timestamp() -> String {
    let now: DateTime<Utc> = Utc::now();
    now.format("%H:%M:%S%.3f").to_string()
}

/// Macro for combination-aware info logging
#[macro_export]
macro_rules! combo_info {
    ($combination:expr, $($arg:tt)*) => {
        tracing::info!(
            combination = %$combination,
            timestamp = shared::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Macro for combination-aware warning logging
#[macro_export]
macro_rules! combo_warn {
    ($combination:expr, $($arg:tt)*) => {
        tracing::warn!(
            combination = %$combination,
            timestamp = shared::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Macro for combination-aware error logging
#[macro_export]
macro_rules! combo_error {
    ($combination:expr, $($arg:tt)*) => {
        tracing::error!(
            combination = %$combination,
            timestamp = shared::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Macro for combination-aware debug logging
#[macro_export]
macro_rules! combo_debug {
    ($combination:expr, $($arg:tt)*) => {
        tracing::debug!(
            combination = %$combination,
            timestamp = shared::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Contextual logging helper for startup messages
pub fn log_startup(details: &str) {
    info!(timestamp = format_timestamp(), "🚀 Starting {}", details);
}

/// Contextual logging helper for shutdown messages
pub fn log_shutdown(reason: &str) {
    info!(timestamp = format_timestamp(), "🛑 Shutting down: {}", reason);
}

/// Contextual logging helper for error conditions
pub fn log_error(context: &str, error: &dyn std::fmt::Display) {
    error!(
        timestamp = format_timestamp(),
        error = %error,
        "❌ {} failed: {}",
        context,
        error
    );
}

/// Contextual logging helper for success conditions
pub fn log_success(message: &str) {
    info!(timestamp = format_timestamp(), "✅ {}", message);
}

/// Contextual logging helper for campaign progress
pub fn log_progress(done: usize, total: usize, details: &str) {
    info!(
        timestamp = format_timestamp(),
        done,
        total,
        "📋 [{}/{}] {}",
        done,
        total,
        details
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directives() {
        assert_eq!(filter_directives(None), "band_orchestrator=info,shared=info");
        assert_eq!(filter_directives(Some("debug")), "band_orchestrator=debug,shared=debug");
    }

    #[test]
    fn test_timestamp_format() {
        let ts = format_timestamp();
        // HH:MM:SS.mmm
        assert_eq!(ts.len(), 12);
        assert_eq!(&ts[2..3], ":");
        assert_eq!(&ts[8..9], ".");
    }
}
