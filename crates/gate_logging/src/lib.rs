#![deny(missing_docs)]
//! Shared logging utilities for the harvest_gate workspace.
//!
//! This crate provides the `gate_*` logging macros used across the codebase,
//! helpers that keep license secrets out of log output, and a minimal test
//! initializer for the global logger.

/// Number of leading characters of a secret that stay readable in logs.
pub const VISIBLE_SECRET_PREFIX: usize = 4;

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! gate_trace {
    ($($arg:tt)*) => {{
        log::trace!($($arg)*);
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! gate_info {
    ($($arg:tt)*) => {{
        log::info!($($arg)*);
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! gate_debug {
    ($($arg:tt)*) => {{
        log::debug!($($arg)*);
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! gate_warn {
    ($($arg:tt)*) => {{
        log::warn!($($arg)*);
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! gate_error {
    ($($arg:tt)*) => {{
        log::error!($($arg)*);
    }};
}

/// Masks a secret (session token, license key) for log output.
///
/// Keeps the first [`VISIBLE_SECRET_PREFIX`] characters so log lines can still
/// be correlated, and replaces the remainder with its length.
pub fn mask_secret(secret: &str) -> String {
    let total = secret.chars().count();
    if total <= VISIBLE_SECRET_PREFIX {
        return "<redacted>".to_string();
    }
    let prefix: String = secret.chars().take(VISIBLE_SECRET_PREFIX).collect();
    format!("{prefix}…<{} more>", total - VISIBLE_SECRET_PREFIX)
}

/// Parses a log level name (`trace`, `debug`, `info`, `warn`, `error`, `off`).
///
/// Matching is case-insensitive. Unknown or missing names fall back to `default`.
pub fn parse_level(name: Option<&str>, default: log::LevelFilter) -> log::LevelFilter {
    name.and_then(|n| n.trim().parse().ok()).unwrap_or(default)
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
