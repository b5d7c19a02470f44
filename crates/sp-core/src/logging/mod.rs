//! Structured logging for simctl-pick.
//!
//! Provides dual-mode logging:
//! - Human-readable console output for interactive use
//! - Machine-parseable JSONL for CI log collectors
//!
//! # Design Notes
//!
//! - stdout is reserved for the selected identifier
//! - stderr receives all log output (human or JSONL)
//! - The default level is `warn`, so successful runs are silent

pub mod config;

pub use config::{LogConfig, LogFormat, LogLevel, LOG_FORMAT_ENV, LOG_LEVEL_ENV};

use std::io::IsTerminal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Build the filter: `RUST_LOG` wins when set and valid, otherwise the
/// configured level applies to every target.
fn build_filter(config: &LogConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.level.to_string()))
}

/// Initialize the logging subsystem.
///
/// Call once at startup before any logging occurs. A second call is a
/// no-op.
pub fn init_logging(config: &LogConfig) {
    let filter = build_filter(config);

    let result = match config.format {
        LogFormat::Human => {
            let use_ansi = std::io::stderr().is_terminal();
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_ansi(use_ansi)
                .without_time();
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .try_init()
        }
        LogFormat::Jsonl => {
            let json_layer = fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_current_span(false)
                .with_span_list(false);
            tracing_subscriber::registry()
                .with(filter)
                .with(json_layer)
                .try_init()
        }
    };

    if let Err(e) = result {
        tracing::debug!(error = %e, "logging already initialized");
    }
}

/// Shorten a potentially long string (tool stderr, JSON excerpts) for a
/// log field.
pub fn truncate_for_log(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut end = max_len;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...(truncated)", &s[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_for_log_short() {
        assert_eq!(truncate_for_log("short", 10), "short");
    }

    #[test]
    fn test_truncate_for_log_long() {
        let s = "this is a very long string that should be truncated";
        let truncated = truncate_for_log(s, 10);
        assert!(truncated.starts_with("this is a "));
        assert!(truncated.ends_with("...(truncated)"));
    }

    #[test]
    fn test_truncate_for_log_char_boundary() {
        // "é" is two bytes; cutting at 1 must back off to 0.
        assert_eq!(truncate_for_log("éa", 1), "...(truncated)");
    }

    #[test]
    fn test_init_twice_is_harmless() {
        let config = LogConfig {
            level: LogLevel::Off,
            ..LogConfig::default()
        };
        init_logging(&config);
        init_logging(&config);
    }
}
