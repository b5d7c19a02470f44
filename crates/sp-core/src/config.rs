//! Resolved configuration for one pick.
//!
//! Resolution order is CLI flag > environment variable > default; clap
//! handles the first two, this module owns the defaults and validation.

use std::time::Duration;

use sp_common::SelectionRequest;

use crate::collect::tool_runner::DEFAULT_TIMEOUT_SECS;

/// Default listing executable.
pub const DEFAULT_XCRUN: &str = "xcrun";

/// Environment fallback for `--xcrun`.
pub const XCRUN_ENV: &str = "SIMCTL_PICK_XCRUN";

/// Environment fallback for `--timeout-seconds`.
pub const TIMEOUT_ENV: &str = "SIMCTL_PICK_TIMEOUT_SECONDS";

/// Everything needed to run one pick.
#[derive(Debug, Clone, PartialEq)]
pub struct PickConfig {
    /// Catalog key to resolve.
    pub runtime: String,
    /// Name preferences and substring fallback.
    pub request: SelectionRequest,
    /// Listing executable (name on PATH or explicit path).
    pub xcrun: String,
    /// Bound on the listing call.
    pub timeout: Duration,
}

impl PickConfig {
    pub fn new(runtime: impl Into<String>) -> Self {
        Self {
            runtime: runtime.into(),
            request: SelectionRequest::default(),
            xcrun: DEFAULT_XCRUN.to_string(),
            timeout: Duration::from_secs_f64(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_request(mut self, request: SelectionRequest) -> Self {
        self.request = request;
        self
    }

    pub fn with_xcrun(mut self, xcrun: impl Into<String>) -> Self {
        self.xcrun = xcrun.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Parse a timeout given in (fractional) seconds.
///
/// Used as the clap value parser for `--timeout-seconds`; rejects zero,
/// negative, and non-finite values.
pub fn parse_timeout_seconds(raw: &str) -> Result<Duration, String> {
    let secs: f64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("invalid number of seconds: {}", raw))?;
    if !secs.is_finite() || secs <= 0.0 {
        return Err(format!("timeout must be a positive number of seconds, got {}", raw));
    }
    Duration::try_from_secs_f64(secs).map_err(|e| format!("timeout out of range: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PickConfig::new("com.apple.CoreSimulator.SimRuntime.iOS-17-2");
        assert_eq!(config.xcrun, "xcrun");
        assert_eq!(config.timeout, Duration::from_secs(15));
        assert!(config.request.preferred_names.is_empty());
        assert!(config.request.contains.is_none());
    }

    #[test]
    fn test_builder() {
        let config = PickConfig::new("rt")
            .with_xcrun("/usr/local/bin/fake-xcrun")
            .with_timeout(Duration::from_millis(250))
            .with_request(SelectionRequest::new().prefer("iPhone 15"));
        assert_eq!(config.xcrun, "/usr/local/bin/fake-xcrun");
        assert_eq!(config.timeout, Duration::from_millis(250));
        assert_eq!(config.request.preferred_names, vec!["iPhone 15"]);
    }

    #[test]
    fn test_parse_timeout_seconds() {
        assert_eq!(parse_timeout_seconds("15").unwrap(), Duration::from_secs(15));
        assert_eq!(parse_timeout_seconds("15.0").unwrap(), Duration::from_secs(15));
        assert_eq!(parse_timeout_seconds("0.5").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_timeout_seconds(" 2 ").unwrap(), Duration::from_secs(2));
    }

    #[test]
    fn test_parse_timeout_seconds_rejects_bad_values() {
        for raw in ["", "abc", "0", "-1", "NaN", "inf", "1e400"] {
            assert!(parse_timeout_seconds(raw).is_err(), "accepted {:?}", raw);
        }
    }
}
