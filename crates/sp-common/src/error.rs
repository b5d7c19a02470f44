//! Error types for simctl-pick.
//!
//! Every failure of an invocation falls into one of four categories, and
//! each category maps to one stable process exit code (see
//! `sp_core::exit_codes`). Errors carry a remediation hint for humans:
//!
//! ```text
//! error: `xcrun` not found
//! hint: Install the Xcode command line tools with 'xcode-select --install', or pass --xcrun <PATH>.
//! ```

use serde::{Deserialize, Serialize};
use std::io::Write;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for simctl-pick operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// The listing tool is missing or cannot be started.
    Environment,
    /// The listing tool did not finish in time.
    Timeout,
    /// The listing tool ran but reported failure.
    ExternalTool,
    /// The listing tool's output is not JSON.
    Decode,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Environment => write!(f, "environment"),
            ErrorCategory::Timeout => write!(f, "timeout"),
            ErrorCategory::ExternalTool => write!(f, "external_tool"),
            ErrorCategory::Decode => write!(f, "decode"),
        }
    }
}

/// Unified error type for simctl-pick.
#[derive(Error, Debug)]
pub enum Error {
    #[error("`{tool}` not found")]
    ToolNotFound { tool: String },

    #[error("failed to start `{tool}`: {reason}")]
    SpawnFailed { tool: String, reason: String },

    #[error("`{command}` timed out after {:.1}s", .timeout.as_secs_f64())]
    Timeout { command: String, timeout: Duration },

    #[error("`{command}` failed ({status})")]
    ToolFailed {
        command: String,
        status: ToolStatus,
        stderr: Vec<u8>,
    },

    #[error("I/O error while running `{command}`: {source}")]
    Io {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse `{command}` output as JSON: {source}")]
    Decode {
        command: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("`{command}` output exceeded {limit} bytes")]
    OutputTooLarge { command: String, limit: usize },
}

/// How a finished external tool ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolStatus {
    Exited(i32),
    Signaled(i32),
    Unknown,
}

impl ToolStatus {
    pub fn from_parts(exit_code: Option<i32>, signal: Option<i32>) -> Self {
        match (exit_code, signal) {
            (Some(code), _) => ToolStatus::Exited(code),
            (None, Some(sig)) => ToolStatus::Signaled(sig),
            (None, None) => ToolStatus::Unknown,
        }
    }
}

impl std::fmt::Display for ToolStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolStatus::Exited(code) => write!(f, "exit status {}", code),
            ToolStatus::Signaled(sig) => write!(f, "killed by signal {}", sig),
            ToolStatus::Unknown => write!(f, "unknown exit status"),
        }
    }
}

impl Error {
    /// Returns the error category; the exit code is derived from it.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::ToolNotFound { .. } | Error::SpawnFailed { .. } => ErrorCategory::Environment,
            Error::Timeout { .. } => ErrorCategory::Timeout,
            Error::ToolFailed { .. } | Error::Io { .. } => ErrorCategory::ExternalTool,
            Error::Decode { .. } | Error::OutputTooLarge { .. } => ErrorCategory::Decode,
        }
    }

    /// Returns a human-readable remediation hint.
    pub fn remediation(&self) -> &'static str {
        match self {
            Error::ToolNotFound { .. } => {
                "Install the Xcode command line tools with 'xcode-select --install', or pass --xcrun <PATH>."
            }
            Error::SpawnFailed { .. } => {
                "Check that the listing tool is executable by the current user, or pass --xcrun <PATH>."
            }
            Error::Timeout { .. } => {
                "CoreSimulator may be wedged. Reset it with 'xcrun simctl shutdown all' (or 'killall -9 com.apple.CoreSimulator.CoreSimulatorService'), or raise --timeout-seconds."
            }
            Error::ToolFailed { .. } | Error::Io { .. } => {
                "Run 'xcrun simctl list devices available -j' manually to inspect the failure."
            }
            Error::Decode { .. } | Error::OutputTooLarge { .. } => {
                "The listing tool printed something other than a JSON device list. Check the selected Xcode with 'xcode-select -p'."
            }
        }
    }

    /// Raw error-stream bytes captured from the listing tool, if any.
    pub fn tool_stderr(&self) -> Option<&[u8]> {
        match self {
            Error::ToolFailed { stderr, .. } if !stderr.is_empty() => Some(stderr),
            _ => None,
        }
    }

    /// Write the diagnostic block shown before exiting.
    ///
    /// Captured tool stderr is forwarded byte for byte, followed by a
    /// newline if it does not already end with one.
    pub fn write_diagnostic<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        writeln!(out, "error: {}", self)?;
        writeln!(out, "hint: {}", self.remediation())?;
        if let Some(stderr) = self.tool_stderr() {
            out.write_all(stderr)?;
            if !stderr.ends_with(b"\n") {
                out.write_all(b"\n")?;
            }
        }
        out.flush()
    }
}
