//! Exit codes for the simctl-pick CLI.
//!
//! Exit codes are the only structured status signal callers consume; stdout
//! carries the identifier and stderr is for humans. "No matching device" is
//! a success with empty output, not an error.
//!
//! Usage errors detected by clap exit with clap's own code (2).

use sp_common::{Error, ErrorCategory};

/// Exit codes for simctl-pick.
///
/// These codes are a stable contract for automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Identifier written to stdout (possibly empty)
    Success = 0,

    /// Listing tool missing or could not be started
    ToolNotFound = 1,

    /// Listing tool did not finish within the timeout
    Timeout = 2,

    /// Listing tool exited unsuccessfully
    ToolFailed = 3,

    /// Listing output is not JSON
    DecodeError = 4,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn is_success(self) -> bool {
        self == ExitCode::Success
    }

    /// Get the code name as a string constant (for JSON logs).
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Success => "OK",
            ExitCode::ToolNotFound => "ERR_TOOL_NOT_FOUND",
            ExitCode::Timeout => "ERR_TIMEOUT",
            ExitCode::ToolFailed => "ERR_TOOL_FAILED",
            ExitCode::DecodeError => "ERR_DECODE",
        }
    }
}

impl From<ErrorCategory> for ExitCode {
    fn from(category: ErrorCategory) -> Self {
        match category {
            ErrorCategory::Environment => ExitCode::ToolNotFound,
            ErrorCategory::Timeout => ExitCode::Timeout,
            ErrorCategory::ExternalTool => ExitCode::ToolFailed,
            ErrorCategory::Decode => ExitCode::DecodeError,
        }
    }
}

impl From<&Error> for ExitCode {
    fn from(err: &Error) -> Self {
        err.category().into()
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}
