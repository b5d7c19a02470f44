//! Device listing via `xcrun simctl list devices available -j`.

use std::time::Duration;

use sp_common::{DeviceCatalog, Error, ToolStatus};
use tracing::debug;

use super::tool_runner::{ToolError, ToolRunner};
use crate::logging::truncate_for_log;

/// Arguments passed to the listing executable.
pub const SIMCTL_LIST_ARGS: [&str; 5] = ["simctl", "list", "devices", "available", "-j"];

/// Human-readable form of the listing invocation, for diagnostics.
pub fn display_command(program: &str) -> String {
    format!("{} {}", program, SIMCTL_LIST_ARGS.join(" "))
}

/// Run the listing tool once and decode its output.
///
/// Failures surface in the order they arise: missing tool, timeout,
/// non-zero exit, then undecodable output.
pub fn list_devices(
    runner: &ToolRunner,
    program: &str,
    timeout: Duration,
) -> Result<DeviceCatalog, Error> {
    let command = display_command(program);

    let output = runner
        .run_tool(program, &SIMCTL_LIST_ARGS, Some(timeout))
        .map_err(|e| map_tool_error(e, program, &command))?;

    if !output.success() {
        debug!(
            command = %command,
            exit_code = ?output.exit_code,
            stderr = %truncate_for_log(output.stderr_str().trim_end(), 200),
            "listing tool failed"
        );
        return Err(Error::ToolFailed {
            command,
            status: ToolStatus::from_parts(output.exit_code, output.signal),
            stderr: output.stderr,
        });
    }

    if output.truncated {
        return Err(Error::OutputTooLarge {
            command,
            limit: runner.config().max_output_bytes,
        });
    }

    let catalog = DeviceCatalog::from_slice(&output.stdout)
        .map_err(|source| Error::Decode { command, source })?;

    debug!(
        runtimes = catalog.len(),
        bytes = output.stdout.len(),
        "decoded device catalog"
    );
    Ok(catalog)
}

fn map_tool_error(err: ToolError, program: &str, command: &str) -> Error {
    match err {
        ToolError::CommandNotFound(_) => Error::ToolNotFound {
            tool: program.to_string(),
        },
        ToolError::SpawnFailed(reason) | ToolError::InvalidPath(reason) => Error::SpawnFailed {
            tool: program.to_string(),
            reason,
        },
        ToolError::Timeout(timeout) => Error::Timeout {
            command: command.to_string(),
            timeout,
        },
        ToolError::Io(source) => Error::Io {
            command: command.to_string(),
            source,
        },
    }
}
