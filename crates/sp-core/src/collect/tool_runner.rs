//! Tool runner with timeout and output cap.
//!
//! Runs one external command with stdin closed and both output pipes
//! captured:
//!
//! - Wall-clock deadline with SIGTERM → SIGKILL escalation on expiry
//! - Output size cap to prevent memory exhaustion
//! - Non-blocking drain so a grandchild holding a pipe open cannot hang us
//!
//! # Example
//!
//! ```ignore
//! use sp_core::collect::tool_runner::ToolRunner;
//! use std::time::Duration;
//!
//! let runner = ToolRunner::with_defaults();
//! let output = runner.run_tool("xcrun", &["simctl", "list", "-j"], Some(Duration::from_secs(15)))?;
//! assert!(output.success());
//! ```

use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, error, info, instrument, trace, warn};

/// Default timeout per command in seconds.
pub const DEFAULT_TIMEOUT_SECS: f64 = 15.0;

/// Default maximum output size per stream in bytes (64MB).
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 64 * 1024 * 1024;

/// Grace period between SIGTERM and SIGKILL in milliseconds.
const SIGTERM_GRACE_MS: u64 = 500;

/// Sleep between polls when no output arrived.
const POLL_INTERVAL_MS: u64 = 10;

const CHUNK_SIZE: usize = 8192;

/// Errors that can occur during tool execution.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("command not found: {0}")]
    CommandNotFound(String),

    #[error("command failed to spawn: {0}")]
    SpawnFailed(String),

    #[error("command timed out after {0:?}")]
    Timeout(Duration),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid command path: {0}")]
    InvalidPath(String),
}

/// Output from a finished tool.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Standard output (may be truncated).
    pub stdout: Vec<u8>,

    /// Standard error (may be truncated).
    pub stderr: Vec<u8>,

    /// Exit code, if the process exited normally.
    pub exit_code: Option<i32>,

    /// Terminating signal, if the process was killed by one.
    pub signal: Option<i32>,

    /// Whether either stream hit the output cap.
    pub truncated: bool,
}

impl ToolOutput {
    /// Get stderr as string (lossy UTF-8 conversion).
    pub fn stderr_str(&self) -> String {
        String::from_utf8_lossy(&self.stderr).to_string()
    }

    /// Check if the command succeeded (exit code 0).
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Configuration for the tool runner.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolConfig {
    /// Timeout used when a call does not pass its own.
    pub default_timeout: Duration,

    /// Maximum bytes kept per stream.
    pub max_output_bytes: usize,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            default_timeout: Duration::from_secs_f64(DEFAULT_TIMEOUT_SECS),
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
        }
    }
}

/// Captured streams and status of a child that exited on its own.
struct Captured {
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    status: ExitStatus,
    truncated: bool,
}

/// Runs external tools one at a time.
#[derive(Debug, Clone, Default)]
pub struct ToolRunner {
    config: ToolConfig,
}

impl ToolRunner {
    /// Create a new tool runner with the given configuration.
    pub fn new(config: ToolConfig) -> Self {
        Self { config }
    }

    /// Create a tool runner with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(ToolConfig::default())
    }

    pub fn config(&self) -> &ToolConfig {
        &self.config
    }

    /// Run a single tool with the given command and arguments.
    ///
    /// A process that exits (successfully or not) is `Ok`; inspect
    /// [`ToolOutput::success`]. A process that outlives `timeout` is
    /// killed and reported as [`ToolError::Timeout`].
    #[instrument(skip(self, args))]
    pub fn run_tool(
        &self,
        cmd: &str,
        args: &[&str],
        timeout: Option<Duration>,
    ) -> Result<ToolOutput, ToolError> {
        self.validate_command(cmd)?;

        let timeout = timeout.unwrap_or(self.config.default_timeout);
        let max_output = self.config.max_output_bytes;

        debug!(
            command = %cmd,
            args = ?args,
            timeout_ms = timeout.as_millis() as u64,
            max_output,
            "running tool"
        );

        let start = Instant::now();

        let mut child = match Command::new(cmd)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
        {
            Ok(child) => child,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(command = %cmd, "command not found");
                return Err(ToolError::CommandNotFound(cmd.to_string()));
            }
            Err(e) => {
                error!(command = %cmd, error = %e, "failed to spawn");
                return Err(ToolError::SpawnFailed(e.to_string()));
            }
        };

        let result = self.execute_with_timeout(&mut child, timeout, max_output);
        let duration = start.elapsed();

        info!(
            command = %cmd,
            duration_ms = duration.as_millis() as u64,
            success = result.is_ok(),
            "tool execution complete"
        );

        let captured = result?;
        Ok(ToolOutput {
            stdout: captured.stdout,
            stderr: captured.stderr,
            exit_code: captured.status.code(),
            signal: exit_signal(&captured.status),
            truncated: captured.truncated,
        })
    }

    /// Reject commands that can never be spawned.
    fn validate_command(&self, cmd: &str) -> Result<(), ToolError> {
        if cmd.trim().is_empty() {
            return Err(ToolError::InvalidPath("empty command".to_string()));
        }

        // Explicit paths are checked up front; bare names go through PATH.
        if cmd.contains(std::path::MAIN_SEPARATOR) && !Path::new(cmd).exists() {
            return Err(ToolError::CommandNotFound(cmd.to_string()));
        }

        Ok(())
    }

    /// Execute a child process with timeout and output capture.
    fn execute_with_timeout(
        &self,
        child: &mut Child,
        timeout: Duration,
        max_output: usize,
    ) -> Result<Captured, ToolError> {
        // A timeout too large to represent as an instant never expires.
        let deadline = Instant::now().checked_add(timeout);
        let mut stdout_buf = Vec::with_capacity(max_output.min(65536));
        let mut stderr_buf = Vec::with_capacity(max_output.min(65536));
        let mut truncated = false;

        let mut stdout = child.stdout.take();
        let mut stderr = child.stderr.take();

        let mut chunk = vec![0u8; CHUNK_SIZE];

        loop {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                warn!(timeout_ms = timeout.as_millis() as u64, "command timed out, sending SIGTERM");
                kill_with_grace(child);
                return Err(ToolError::Timeout(timeout));
            }

            let mut did_read = false;

            if let Some(ref mut out) = stdout {
                if let Ok(n) = try_read_nonblocking(out, &mut chunk) {
                    if n > 0 {
                        did_read = true;
                        append_capped(&mut stdout_buf, &chunk[..n], max_output, &mut truncated);
                    }
                }
            }

            if let Some(ref mut err) = stderr {
                if let Ok(n) = try_read_nonblocking(err, &mut chunk) {
                    if n > 0 {
                        did_read = true;
                        append_capped(&mut stderr_buf, &chunk[..n], max_output, &mut truncated);
                    }
                }
            }

            match child.try_wait() {
                Ok(Some(status)) => {
                    if let Some(ref mut out) = stdout {
                        let _ = drain_to_limit(out, &mut stdout_buf, max_output, &mut truncated);
                    }
                    if let Some(ref mut err) = stderr {
                        let _ = drain_to_limit(err, &mut stderr_buf, max_output, &mut truncated);
                    }

                    trace!(exit_code = ?status.code(), "process exited");
                    return Ok(Captured {
                        stdout: stdout_buf,
                        stderr: stderr_buf,
                        status,
                        truncated,
                    });
                }
                Ok(None) => {
                    if !did_read {
                        thread::sleep(Duration::from_millis(POLL_INTERVAL_MS));
                    }
                }
                Err(e) => {
                    error!(error = %e, "failed to wait for child");
                    return Err(ToolError::Io(e));
                }
            }
        }
    }
}

/// Append `data` to `buf`, keeping at most `max` bytes.
fn append_capped(buf: &mut Vec<u8>, data: &[u8], max: usize, truncated: &mut bool) {
    let space = max.saturating_sub(buf.len());
    if data.len() > space {
        *truncated = true;
    }
    buf.extend_from_slice(&data[..data.len().min(space)]);
}

/// Drain whatever is immediately available from a stream, up to the limit.
///
/// Uses non-blocking reads: a grandchild may still hold the pipe open
/// after the direct child exits.
#[cfg(unix)]
fn drain_to_limit<R: Read + std::os::unix::io::AsRawFd>(
    stream: &mut R,
    buf: &mut Vec<u8>,
    max: usize,
    truncated: &mut bool,
) -> std::io::Result<()> {
    let mut chunk = vec![0u8; CHUNK_SIZE];
    while !*truncated {
        match try_read_nonblocking(stream, &mut chunk)? {
            0 => break,
            n => append_capped(buf, &chunk[..n], max, truncated),
        }
    }
    Ok(())
}

#[cfg(not(unix))]
fn drain_to_limit(
    stream: &mut impl Read,
    buf: &mut Vec<u8>,
    max: usize,
    truncated: &mut bool,
) -> std::io::Result<()> {
    let mut chunk = vec![0u8; CHUNK_SIZE];
    while !*truncated {
        let n = stream.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        append_capped(buf, &chunk[..n], max, truncated);
    }
    Ok(())
}

/// Kill a process with SIGTERM, then SIGKILL after the grace period.
///
/// Only the direct child is signalled.
#[cfg(unix)]
fn kill_with_grace(child: &mut Child) {
    let pid = child.id() as libc::pid_t;

    // SAFETY: `pid` is our own unreaped child, so it cannot have been reused.
    unsafe {
        libc::kill(pid, libc::SIGTERM);
    }
    debug!(pid, "sent SIGTERM");

    let grace_deadline = Instant::now() + Duration::from_millis(SIGTERM_GRACE_MS);
    loop {
        match child.try_wait() {
            Ok(Some(_)) => {
                trace!(pid, "process exited after SIGTERM");
                return;
            }
            Ok(None) if Instant::now() < grace_deadline => {
                thread::sleep(Duration::from_millis(POLL_INTERVAL_MS));
            }
            Ok(None) => {
                warn!(pid, "process did not exit after SIGTERM, sending SIGKILL");
                let _ = child.kill();
                let _ = child.wait();
                return;
            }
            Err(e) => {
                error!(pid, error = %e, "failed to check process status");
                return;
            }
        }
    }
}

#[cfg(not(unix))]
fn kill_with_grace(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

#[cfg(unix)]
fn exit_signal(status: &ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn exit_signal(_status: &ExitStatus) -> Option<i32> {
    None
}

/// Try to read from a stream without blocking.
///
/// Sets O_NONBLOCK on the descriptor for the duration of one read, then
/// restores the original flags. Returns Ok(0) when no data is available.
#[cfg(unix)]
fn try_read_nonblocking<R: Read + std::os::unix::io::AsRawFd>(
    stream: &mut R,
    buf: &mut [u8],
) -> std::io::Result<usize> {
    let fd = stream.as_raw_fd();

    // SAFETY: fcntl on a descriptor owned by `stream`, which outlives this call.
    let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
    if flags < 0 {
        return Err(std::io::Error::last_os_error());
    }

    let was_nonblocking = (flags & libc::O_NONBLOCK) != 0;
    if !was_nonblocking {
        // SAFETY: as above.
        let result = unsafe { libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK) };
        if result < 0 {
            return Err(std::io::Error::last_os_error());
        }
    }

    let result = stream.read(buf);

    if !was_nonblocking {
        // SAFETY: as above.
        unsafe {
            libc::fcntl(fd, libc::F_SETFL, flags);
        }
    }

    match result {
        Ok(n) => Ok(n),
        Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(0),
        Err(e) => Err(e),
    }
}

#[cfg(not(unix))]
fn try_read_nonblocking<R: Read>(stream: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    stream.read(buf)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn test_runner() -> ToolRunner {
        ToolRunner::with_defaults()
    }

    #[test]
    fn test_run_echo() {
        let result = test_runner().run_tool("echo", &["hello", "world"], None);

        assert!(result.is_ok(), "echo failed: {:?}", result);
        let output = result.unwrap();
        assert!(output.success());
        assert_eq!(output.stdout, b"hello world\n");
        assert!(!output.truncated);
    }

    #[test]
    fn test_run_with_stderr() {
        let output = test_runner()
            .run_tool("sh", &["-c", "echo error >&2"], None)
            .unwrap();
        assert!(output.success());
        assert!(output.stderr_str().contains("error"));
        assert!(output.stdout.is_empty());
    }

    #[test]
    fn test_nonzero_exit() {
        let output = test_runner().run_tool("sh", &["-c", "exit 42"], None).unwrap();
        assert!(!output.success());
        assert_eq!(output.exit_code, Some(42));
        assert_eq!(output.signal, None);
    }

    #[test]
    fn test_killed_by_signal() {
        let output = test_runner()
            .run_tool("sh", &["-c", "kill -9 $$"], None)
            .unwrap();
        assert!(!output.success());
        assert_eq!(output.exit_code, None);
        assert_eq!(output.signal, Some(9));
    }

    #[test]
    fn test_command_not_found_on_path() {
        let result = test_runner().run_tool("sp-definitely-not-a-real-tool", &[], None);
        match result {
            Err(ToolError::CommandNotFound(cmd)) => assert_eq!(cmd, "sp-definitely-not-a-real-tool"),
            other => panic!("expected CommandNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_command_not_found_absolute() {
        let result = test_runner().run_tool("/nonexistent/command/that/does/not/exist", &[], None);
        assert!(matches!(result, Err(ToolError::CommandNotFound(_))));
    }

    #[test]
    fn test_empty_command_rejected() {
        let result = test_runner().run_tool("  ", &[], None);
        assert!(matches!(result, Err(ToolError::InvalidPath(_))));
    }

    #[test]
    fn test_timeout() {
        let start = Instant::now();
        let result = test_runner().run_tool("sleep", &["10"], Some(Duration::from_millis(100)));

        match result {
            Err(ToolError::Timeout(t)) => assert_eq!(t, Duration::from_millis(100)),
            other => panic!("expected Timeout, got {:?}", other),
        }
        // Process should have been killed
        assert!(start.elapsed() < Duration::from_secs(3));
    }

    #[test]
    fn test_unrepresentable_timeout_never_expires() {
        let output = test_runner()
            .run_tool("echo", &["ok"], Some(Duration::from_secs(u64::MAX)))
            .unwrap();
        assert!(output.success());
        assert_eq!(output.stdout, b"ok\n");
    }

    #[test]
    fn test_default_timeout_from_config() {
        let runner = ToolRunner::new(ToolConfig {
            default_timeout: Duration::from_millis(100),
            ..Default::default()
        });
        let result = runner.run_tool("sleep", &["10"], None);
        assert!(matches!(result, Err(ToolError::Timeout(_))));
    }

    #[test]
    fn test_output_truncation() {
        let runner = ToolRunner::new(ToolConfig {
            max_output_bytes: 100,
            ..Default::default()
        });

        let output = runner
            .run_tool("sh", &["-c", "yes | head -n 1000"], None)
            .unwrap();
        assert!(output.truncated);
        assert!(output.stdout.len() <= 100);
    }

    #[test]
    fn test_large_output_is_complete() {
        let output = test_runner()
            .run_tool("sh", &["-c", "yes | head -n 50000"], None)
            .unwrap();
        assert!(!output.truncated);
        assert_eq!(output.stdout.len(), 100_000);
    }

    #[test]
    fn test_config_defaults() {
        let config = ToolConfig::default();
        assert_eq!(config.default_timeout, Duration::from_secs(15));
        assert_eq!(config.max_output_bytes, 64 * 1024 * 1024);
    }

    #[test]
    fn test_append_capped() {
        let mut buf = Vec::new();
        let mut truncated = false;
        append_capped(&mut buf, b"hello", 8, &mut truncated);
        assert!(!truncated);
        append_capped(&mut buf, b"world", 8, &mut truncated);
        assert!(truncated);
        assert_eq!(buf, b"hellowor");
    }
}
