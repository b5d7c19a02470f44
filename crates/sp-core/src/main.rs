//! simctl-pick - resolve a simulator UDID from `xcrun simctl`.
//!
//! Prints the selected identifier on stdout with no trailing newline and
//! exits 0, even when nothing matched (empty output). Failures print a
//! diagnostic on stderr and exit with a code from `sp_core::exit_codes`.

use std::io::Write;
use std::time::Duration;

use clap::Parser;
use sp_common::SelectionRequest;
use sp_core::collect::ToolRunner;
use sp_core::config::{parse_timeout_seconds, PickConfig, DEFAULT_XCRUN, TIMEOUT_ENV, XCRUN_ENV};
use sp_core::exit_codes::ExitCode;
use sp_core::logging::{init_logging, LogConfig, LogFormat, LogLevel};
use sp_core::pick;

/// Pick a preferred simulator device UDID from `xcrun simctl list devices available -j`.
#[derive(Parser, Debug)]
#[command(name = "simctl-pick")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Simulator runtime identifier (e.g. "com.apple.CoreSimulator.SimRuntime.iOS-17-2")
    #[arg(long)]
    runtime: String,

    /// Preferred device name (can be passed multiple times; earlier wins)
    #[arg(long, value_name = "NAME")]
    prefer: Vec<String>,

    /// Fallback substring match for device name (e.g. "iPhone" or "Apple Watch")
    #[arg(long, value_name = "TEXT")]
    contains: Option<String>,

    /// Maximum time to wait for simctl, in seconds
    #[arg(
        long,
        value_name = "SECONDS",
        env = TIMEOUT_ENV,
        default_value = "15.0",
        value_parser = parse_timeout_seconds
    )]
    timeout_seconds: Duration,

    /// Listing executable to run instead of `xcrun`
    #[arg(long, value_name = "PATH", env = XCRUN_ENV, default_value = DEFAULT_XCRUN)]
    xcrun: String,

    /// Log format on stderr (human, jsonl)
    #[arg(long, value_name = "FORMAT")]
    log_format: Option<LogFormat>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    fn log_level(&self) -> Option<LogLevel> {
        if self.quiet {
            return Some(LogLevel::Error);
        }
        match self.verbose {
            0 => None,
            1 => Some(LogLevel::Debug),
            _ => Some(LogLevel::Trace),
        }
    }

    fn into_config(self) -> PickConfig {
        let request = SelectionRequest::new()
            .with_preferred(self.prefer)
            .with_contains(self.contains);
        PickConfig::new(self.runtime)
            .with_request(request)
            .with_xcrun(self.xcrun)
            .with_timeout(self.timeout_seconds)
    }
}

fn main() {
    let cli = Cli::parse();

    init_logging(&LogConfig::from_env(cli.log_level(), cli.log_format));

    let config = cli.into_config();
    let exit_code = match pick::run(&ToolRunner::with_defaults(), &config) {
        Ok(selection) => write_udid(&selection.udid),
        Err(err) => {
            let code = ExitCode::from(&err);
            tracing::debug!(exit_code = %code, category = %err.category(), "pick failed");
            let _ = err.write_diagnostic(&mut std::io::stderr().lock());
            code
        }
    };

    std::process::exit(exit_code.as_i32());
}

/// Write the identifier with no trailing newline.
///
/// `process::exit` skips destructors, so stdout is flushed here.
fn write_udid(udid: &str) -> ExitCode {
    let mut stdout = std::io::stdout().lock();
    match stdout.write_all(udid.as_bytes()).and_then(|()| stdout.flush()) {
        Ok(()) => ExitCode::Success,
        Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => ExitCode::Success,
        Err(e) => {
            eprintln!("error: failed to write to stdout: {}", e);
            ExitCode::ToolFailed
        }
    }
}
