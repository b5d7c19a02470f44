//! Fake simctl harness for CLI tests.
//!
//! Tests run the binary with `--xcrun sh` from inside a temp directory that
//! holds a script named `simctl`. The binary then executes
//! `sh simctl list devices available -j`, so the script stands in for
//! `xcrun simctl` without writing and exec'ing a fresh executable (which can
//! fail with ETXTBSY under the parallel test runner).

#![allow(dead_code)]

use assert_cmd::Command;
use std::fs;
use tempfile::TempDir;

pub const IOS_17: &str = "com.apple.CoreSimulator.SimRuntime.iOS-17-2";

/// Environment variables that change logging or tool selection.
const SCRUBBED_ENV: &[&str] = &[
    "RUST_LOG",
    "SIMCTL_PICK_LOG",
    "SIMCTL_PICK_LOG_FORMAT",
    "SIMCTL_PICK_XCRUN",
    "SIMCTL_PICK_TIMEOUT_SECONDS",
];

/// Get a Command for the simctl-pick binary with a clean environment.
pub fn simctl_pick() -> Command {
    let mut cmd = Command::cargo_bin("simctl-pick").expect("simctl-pick binary should exist");
    for var in SCRUBBED_ENV {
        cmd.env_remove(var);
    }
    cmd
}

/// A temp directory containing a `simctl` shell script.
pub struct FakeSimctl {
    dir: TempDir,
}

impl FakeSimctl {
    /// Script body run by `sh`.
    pub fn script(body: &str) -> Self {
        let dir = TempDir::new().expect("create temp dir");
        fs::write(dir.path().join("simctl"), body).expect("write fake simctl");
        Self { dir }
    }

    /// Script that prints `json` and exits 0.
    pub fn listing(json: &str) -> Self {
        Self::script(&format!("cat <<'JSON'\n{}\nJSON\n", json))
    }

    /// simctl-pick wired to this fake.
    pub fn command(&self) -> Command {
        let mut cmd = simctl_pick();
        cmd.current_dir(self.dir.path()).args(["--xcrun", "sh"]);
        cmd
    }
}

/// Listing with one runtime bucket.
pub fn listing_for(runtime: &str, devices: &str) -> String {
    format!(r#"{{"devices": {{"{}": {}}}}}"#, runtime, devices)
}
