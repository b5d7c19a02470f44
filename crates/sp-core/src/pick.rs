//! One pick, end to end: list, look up, select.

use sp_common::Error;
use tracing::{debug, info};

use crate::collect::{list_devices, ToolRunner};
use crate::config::PickConfig;
use crate::select::{select, Selection};

/// Run the listing tool once and select a device for `config`.
///
/// Nothing is written anywhere; the caller decides what to print.
pub fn run(runner: &ToolRunner, config: &PickConfig) -> Result<Selection, Error> {
    let catalog = list_devices(runner, &config.xcrun, config.timeout)?;

    let devices = catalog.devices(&config.runtime);
    debug!(
        runtime = %config.runtime,
        devices = devices.len(),
        known_runtimes = catalog.len(),
        "resolved runtime"
    );

    let selection = select(&devices, &config.request);
    info!(
        runtime = %config.runtime,
        udid = %selection.udid,
        rule = ?selection.rule,
        "selected device"
    );
    Ok(selection)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use sp_common::SelectionRequest;
    use std::time::Duration;

    #[test]
    fn test_run_with_missing_tool() {
        let config = PickConfig::new("rt").with_xcrun("sp-definitely-not-a-real-xcrun");
        let err = run(&ToolRunner::with_defaults(), &config).unwrap_err();
        assert!(matches!(err, Error::ToolNotFound { .. }));
    }

    // `echo` ignores the simctl arguments and prints them back, which is
    // not JSON.
    #[test]
    fn test_run_with_non_json_tool() {
        let config = PickConfig::new("rt")
            .with_xcrun("echo")
            .with_timeout(Duration::from_secs(5));
        let err = run(&ToolRunner::with_defaults(), &config).unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }

    // `true` prints nothing and exits 0; empty output is not JSON either.
    #[test]
    fn test_run_with_silent_tool() {
        let config = PickConfig::new("rt")
            .with_xcrun("true")
            .with_request(SelectionRequest::new().prefer("iPhone 15"));
        let err = run(&ToolRunner::with_defaults(), &config).unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }

    #[test]
    fn test_run_with_failing_tool() {
        let config = PickConfig::new("rt").with_xcrun("false");
        let err = run(&ToolRunner::with_defaults(), &config).unwrap_err();
        assert!(matches!(err, Error::ToolFailed { .. }));
    }
}
