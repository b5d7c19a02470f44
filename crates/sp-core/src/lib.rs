//! simctl-pick core library
//!
//! Picks a simulator UDID for build and test automation:
//! - Exit codes for the CLI
//! - Logging setup
//! - Configuration defaults and validation
//! - Bounded execution of `xcrun simctl list devices available -j`
//! - The device selection rules
//!
//! The binary entry point is in `main.rs`.

pub mod collect;
pub mod config;
pub mod exit_codes;
pub mod logging;
pub mod pick;
pub mod select;

pub use select::{pick_udid, select, MatchRule, Selection};
