//! External tool invocation.
//!
//! - `tool_runner`: bounded execution of one external command
//! - `simctl`: the simulator device listing built on top of it

pub mod simctl;
pub mod tool_runner;

pub use simctl::{display_command, list_devices, SIMCTL_LIST_ARGS};
pub use tool_runner::{ToolConfig, ToolError, ToolOutput, ToolRunner};
