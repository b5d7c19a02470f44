//! simctl-pick common types and errors.
//!
//! This crate provides the types shared by sp-core:
//! - Device records and the permissive simctl catalog decoder
//! - Selection requests (preferred names, substring fallback)
//! - The unified error type with categories and remediation hints

pub mod device;
pub mod error;

pub use device::{DeviceCatalog, DeviceRecord, SelectionRequest};
pub use error::{Error, ErrorCategory, Result, ToolStatus};
