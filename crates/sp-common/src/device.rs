//! Simulator device records and the simctl device catalog.
//!
//! `xcrun simctl list devices available -j` prints an object of the form
//!
//! ```json
//! {
//!   "devices": {
//!     "com.apple.CoreSimulator.SimRuntime.iOS-17-2": [
//!       { "name": "iPhone 15", "udid": "6C1B...", "state": "Shutdown" }
//!     ]
//!   }
//! }
//! ```
//!
//! Decoding is permissive. Missing keys, nulls, non-object entries and
//! non-string fields all become empty defaults at the point of lookup; only
//! bytes that are not JSON at all are rejected.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single simulator as listed by simctl.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    /// Display name, e.g. "iPhone 15 Pro".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Device identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub udid: Option<String>,
}

impl DeviceRecord {
    pub fn new(name: impl Into<String>, udid: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            udid: Some(udid.into()),
        }
    }

    /// A named device whose identifier is missing from the listing.
    pub fn without_udid(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            udid: None,
        }
    }

    /// Build a record from one entry of a runtime's device array.
    ///
    /// Anything that is not an object yields a record with neither field.
    pub fn from_json(value: &Value) -> Self {
        Self {
            name: string_field(value, "name"),
            udid: string_field(value, "udid"),
        }
    }

    /// Name, with an absent name read as empty.
    pub fn name_or_empty(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    /// Identifier, with an absent identifier read as empty.
    pub fn udid_or_empty(&self) -> &str {
        self.udid.as_deref().unwrap_or("")
    }
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_owned)
}

/// Runtime identifier -> devices, as decoded from simctl output.
///
/// Entries are kept undecoded until a runtime is looked up, so malformed
/// buckets for other runtimes never matter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceCatalog {
    runtimes: Map<String, Value>,
}

impl DeviceCatalog {
    /// Decode raw tool output.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_slice(bytes)?;
        Ok(Self::from_value(value))
    }

    /// Build a catalog from an already-parsed document.
    ///
    /// A document without an object-valued `devices` key is an empty catalog.
    pub fn from_value(value: Value) -> Self {
        let runtimes = match value {
            Value::Object(mut top) => match top.remove("devices") {
                Some(Value::Object(runtimes)) => runtimes,
                _ => Map::new(),
            },
            _ => Map::new(),
        };
        Self { runtimes }
    }

    /// Devices for one runtime, in listing order.
    ///
    /// A missing runtime, a null bucket, or a bucket that is not an array
    /// all read as no devices.
    pub fn devices(&self, runtime: &str) -> Vec<DeviceRecord> {
        self.runtimes
            .get(runtime)
            .and_then(Value::as_array)
            .map(|entries| entries.iter().map(DeviceRecord::from_json).collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.runtimes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runtimes.is_empty()
    }
}

/// Ordered name preferences plus an optional substring fallback.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionRequest {
    /// Exact names, highest priority first.
    #[serde(default)]
    pub preferred_names: Vec<String>,

    /// Substring fallback. `Some("")` is a supplied filter that matches
    /// every device.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contains: Option<String>,
}

impl SelectionRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one preferred name at the lowest priority.
    pub fn prefer(mut self, name: impl Into<String>) -> Self {
        self.preferred_names.push(name.into());
        self
    }

    pub fn with_preferred<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.preferred_names.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_contains(mut self, contains: Option<String>) -> Self {
        self.contains = contains;
        self
    }
}
