//! Device selection.
//!
//! Rules, first match wins:
//!
//! 1. Preferred names in caller order, each matched exactly against the
//!    devices in listing order. A matched device with no udid yields the
//!    empty string; the search stops there.
//! 2. The substring filter, if supplied, against device names in listing
//!    order. An absent name reads as empty, and an empty filter matches
//!    every device.
//! 3. The first device, or the empty string if there are none.
//!
//! Selection is pure: no I/O, no state.

use serde::Serialize;
use sp_common::{DeviceRecord, SelectionRequest};

/// Which rule produced a selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum MatchRule {
    /// Exact match on `request.preferred_names[priority]`.
    Preferred { priority: usize, position: usize },
    /// Substring match at `position` in the device list.
    Contains { position: usize },
    /// Nothing matched; the first listed device was taken.
    FirstDevice,
    /// The runtime has no devices.
    NoDevices,
}

/// Outcome of a selection: the identifier and the rule that chose it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    /// Selected udid; empty when the chosen device has none or nothing
    /// was available.
    pub udid: String,
    #[serde(flatten)]
    pub rule: MatchRule,
}

impl Selection {
    fn of(device: &DeviceRecord, rule: MatchRule) -> Self {
        Self {
            udid: device.udid_or_empty().to_string(),
            rule,
        }
    }
}

/// Select a device for `request` from `devices`.
pub fn select(devices: &[DeviceRecord], request: &SelectionRequest) -> Selection {
    for (priority, wanted) in request.preferred_names.iter().enumerate() {
        if let Some(position) = devices
            .iter()
            .position(|d| d.name.as_deref() == Some(wanted.as_str()))
        {
            // Terminal even when the udid is missing.
            return Selection::of(&devices[position], MatchRule::Preferred { priority, position });
        }
    }

    if let Some(needle) = request.contains.as_deref() {
        if let Some(position) = devices
            .iter()
            .position(|d| d.name_or_empty().contains(needle))
        {
            return Selection::of(&devices[position], MatchRule::Contains { position });
        }
    }

    match devices.first() {
        Some(first) => Selection::of(first, MatchRule::FirstDevice),
        None => Selection {
            udid: String::new(),
            rule: MatchRule::NoDevices,
        },
    }
}

/// Convenience wrapper returning only the identifier.
pub fn pick_udid<S: AsRef<str>>(
    devices: &[DeviceRecord],
    preferred_names: &[S],
    contains: Option<&str>,
) -> String {
    let request = SelectionRequest::new()
        .with_preferred(preferred_names.iter().map(|s| s.as_ref().to_string()))
        .with_contains(contains.map(str::to_string));
    select(devices, &request).udid
}
