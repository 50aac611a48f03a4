//! Counter request types passed into the dispatcher.

use std::collections::HashMap;
use std::fmt;

use sonic_bst::HwUnit;

/// Operation requested on a counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Read the current occupancy into [`CounterInfo::value`].
    GetCounterValue,
    /// Program [`CounterInfo::trigger_threshold`] into hardware.
    SetCounterThreshold,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::GetCounterValue => write!(f, "get"),
            Operation::SetCounterThreshold => write!(f, "set-threshold"),
        }
    }
}

/// Vendor-specific key/value parameters of a counter (`port`, `queue`,
/// `priority-group`, `service-pool`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VendorParams(HashMap<String, String>);

impl VendorParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a parameter.
    pub fn insert(&mut self, key: impl Into<String>, value: impl ToString) {
        self.0.insert(key.into(), value.to_string());
    }

    /// Raw string value of a parameter.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Integer value of a parameter; `None` when absent or not an integer.
    pub fn get_int(&self, key: &str) -> Option<i32> {
        self.get(key)?.trim().parse().ok()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: ToString> FromIterator<(K, V)> for VendorParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = VendorParams::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

/// One counter request.
///
/// Built by the configuration owner, passed by `&mut` into the dispatcher,
/// which fills in `value` on a successful read. Nothing retains it past
/// the call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterInfo {
    /// Hardware unit the counter lives on.
    pub hw_unit: HwUnit,
    /// Counter name, e.g. `egress-uc-queue/uc-buffer-count`.
    pub name: Option<String>,
    /// Addressing parameters.
    pub params: VendorParams,
    /// Current occupancy, written by a successful read.
    pub value: u64,
    /// Trigger threshold in bytes; 0 means unset.
    pub trigger_threshold: u64,
}

impl CounterInfo {
    pub fn new(hw_unit: HwUnit, name: impl Into<String>) -> Self {
        Self {
            hw_unit,
            name: Some(name.into()),
            params: VendorParams::new(),
            value: 0,
            trigger_threshold: 0,
        }
    }

    /// A request with no counter name.
    pub fn unnamed(hw_unit: HwUnit) -> Self {
        Self {
            hw_unit,
            name: None,
            params: VendorParams::new(),
            value: 0,
            trigger_threshold: 0,
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(key, value);
        self
    }

    pub fn with_threshold(mut self, threshold: u64) -> Self {
        self.trigger_threshold = threshold;
        self
    }

    /// Name for log messages.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<unnamed>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_int() {
        let params: VendorParams = [("port", "3"), ("queue", " 13 "), ("pool", "x")]
            .into_iter()
            .collect();
        assert_eq!(params.get_int("port"), Some(3));
        assert_eq!(params.get_int("queue"), Some(13));
        assert_eq!(params.get_int("pool"), None);
        assert_eq!(params.get_int("missing"), None);
    }

    #[test]
    fn test_counter_builder() {
        let counter = CounterInfo::new(HwUnit::new(0), "device/data")
            .with_param("port", 1)
            .with_threshold(4096);
        assert_eq!(counter.params.get("port"), Some("1"));
        assert_eq!(counter.trigger_threshold, 4096);
        assert_eq!(counter.value, 0);
        assert_eq!(counter.display_name(), "device/data");
        assert_eq!(CounterInfo::unnamed(HwUnit::new(0)).display_name(), "<unnamed>");
    }
}
