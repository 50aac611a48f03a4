//! Switch-level control registers and events.

use std::fmt;
use std::sync::Arc;

use crate::types::HwUnit;

/// Device-wide control registers used by buffer statistics tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SwitchControl {
    /// Enables buffer statistics tracking; while set, threshold crossings
    /// raise [`SwitchEventKind::MmuBstTrigger`] events.
    BstEnable,
    /// Tracking mode: 0 reports current occupancy, 1 reports peak occupancy.
    BstTrackingMode,
}

impl fmt::Display for SwitchControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwitchControl::BstEnable => write!(f, "BstEnable"),
            SwitchControl::BstTrackingMode => write!(f, "BstTrackingMode"),
        }
    }
}

/// Kind of a switch event delivered by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SwitchEventKind {
    ParityError,
    StableFull,
    StableError,
    UncontrolledShutdown,
    Warmboot,
    /// A buffer statistic crossed its configured threshold.
    MmuBstTrigger,
    /// Any event kind bufmon does not know about.
    Other(i32),
}

/// One switch event as delivered on the driver thread.
///
/// For [`SwitchEventKind::MmuBstTrigger`] the `resource_id` carries the raw
/// statistic id that crossed its threshold, and `port`/`cosq` identify where.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchEvent {
    pub unit: HwUnit,
    pub kind: SwitchEventKind,
    pub resource_id: i32,
    pub port: i32,
    pub cosq: i32,
}

impl SwitchEvent {
    /// Creates a threshold trigger event for a raw statistic id.
    pub fn bst_trigger(unit: HwUnit, resource_id: i32) -> Self {
        Self {
            unit,
            kind: SwitchEventKind::MmuBstTrigger,
            resource_id,
            port: 0,
            cosq: 0,
        }
    }
}

/// Opaque value handed to the driver at registration and passed back with
/// every event delivered through that registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventCookie(u64);

impl EventCookie {
    /// Cookie identifying the registration made for `unit`.
    pub const fn for_unit(unit: HwUnit) -> Self {
        EventCookie(unit.as_raw() as u64)
    }

    pub const fn as_raw(&self) -> u64 {
        self.0
    }
}

/// Callback invoked on the driver thread for each switch event.
///
/// Implementations must not block.
pub type SwitchEventCallback = Arc<dyn Fn(&SwitchEvent, EventCookie) + Send + Sync>;
