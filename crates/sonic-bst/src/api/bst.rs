//! The BST driver API.
//!
//! Every call addresses one hardware unit and returns a [`BstResult`]; a
//! failure on one unit says nothing about the others.

use crate::api::switch::{EventCookie, SwitchControl, SwitchEventCallback};
use crate::error::BstResult;
use crate::types::{BstProfile, BstStatId, Gport, HwUnit};

/// Buffer statistics tracking operations provided by the switch driver.
///
/// `cosq` is the sub-resource index within the port or device: a queue,
/// service pool or priority group, depending on the statistic.
pub trait BstApi: Send + Sync {
    /// Reads a device-wide control register.
    fn switch_control_get(&self, unit: HwUnit, control: SwitchControl) -> BstResult<i32>;

    /// Writes a device-wide control register.
    fn switch_control_set(&self, unit: HwUnit, control: SwitchControl, value: i32)
        -> BstResult<()>;

    /// Resolves a numeric port to its logical port handle.
    fn port_gport_get(&self, unit: HwUnit, port: i32) -> BstResult<Gport>;

    /// Reads the current value of one statistic.
    fn bst_stat_get(&self, unit: HwUnit, gport: Gport, cosq: i32, stat: BstStatId)
        -> BstResult<u64>;

    /// Programs the threshold profile of one statistic.
    fn bst_profile_set(
        &self,
        unit: HwUnit,
        gport: Gport,
        cosq: i32,
        stat: BstStatId,
        profile: &BstProfile,
    ) -> BstResult<()>;

    /// Reads back the threshold profile of one statistic.
    fn bst_profile_get(
        &self,
        unit: HwUnit,
        gport: Gport,
        cosq: i32,
        stat: BstStatId,
    ) -> BstResult<BstProfile>;

    /// Clears one statistic.
    fn bst_stat_clear(&self, unit: HwUnit, gport: Gport, cosq: i32, stat: BstStatId)
        -> BstResult<()>;

    /// Flushes cached hardware counters of one statistic id into readable state.
    fn bst_stat_sync(&self, unit: HwUnit, stat: BstStatId) -> BstResult<()>;

    /// Registers a switch event callback on one unit.
    fn switch_event_register(
        &self,
        unit: HwUnit,
        callback: SwitchEventCallback,
        cookie: EventCookie,
    ) -> BstResult<()>;

    /// Removes the registration made with `cookie` on one unit.
    fn switch_event_unregister(&self, unit: HwUnit, cookie: EventCookie) -> BstResult<()>;
}
