//! Device-wide control register helpers.
//!
//! Writes go to every managed unit and are best-effort: one unit failing
//! does not stop the others.

use std::sync::Arc;

use sonic_bst::{BstApi, HwUnit, SwitchControl};
use tracing::{debug, warn};

/// Reads and writes switch control registers across the managed units.
#[derive(Clone)]
pub struct SwitchControlHelper {
    api: Arc<dyn BstApi>,
    units: Arc<[HwUnit]>,
}

impl std::fmt::Debug for SwitchControlHelper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SwitchControlHelper")
            .field("units", &self.units)
            .finish()
    }
}

impl SwitchControlHelper {
    pub fn new(api: Arc<dyn BstApi>, units: impl Into<Arc<[HwUnit]>>) -> Self {
        Self {
            api,
            units: units.into(),
        }
    }

    /// The managed unit set.
    pub fn units(&self) -> &[HwUnit] {
        &self.units
    }

    /// Reads one control register; a failed read yields 0.
    pub fn read_control_flag(&self, unit: HwUnit, control: SwitchControl) -> i32 {
        match self.api.switch_control_get(unit, control) {
            Ok(value) => value,
            Err(e) => {
                warn!(%unit, %control, error = %e, "switch control read failed");
                0
            }
        }
    }

    /// Writes `value` to `control` on every managed unit whose current value
    /// differs.
    pub fn write_control_flag_all_units(&self, control: SwitchControl, value: i32) {
        for &unit in self.units.iter() {
            let current = self.read_control_flag(unit, control);
            if current == value {
                debug!(%unit, %control, value, "switch control already set");
                continue;
            }

            if let Err(e) = self.api.switch_control_set(unit, control, value) {
                warn!(%unit, %control, value, error = %e, "switch control write failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sonic_bst::{BstCall, BstOp, BstStatus, SimulatedAsic};

    fn units(n: u32) -> Vec<HwUnit> {
        (0..n).map(HwUnit::new).collect()
    }

    #[test]
    fn test_read_defaults_to_zero_on_failure() {
        let asic = Arc::new(SimulatedAsic::new(1, 4));
        let unit = HwUnit::new(0);
        asic.set_control(unit, SwitchControl::BstEnable, 1);
        let helper = SwitchControlHelper::new(asic.clone(), units(1));

        assert_eq!(helper.read_control_flag(unit, SwitchControl::BstEnable), 1);

        asic.fail_on(BstOp::ControlGet, unit, BstStatus::Internal);
        assert_eq!(helper.read_control_flag(unit, SwitchControl::BstEnable), 0);
    }

    #[test]
    fn test_write_skips_units_already_at_value() {
        let asic = Arc::new(SimulatedAsic::new(3, 4));
        asic.set_control(HwUnit::new(1), SwitchControl::BstEnable, 1);
        let helper = SwitchControlHelper::new(asic.clone(), units(3));

        helper.write_control_flag_all_units(SwitchControl::BstEnable, 1);

        let writes: Vec<HwUnit> = asic
            .calls_of(BstOp::ControlSet)
            .iter()
            .map(BstCall::unit)
            .collect();
        assert_eq!(writes, vec![HwUnit::new(0), HwUnit::new(2)]);
        for unit in units(3) {
            assert_eq!(asic.control(unit, SwitchControl::BstEnable), 1);
        }
    }

    #[test]
    fn test_write_continues_after_unit_failure() {
        let asic = Arc::new(SimulatedAsic::new(2, 4));
        asic.set_control(HwUnit::new(0), SwitchControl::BstEnable, 1);
        asic.set_control(HwUnit::new(1), SwitchControl::BstEnable, 1);
        asic.fail_on(BstOp::ControlSet, HwUnit::new(0), BstStatus::Busy);
        let helper = SwitchControlHelper::new(asic.clone(), units(2));

        helper.write_control_flag_all_units(SwitchControl::BstEnable, 0);

        assert_eq!(asic.count_calls(BstOp::ControlSet), 2);
        assert_eq!(asic.control(HwUnit::new(0), SwitchControl::BstEnable), 1);
        assert_eq!(asic.control(HwUnit::new(1), SwitchControl::BstEnable), 0);
    }

    #[test]
    fn test_failed_read_still_writes_nonzero() {
        let asic = Arc::new(SimulatedAsic::new(1, 4));
        let unit = HwUnit::new(0);
        asic.set_control(unit, SwitchControl::BstTrackingMode, 1);
        asic.fail_on(BstOp::ControlGet, unit, BstStatus::Internal);
        let helper = SwitchControlHelper::new(asic.clone(), units(1));

        // the failed read reports 0, so a request for 1 is written
        helper.write_control_flag_all_units(SwitchControl::BstTrackingMode, 1);
        assert_eq!(asic.count_calls(BstOp::ControlSet), 1);

        // and a request for 0 is skipped
        helper.write_control_flag_all_units(SwitchControl::BstTrackingMode, 0);
        assert_eq!(asic.count_calls(BstOp::ControlSet), 1);
    }
}
