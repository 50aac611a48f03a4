//! In-memory ASIC implementing [`BstApi`].
//!
//! `SimulatedAsic` stands in for the switch driver when no hardware is
//! attached: it keeps control registers, statistic values and threshold
//! profiles per unit, records every driver call in order, lets callers inject
//! failures per operation and unit, and delivers synthetic switch events to
//! the callbacks registered through [`BstApi::switch_event_register`].

use std::collections::HashMap;
use std::fmt;

use log::trace;
use parking_lot::Mutex;

use crate::api::bst::BstApi;
use crate::api::switch::{EventCookie, SwitchControl, SwitchEvent, SwitchEventCallback};
use crate::error::{BstError, BstResult, BstStatus};
use crate::types::{BstProfile, BstStatId, Gport, HwUnit};

/// Driver operation, used to select calls for failure injection and counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BstOp {
    ControlGet,
    ControlSet,
    GportGet,
    StatGet,
    ProfileSet,
    ProfileGet,
    StatClear,
    StatSync,
    EventRegister,
    EventUnregister,
}

/// One recorded driver call with its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BstCall {
    ControlGet {
        unit: HwUnit,
        control: SwitchControl,
    },
    ControlSet {
        unit: HwUnit,
        control: SwitchControl,
        value: i32,
    },
    GportGet {
        unit: HwUnit,
        port: i32,
    },
    StatGet {
        unit: HwUnit,
        gport: Gport,
        cosq: i32,
        stat: BstStatId,
    },
    ProfileSet {
        unit: HwUnit,
        gport: Gport,
        cosq: i32,
        stat: BstStatId,
        profile: BstProfile,
    },
    ProfileGet {
        unit: HwUnit,
        gport: Gport,
        cosq: i32,
        stat: BstStatId,
    },
    StatClear {
        unit: HwUnit,
        gport: Gport,
        cosq: i32,
        stat: BstStatId,
    },
    StatSync {
        unit: HwUnit,
        stat: BstStatId,
    },
    EventRegister {
        unit: HwUnit,
        cookie: EventCookie,
    },
    EventUnregister {
        unit: HwUnit,
        cookie: EventCookie,
    },
}

impl BstCall {
    /// Returns the operation this call performed.
    pub fn op(&self) -> BstOp {
        match self {
            BstCall::ControlGet { .. } => BstOp::ControlGet,
            BstCall::ControlSet { .. } => BstOp::ControlSet,
            BstCall::GportGet { .. } => BstOp::GportGet,
            BstCall::StatGet { .. } => BstOp::StatGet,
            BstCall::ProfileSet { .. } => BstOp::ProfileSet,
            BstCall::ProfileGet { .. } => BstOp::ProfileGet,
            BstCall::StatClear { .. } => BstOp::StatClear,
            BstCall::StatSync { .. } => BstOp::StatSync,
            BstCall::EventRegister { .. } => BstOp::EventRegister,
            BstCall::EventUnregister { .. } => BstOp::EventUnregister,
        }
    }

    /// Returns the unit the call addressed.
    pub fn unit(&self) -> HwUnit {
        match self {
            BstCall::ControlGet { unit, .. }
            | BstCall::ControlSet { unit, .. }
            | BstCall::GportGet { unit, .. }
            | BstCall::StatGet { unit, .. }
            | BstCall::ProfileSet { unit, .. }
            | BstCall::ProfileGet { unit, .. }
            | BstCall::StatClear { unit, .. }
            | BstCall::StatSync { unit, .. }
            | BstCall::EventRegister { unit, .. }
            | BstCall::EventUnregister { unit, .. } => *unit,
        }
    }
}

type StatKey = (HwUnit, Gport, i32, BstStatId);

#[derive(Default)]
struct SimState {
    controls: HashMap<(HwUnit, SwitchControl), i32>,
    stats: HashMap<StatKey, u64>,
    profiles: HashMap<StatKey, BstProfile>,
    handlers: HashMap<(HwUnit, EventCookie), SwitchEventCallback>,
    calls: Vec<BstCall>,
    failures: HashMap<(BstOp, HwUnit), BstStatus>,
}

/// Simulated switch ASIC.
pub struct SimulatedAsic {
    units: u32,
    ports_per_unit: i32,
    state: Mutex<SimState>,
}

impl fmt::Debug for SimulatedAsic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("SimulatedAsic")
            .field("units", &self.units)
            .field("ports_per_unit", &self.ports_per_unit)
            .field("registrations", &state.handlers.len())
            .field("calls", &state.calls.len())
            .finish()
    }
}

impl SimulatedAsic {
    /// Creates an ASIC with `units` hardware units and ports `0..=ports_per_unit`
    /// on each (port 0 is the CPU port).
    pub fn new(units: u32, ports_per_unit: i32) -> Self {
        Self {
            units,
            ports_per_unit,
            state: Mutex::new(SimState::default()),
        }
    }

    /// Makes every subsequent `op` on `unit` fail with `status`.
    pub fn fail_on(&self, op: BstOp, unit: HwUnit, status: BstStatus) {
        self.state.lock().failures.insert((op, unit), status);
    }

    /// Removes an injected failure.
    pub fn clear_failure(&self, op: BstOp, unit: HwUnit) {
        self.state.lock().failures.remove(&(op, unit));
    }

    /// Presets a control register without recording a call.
    pub fn set_control(&self, unit: HwUnit, control: SwitchControl, value: i32) {
        self.state.lock().controls.insert((unit, control), value);
    }

    /// Current value of a control register (unset registers read as 0).
    pub fn control(&self, unit: HwUnit, control: SwitchControl) -> i32 {
        self.state
            .lock()
            .controls
            .get(&(unit, control))
            .copied()
            .unwrap_or(0)
    }

    /// Presets the occupancy value of one statistic address.
    pub fn set_stat_value(&self, unit: HwUnit, gport: Gport, cosq: i32, stat: BstStatId, value: u64) {
        self.state
            .lock()
            .stats
            .insert((unit, gport, cosq, stat), value);
    }

    /// Threshold profile programmed at one statistic address, if any.
    pub fn profile(&self, unit: HwUnit, gport: Gport, cosq: i32, stat: BstStatId) -> Option<BstProfile> {
        self.state
            .lock()
            .profiles
            .get(&(unit, gport, cosq, stat))
            .copied()
    }

    /// All recorded driver calls, oldest first.
    pub fn calls(&self) -> Vec<BstCall> {
        self.state.lock().calls.clone()
    }

    /// Recorded calls of one operation, oldest first.
    pub fn calls_of(&self, op: BstOp) -> Vec<BstCall> {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|call| call.op() == op)
            .cloned()
            .collect()
    }

    /// Number of recorded calls of one operation.
    pub fn count_calls(&self, op: BstOp) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|call| call.op() == op)
            .count()
    }

    /// Forgets all recorded calls.
    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// Number of event callbacks currently registered on `unit`.
    pub fn registration_count(&self, unit: HwUnit) -> usize {
        self.state
            .lock()
            .handlers
            .keys()
            .filter(|(u, _)| *u == unit)
            .count()
    }

    /// Delivers an event to every callback registered on the event's unit,
    /// the way the driver thread would. Returns the number of callbacks run.
    pub fn raise_event(&self, event: &SwitchEvent) -> usize {
        let targets: Vec<(EventCookie, SwitchEventCallback)> = {
            let state = self.state.lock();
            state
                .handlers
                .iter()
                .filter(|((unit, _), _)| *unit == event.unit)
                .map(|((_, cookie), cb)| (*cookie, cb.clone()))
                .collect()
        };

        trace!("raising {:?} to {} callback(s)", event, targets.len());

        // Callbacks run without the state lock held.
        for (cookie, callback) in &targets {
            callback(event, *cookie);
        }
        targets.len()
    }

    fn begin(&self, call: BstCall) -> BstResult<parking_lot::MutexGuard<'_, SimState>> {
        let unit = call.unit();
        let op = call.op();
        let mut state = self.state.lock();
        state.calls.push(call);

        if unit.as_raw() >= self.units {
            return Err(BstError::InvalidUnit { unit });
        }
        if let Some(status) = state.failures.get(&(op, unit)) {
            return Err(BstError::from_status(*status));
        }
        Ok(state)
    }
}

fn check_cosq(cosq: i32) -> BstResult<()> {
    if cosq < 0 {
        return Err(BstError::invalid_parameter(format!("cosq {} out of range", cosq)));
    }
    Ok(())
}

impl BstApi for SimulatedAsic {
    fn switch_control_get(&self, unit: HwUnit, control: SwitchControl) -> BstResult<i32> {
        let state = self.begin(BstCall::ControlGet { unit, control })?;
        Ok(state.controls.get(&(unit, control)).copied().unwrap_or(0))
    }

    fn switch_control_set(
        &self,
        unit: HwUnit,
        control: SwitchControl,
        value: i32,
    ) -> BstResult<()> {
        let mut state = self.begin(BstCall::ControlSet {
            unit,
            control,
            value,
        })?;
        state.controls.insert((unit, control), value);
        Ok(())
    }

    fn port_gport_get(&self, unit: HwUnit, port: i32) -> BstResult<Gport> {
        let _state = self.begin(BstCall::GportGet { unit, port })?;
        if !(0..=self.ports_per_unit).contains(&port) {
            return Err(BstError::InvalidPort { unit, port });
        }
        Ok(Gport::local(port as u32))
    }

    fn bst_stat_get(
        &self,
        unit: HwUnit,
        gport: Gport,
        cosq: i32,
        stat: BstStatId,
    ) -> BstResult<u64> {
        let state = self.begin(BstCall::StatGet {
            unit,
            gport,
            cosq,
            stat,
        })?;
        check_cosq(cosq)?;
        Ok(state
            .stats
            .get(&(unit, gport, cosq, stat))
            .copied()
            .unwrap_or(0))
    }

    fn bst_profile_set(
        &self,
        unit: HwUnit,
        gport: Gport,
        cosq: i32,
        stat: BstStatId,
        profile: &BstProfile,
    ) -> BstResult<()> {
        let mut state = self.begin(BstCall::ProfileSet {
            unit,
            gport,
            cosq,
            stat,
            profile: *profile,
        })?;
        check_cosq(cosq)?;
        state.profiles.insert((unit, gport, cosq, stat), *profile);
        Ok(())
    }

    fn bst_profile_get(
        &self,
        unit: HwUnit,
        gport: Gport,
        cosq: i32,
        stat: BstStatId,
    ) -> BstResult<BstProfile> {
        let state = self.begin(BstCall::ProfileGet {
            unit,
            gport,
            cosq,
            stat,
        })?;
        check_cosq(cosq)?;
        Ok(state
            .profiles
            .get(&(unit, gport, cosq, stat))
            .copied()
            .unwrap_or_default())
    }

    fn bst_stat_clear(
        &self,
        unit: HwUnit,
        gport: Gport,
        cosq: i32,
        stat: BstStatId,
    ) -> BstResult<()> {
        let mut state = self.begin(BstCall::StatClear {
            unit,
            gport,
            cosq,
            stat,
        })?;
        check_cosq(cosq)?;
        state.stats.remove(&(unit, gport, cosq, stat));
        Ok(())
    }

    fn bst_stat_sync(&self, unit: HwUnit, stat: BstStatId) -> BstResult<()> {
        let _state = self.begin(BstCall::StatSync { unit, stat })?;
        Ok(())
    }

    fn switch_event_register(
        &self,
        unit: HwUnit,
        callback: SwitchEventCallback,
        cookie: EventCookie,
    ) -> BstResult<()> {
        let mut state = self.begin(BstCall::EventRegister { unit, cookie })?;
        if state.handlers.contains_key(&(unit, cookie)) {
            return Err(BstError::from_status(BstStatus::Exists));
        }
        state.handlers.insert((unit, cookie), callback);
        Ok(())
    }

    fn switch_event_unregister(&self, unit: HwUnit, cookie: EventCookie) -> BstResult<()> {
        let mut state = self.begin(BstCall::EventUnregister { unit, cookie })?;
        match state.handlers.remove(&(unit, cookie)) {
            Some(_) => Ok(()),
            None => Err(BstError::from_status(BstStatus::NotFound)),
        }
    }
}
