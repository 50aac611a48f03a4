//! Bufmon provider: the operations exposed to the configuration owner.

use std::sync::Arc;

use sonic_bst::{BstApi, HwUnit, SwitchControl, SwitchEvent};
use tokio::sync::mpsc;
use tracing::info;

use crate::config::{BufmonConfig, SystemConfig};
use crate::control::SwitchControlHelper;
use crate::counter::{CounterInfo, Operation};
use crate::dispatcher::BufmonDispatcher;
use crate::trigger::{TriggerManager, TriggerNotifier};

/// Counter access, device configuration and trigger control for one set of
/// hardware units.
#[derive(Debug, Clone)]
pub struct BufmonProvider {
    dispatcher: BufmonDispatcher,
    control: SwitchControlHelper,
    triggers: Arc<TriggerManager>,
}

impl BufmonProvider {
    /// Creates a provider for the units of `config`.
    ///
    /// The returned receiver must be drained by [`TriggerManager::run`].
    pub fn new(
        api: Arc<dyn BstApi>,
        config: &BufmonConfig,
        notifier: Arc<dyn TriggerNotifier>,
    ) -> (Self, mpsc::Receiver<SwitchEvent>) {
        let units: Arc<[HwUnit]> = config.units().into();
        let (triggers, rx) = TriggerManager::new(
            api.clone(),
            units.clone(),
            notifier,
            config.trigger_channel_capacity,
        );
        let provider = Self {
            dispatcher: BufmonDispatcher::new(api.clone(), units.clone()),
            control: SwitchControlHelper::new(api, units),
            triggers: Arc::new(triggers),
        };
        (provider, rx)
    }

    pub fn handle_counter_request(&self, counter: &mut CounterInfo, op: Operation) {
        self.dispatcher.handle_counter_request(counter, op);
    }

    pub fn sync_all_realms(&self) {
        self.dispatcher.sync_all_realms();
    }

    pub fn set_trigger_enabled(&self, enabled: bool) {
        self.triggers.set_trigger_enabled(enabled);
    }

    /// Programs tracking mode and tracking enable on every unit, then arms or
    /// disarms the trigger path to match.
    pub fn apply_system_config(&self, system: &SystemConfig) {
        self.control.write_control_flag_all_units(
            SwitchControl::BstTrackingMode,
            system.counters_mode.as_control_value(),
        );
        self.control
            .write_control_flag_all_units(SwitchControl::BstEnable, i32::from(system.enabled));
        self.set_trigger_enabled(system.triggers_wanted());

        info!(
            enabled = system.enabled,
            mode = ?system.counters_mode,
            triggers = system.triggers_wanted(),
            "bufmon system config applied"
        );
    }

    /// Turns tracking back on after a trigger disarmed it.
    pub fn rearm_tracking(&self) {
        self.control
            .write_control_flag_all_units(SwitchControl::BstEnable, 1);
    }

    pub fn trigger_manager(&self) -> &Arc<TriggerManager> {
        &self.triggers
    }
}
