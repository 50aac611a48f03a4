//! Daemon loop: owns the configured counters and reacts to triggers.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use sonic_bst::{BstApi, HwUnit, SwitchEvent};
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::config::{BufmonConfig, CounterConfig, SystemConfig};
use crate::counter::Operation;
use crate::provider::BufmonProvider;
use crate::trigger::TriggerNotifier;

/// One collected counter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterReading {
    pub name: String,
    pub hw_unit: HwUnit,
    pub value: u64,
}

/// Configuration owner for one bufmon provider.
#[derive(Debug)]
pub struct BufmonDaemon {
    provider: BufmonProvider,
    system: SystemConfig,
    counters: Vec<CounterConfig>,
    triggered: Arc<Notify>,
}

impl BufmonDaemon {
    pub fn new(api: Arc<dyn BstApi>, config: &BufmonConfig) -> (Self, mpsc::Receiver<SwitchEvent>) {
        let triggered = Arc::new(Notify::new());
        let signal = triggered.clone();
        let notifier: Arc<dyn TriggerNotifier> = Arc::new(move || signal.notify_one());

        let (provider, rx) = BufmonProvider::new(api, config, notifier);
        let daemon = Self {
            provider,
            system: config.system.clone(),
            counters: config.counters.clone(),
            triggered,
        };
        (daemon, rx)
    }

    pub fn provider(&self) -> &BufmonProvider {
        &self.provider
    }

    /// Starts the task that drains the driver event channel.
    pub fn spawn_trigger_worker(&self, rx: mpsc::Receiver<SwitchEvent>) -> JoinHandle<()> {
        let triggers = self.provider.trigger_manager().clone();
        tokio::spawn(async move { triggers.run(rx).await })
    }

    /// Programs the threshold of every configured counter.
    pub fn push_thresholds(&self) {
        for counter in &self.counters {
            let mut info = counter.to_counter_info();
            self.provider
                .handle_counter_request(&mut info, Operation::SetCounterThreshold);
        }
    }

    /// Syncs hardware counters and reads every configured counter.
    pub fn poll_counters(&self) -> Vec<CounterReading> {
        self.provider.sync_all_realms();

        self.counters
            .iter()
            .map(|counter| {
                let mut info = counter.to_counter_info();
                self.provider
                    .handle_counter_request(&mut info, Operation::GetCounterValue);
                info!(counter = %counter.name, unit = counter.hw_unit, value = info.value, "bufmon counter");
                CounterReading {
                    name: counter.name.clone(),
                    hw_unit: info.hw_unit,
                    value: info.value,
                }
            })
            .collect()
    }

    /// Applies the configuration, then collects counters periodically and on
    /// every trigger until `shutdown` resolves.
    pub async fn run(&self, shutdown: impl Future<Output = ()>) {
        self.provider.apply_system_config(&self.system);
        self.push_thresholds();

        tokio::pin!(shutdown);

        let periodic = self.system.enabled && self.system.periodic_collection_enabled;
        let mut ticker =
            tokio::time::interval(self.system.collection_period().max(Duration::from_secs(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(periodic, counters = self.counters.len(), "bufmond running");

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick(), if periodic => {
                    debug!("periodic collection");
                    self.poll_counters();
                }
                _ = self.triggered.notified() => {
                    info!("buffer threshold trigger, collecting counters");
                    self.poll_counters();

                    tokio::select! {
                        _ = &mut shutdown => break,
                        _ = tokio::time::sleep(self.system.trigger_rate_limit()) => {}
                    }
                    if self.system.enabled {
                        self.provider.rearm_tracking();
                    }
                }
            }
        }

        info!("bufmond shutting down");
        self.provider.set_trigger_enabled(false);
    }
}
