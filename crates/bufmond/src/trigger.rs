//! Trigger manager: arms and disarms the hardware threshold interrupt path.
//!
//! The driver delivers events on its own thread. The registered callback
//! only forwards the event into a bounded channel; the worker task draining
//! that channel disarms tracking, validates the event and signals the
//! notifier.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use sonic_bst::{
    BstApi, EventCookie, HwUnit, SwitchControl, SwitchEvent, SwitchEventCallback, SwitchEventKind,
};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, warn};

use crate::control::SwitchControlHelper;
use crate::error::{BufmonError, BufmonResult};
use crate::realm;

/// Receiver of "a buffer threshold fired, re-read counters" signals.
pub trait TriggerNotifier: Send + Sync {
    fn notify(&self);
}

impl<F> TriggerNotifier for F
where
    F: Fn() + Send + Sync,
{
    fn notify(&self) {
        self()
    }
}

/// Counters for the interrupt path.
#[derive(Debug, Default)]
pub struct TriggerStats {
    events_received: AtomicU64,
    events_dropped: AtomicU64,
    events_ignored: AtomicU64,
    notifications: AtomicU64,
}

impl TriggerStats {
    fn record_received(&self) {
        self.events_received.fetch_add(1, Ordering::Relaxed);
    }

    fn record_dropped(&self) {
        self.events_dropped.fetch_add(1, Ordering::Relaxed);
    }

    fn record_ignored(&self) {
        self.events_ignored.fetch_add(1, Ordering::Relaxed);
    }

    fn record_notification(&self) {
        self.notifications.fetch_add(1, Ordering::Relaxed);
    }

    /// Events delivered by the driver.
    pub fn events_received(&self) -> u64 {
        self.events_received.load(Ordering::Relaxed)
    }

    /// Events lost because the channel was full or the worker was gone.
    pub fn events_dropped(&self) -> u64 {
        self.events_dropped.load(Ordering::Relaxed)
    }

    /// Events of another kind or with an unknown resource id.
    pub fn events_ignored(&self) -> u64 {
        self.events_ignored.load(Ordering::Relaxed)
    }

    /// Notifier invocations.
    pub fn notifications(&self) -> u64 {
        self.notifications.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Default)]
struct TriggerState {
    armed: bool,
    registrations: Vec<(HwUnit, EventCookie)>,
}

/// Owns the DISARMED/ARMED state of the interrupt path.
///
/// While armed, exactly one callback is registered on every managed unit.
/// Transitions are serialized by one mutex; the driver callback never takes
/// it.
pub struct TriggerManager {
    api: Arc<dyn BstApi>,
    control: SwitchControlHelper,
    notifier: Arc<dyn TriggerNotifier>,
    tx: mpsc::Sender<SwitchEvent>,
    state: Mutex<TriggerState>,
    stats: Arc<TriggerStats>,
}

impl std::fmt::Debug for TriggerManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TriggerManager")
            .field("units", &self.control.units())
            .field("state", &*self.state.lock())
            .field("stats", &self.stats)
            .finish()
    }
}

impl TriggerManager {
    /// Creates a disarmed manager and the receiving end of its event channel.
    pub fn new(
        api: Arc<dyn BstApi>,
        units: impl Into<Arc<[HwUnit]>>,
        notifier: Arc<dyn TriggerNotifier>,
        capacity: usize,
    ) -> (Self, mpsc::Receiver<SwitchEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let control = SwitchControlHelper::new(api.clone(), units);
        let manager = Self {
            api,
            control,
            notifier,
            tx,
            state: Mutex::new(TriggerState::default()),
            stats: Arc::new(TriggerStats::default()),
        };
        (manager, rx)
    }

    pub fn stats(&self) -> &TriggerStats {
        &self.stats
    }

    pub fn is_armed(&self) -> bool {
        self.state.lock().armed
    }

    /// Arms or disarms the interrupt path; failures are logged.
    pub fn set_trigger_enabled(&self, enabled: bool) {
        if enabled {
            if let Err(e) = self.enable() {
                warn!("failed to arm threshold triggers: {}", e);
            }
        } else {
            self.disable();
        }
    }

    /// Registers the event callback on every unit.
    ///
    /// A no-op when already armed. If any registration fails, those made so
    /// far are removed again and the manager stays disarmed.
    pub fn enable(&self) -> BufmonResult<()> {
        let mut state = self.state.lock();
        if state.armed {
            debug!("threshold triggers already armed");
            return Ok(());
        }

        let mut registered = Vec::with_capacity(self.control.units().len());
        for &unit in self.control.units() {
            let cookie = EventCookie::for_unit(unit);
            if let Err(e) = self
                .api
                .switch_event_register(unit, self.event_callback(), cookie)
            {
                self.unregister_all(registered);
                return Err(BufmonError::hardware(
                    "switch_event_register",
                    unit.to_string(),
                    e,
                ));
            }
            registered.push((unit, cookie));
        }

        state.registrations = registered;
        state.armed = true;
        info!(units = state.registrations.len(), "threshold triggers armed");
        Ok(())
    }

    /// Unregisters the event callback from every unit. A no-op when disarmed.
    pub fn disable(&self) {
        let mut state = self.state.lock();
        if !state.armed {
            return;
        }

        let registrations = std::mem::take(&mut state.registrations);
        self.unregister_all(registrations);
        state.armed = false;
        info!("threshold triggers disarmed");
    }

    fn unregister_all(&self, registrations: Vec<(HwUnit, EventCookie)>) {
        for (unit, cookie) in registrations.into_iter().rev() {
            if let Err(e) = self.api.switch_event_unregister(unit, cookie) {
                warn!(%unit, cookie = cookie.as_raw(), error = %e, "switch event unregister failed");
            }
        }
    }

    fn event_callback(&self) -> SwitchEventCallback {
        let tx = self.tx.clone();
        let stats = self.stats.clone();
        Arc::new(move |event: &SwitchEvent, _cookie: EventCookie| {
            stats.record_received();
            match tx.try_send(*event) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    stats.record_dropped();
                    warn!(unit = %event.unit, resource = event.resource_id, "trigger channel full, event dropped");
                }
                Err(TrySendError::Closed(_)) => {
                    stats.record_dropped();
                    debug!(unit = %event.unit, "trigger worker stopped, event dropped");
                }
            }
        })
    }

    /// Processes one driver event.
    ///
    /// Tracking is disarmed on every unit first, whatever the event. Only a
    /// threshold event whose resource id belongs to a realm signals the
    /// notifier, exactly once. Re-arming is left to the owner of the
    /// configuration path.
    pub fn handle_event(&self, event: &SwitchEvent) {
        self.control
            .write_control_flag_all_units(SwitchControl::BstEnable, 0);

        if event.kind != SwitchEventKind::MmuBstTrigger {
            self.stats.record_ignored();
            debug!(unit = %event.unit, kind = ?event.kind, "ignoring switch event");
            return;
        }

        let Some(stat) = realm::tracked_stat_id(event.resource_id) else {
            self.stats.record_ignored();
            debug!(unit = %event.unit, resource = event.resource_id, "trigger for unknown resource");
            return;
        };

        debug!(
            unit = %event.unit,
            %stat,
            port = event.port,
            cosq = event.cosq,
            "buffer threshold trigger"
        );
        self.stats.record_notification();
        self.notifier.notify();
    }

    /// Worker loop.
    ///
    /// The manager keeps a sender for its whole lifetime, so the loop only
    /// ends when its task is aborted.
    pub async fn run(&self, mut rx: mpsc::Receiver<SwitchEvent>) {
        while let Some(event) = rx.recv().await {
            self.handle_event(&event);
        }
    }
}
