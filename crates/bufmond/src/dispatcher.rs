//! Realm dispatcher: entry point for counter reads and threshold writes.

use std::sync::Arc;

use sonic_bst::{BstApi, HwUnit};
use tracing::{debug, warn};

use crate::address::{self, Outcome};
use crate::counter::{CounterInfo, Operation};
use crate::error::{BufmonError, BufmonResult};
use crate::realm::{self, REALM_TABLE};

/// Routes counter requests to the addressing handler of their realm.
///
/// Failures never reach the caller: malformed requests are logged at debug,
/// hardware failures at warn, and the counter is left as it was.
#[derive(Clone)]
pub struct BufmonDispatcher {
    api: Arc<dyn BstApi>,
    units: Arc<[HwUnit]>,
}

impl std::fmt::Debug for BufmonDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufmonDispatcher")
            .field("units", &self.units)
            .finish()
    }
}

impl BufmonDispatcher {
    pub fn new(api: Arc<dyn BstApi>, units: impl Into<Arc<[HwUnit]>>) -> Self {
        Self {
            api,
            units: units.into(),
        }
    }

    /// Reads the value of, or programs the threshold of, one counter.
    pub fn handle_counter_request(&self, counter: &mut CounterInfo, op: Operation) {
        if counter.name.is_none() {
            return;
        }

        if let Err(e) = self.try_handle(counter, op) {
            if e.is_malformed_input() {
                debug!(counter = counter.display_name(), %op, "request ignored: {}", e);
            } else {
                warn!(counter = counter.display_name(), %op, "request failed: {}", e);
            }
        }
    }

    fn try_handle(&self, counter: &mut CounterInfo, op: Operation) -> BufmonResult<()> {
        let name = counter.display_name();
        let realm = realm::resolve(name).ok_or_else(|| BufmonError::UnknownRealm(name.to_string()))?;

        match address::handle(self.api.as_ref(), realm, op, counter)? {
            Outcome::Read(value) => debug!(
                counter = counter.display_name(),
                unit = %counter.hw_unit,
                value,
                "counter read"
            ),
            Outcome::Programmed(threshold) => debug!(
                counter = counter.display_name(),
                unit = %counter.hw_unit,
                threshold,
                "threshold submitted"
            ),
            Outcome::Skipped => {}
        }
        Ok(())
    }

    /// Flushes cached hardware counters of every realm on every unit.
    ///
    /// Statistic ids shared by several realms are synced once per realm.
    pub fn sync_all_realms(&self) {
        for &unit in self.units.iter() {
            for realm in &REALM_TABLE {
                if let Err(e) = self.api.bst_stat_sync(unit, realm.stat_id) {
                    warn!(%unit, stat = %realm.stat_id, error = %e, "stat sync failed");
                }
            }
        }
    }
}
