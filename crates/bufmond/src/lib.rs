//! Buffer Monitoring Daemon - buffer occupancy counters and threshold triggers
//!
//! bufmond tracks hardware buffer/queue fill-level statistics of the switch
//! ASIC, exposes them as named counters, programs threshold alarms on those
//! counters, and turns hardware threshold-crossing interrupts into a
//! "re-read bufmon counters now" notification.
//!
//! Key pieces:
//! - [`realm`]: counter name → statistic id → addressing scheme
//! - [`address`]: per-realm resolution of (unit, gport, sub-resource, stat)
//! - [`dispatcher`]: counter get/set entry point and sync-all sweep
//! - [`control`]: device-wide control register helpers
//! - [`trigger`]: interrupt registration state machine and event hand-off
//! - [`provider`]: the surface used by the configuration owner
//! - [`daemon`]: polling and trigger loop run by the `bufmond` binary
//!
//! # Architecture
//!
//! ```text
//! config/read ──> BufmonDispatcher ──> realm ──> address ──> BstApi
//!
//! driver thread ──> callback ──(bounded mpsc)──> TriggerManager worker
//!                                                   │  disarm (control)
//!                                                   │  validate (realm)
//!                                                   └─> TriggerNotifier
//! ```

pub mod address;
pub mod config;
pub mod control;
pub mod counter;
pub mod daemon;
pub mod dispatcher;
pub mod error;
pub mod provider;
pub mod realm;
pub mod trigger;

pub use config::{BufmonConfig, CounterConfig, CountersMode, SystemConfig};
pub use control::SwitchControlHelper;
pub use counter::{CounterInfo, Operation, VendorParams};
pub use daemon::{BufmonDaemon, CounterReading};
pub use dispatcher::BufmonDispatcher;
pub use error::{BufmonError, BufmonResult};
pub use provider::BufmonProvider;
pub use realm::{RealmDescriptor, RealmKind, REALM_TABLE};
pub use trigger::{TriggerManager, TriggerNotifier, TriggerStats};
