//! Safe Rust interface to the ASIC buffer statistics tracking (BST) API.
//!
//! This crate wraps the driver-level buffer statistics primitives that the
//! bufmon subsystem depends on: switch control registers, logical port
//! resolution, per-statistic get/profile/clear/sync, and switch event
//! (interrupt) callback registration.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`types`]: Hardware unit ids, logical port handles, statistic ids
//! - [`error`]: Driver status codes and the [`BstError`] type
//! - [`api`]: The [`BstApi`] trait and switch-level control/event types
//! - [`sim`]: An in-memory ASIC implementing [`BstApi`]
//!
//! # Example
//!
//! ```
//! use sonic_bst::{BstApi, BstStatId, Gport, HwUnit, SimulatedAsic};
//!
//! let asic = SimulatedAsic::new(1, 32);
//! let unit = HwUnit::new(0);
//! let gport = asic.port_gport_get(unit, 3).unwrap();
//! asic.set_stat_value(unit, gport, 4, BstStatId::Ucast, 1200);
//! assert_eq!(asic.bst_stat_get(unit, gport, 4, BstStatId::Ucast).unwrap(), 1200);
//! assert_ne!(gport, Gport::NONE);
//! ```

pub mod api;
pub mod error;
pub mod sim;
pub mod types;

// Re-export commonly used types
pub use api::{
    BstApi, EventCookie, SwitchControl, SwitchEvent, SwitchEventCallback, SwitchEventKind,
};
pub use error::{BstError, BstResult, BstStatus};
pub use sim::{BstCall, BstOp, SimulatedAsic};
pub use types::{BstProfile, BstStatId, Gport, HwUnit};
