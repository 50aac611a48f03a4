//! Safe wrappers for the BST driver API.
//!
//! - [`bst`]: The [`BstApi`] trait covering every driver call bufmon makes
//! - [`switch`]: Switch control registers and switch event (interrupt) types

pub mod bst;
pub mod switch;

// Re-export commonly used items
pub use bst::BstApi;
pub use switch::{EventCookie, SwitchControl, SwitchEvent, SwitchEventCallback, SwitchEventKind};
