//! Configuration types
//!
//! These types define the complete controller configuration: device
//! identity, broker topics, motor wiring and encoder tuning. The firmware
//! fills them from `blind.toml`; every field has a working default.

pub mod hardware;
pub mod types;

pub use hardware::{CoilPins, PinConfig};
pub use types::*;
