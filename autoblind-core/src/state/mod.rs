//! Remote-facing state
//!
//! - [`device`]: position projected onto light state
//! - [`link`]: broker connection state machine and supervisor
//! - [`sync`]: the payloads published to Home Assistant

pub mod device;
pub mod link;
pub mod sync;

pub use device::DeviceState;
pub use link::{ConnectionSupervisor, LinkEvent, LinkState};
pub use sync::{announcement, state_payload};
