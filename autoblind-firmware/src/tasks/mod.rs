//! Embassy async tasks
//!
//! The blind runs as a single cooperative control loop; moves and
//! reconnects block it by design of the hardware.

pub mod control;

pub use control::{control_task, BoardBlind};
