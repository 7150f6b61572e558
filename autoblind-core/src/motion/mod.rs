//! Motion control
//!
//! - [`phase`]: the 8-phase half-step coil table
//! - [`position`]: the single authoritative position and its scale
//! - [`driver`]: walks the position to a target one step at a time

pub mod driver;
pub mod phase;
pub mod position;

pub use driver::{MotorDriver, MoveReport};
pub use phase::{Coil, CoilPattern, PHASE_TABLE};
pub use position::{
    clamp_target, target_for_brightness, PositionStore, MAX_BRIGHTNESS, MAX_POSITION, SCALE,
};

/// What a control input asks the motor to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotionIntent {
    /// Walk to this position; negative parks at zero
    MoveTo(i32),
    /// Leave the motor alone
    NoOp,
}
