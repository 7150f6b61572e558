//! Stepper motor traits
//!
//! The blind motor is a unipolar 4-coil stepper driven open-loop through a
//! transistor array. [`CoilDriver`] is the output stage; [`PositionStepper`]
//! is the motion layer that owns the position.

use crate::motion::{CoilPattern, MoveReport};

/// Motor rotation direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Towards larger positions (blind opening)
    Forward,
    /// Towards position zero
    Backward,
}

impl Direction {
    /// Get the opposite direction
    pub fn opposite(self) -> Self {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
        }
    }
}

/// Output stage for the four coils
///
/// There is no feedback; writes cannot fail from the caller's point of view.
pub trait CoilDriver {
    /// Drive every coil to the state in `pattern`
    fn energize(&mut self, pattern: CoilPattern);

    /// De-energize all coils
    fn release(&mut self) {
        self.energize(CoilPattern::RELEASED);
    }
}

/// Trait for steppers that track their own position
///
/// Positions are in steps. Zero is the fully closed end; there is no
/// upper limit enforced here.
pub trait PositionStepper {
    /// Move exactly one step
    fn step(&mut self, dir: Direction);

    /// Walk to `requested` (negative parks at zero), then release the coils
    ///
    /// Blocks for the whole move.
    fn move_to(&mut self, requested: i32) -> MoveReport;

    /// Current position in steps
    fn position(&self) -> u32;
}
