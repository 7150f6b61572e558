//! Open-loop stepper motion
//!
//! [`MotorDriver`] is the only writer of the position. Each step drives the
//! phase for the current position, updates the position, then waits for
//! the rotor to settle. A completed move always ends with the coils off.

use embedded_hal::delay::DelayNs;

use super::phase::CoilPattern;
use super::position::{clamp_target, PositionStore};
use crate::traits::{CoilDriver, Direction, PositionStepper};

/// Summary of a completed move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MoveReport {
    /// Position before the move
    pub from: u32,
    /// Position after the move
    pub to: u32,
    /// Steps taken
    pub steps: u32,
}

/// Stepper driven through a [`CoilDriver`]
pub struct MotorDriver<C, D> {
    coils: C,
    delay: D,
    store: PositionStore,
    step_delay_us: u32,
}

impl<C: CoilDriver, D: DelayNs> MotorDriver<C, D> {
    /// Create a driver at position zero with the coils released
    pub fn new(mut coils: C, delay: D, step_delay_us: u32) -> Self {
        coils.release();
        Self {
            coils,
            delay,
            store: PositionStore::new(),
            step_delay_us,
        }
    }

    /// Borrow the output stage
    pub fn coils(&self) -> &C {
        &self.coils
    }
}

impl<C: CoilDriver, D: DelayNs> PositionStepper for MotorDriver<C, D> {
    fn step(&mut self, dir: Direction) {
        self.coils.energize(CoilPattern::for_position(self.store.get()));
        match dir {
            Direction::Forward => self.store.advance(),
            Direction::Backward => self.store.retreat(),
        }
        self.delay.delay_us(self.step_delay_us);
    }

    fn move_to(&mut self, requested: i32) -> MoveReport {
        let from = self.store.get();
        let target = clamp_target(requested);

        while self.store.get() < target {
            self.step(Direction::Forward);
        }
        while self.store.get() > target {
            self.step(Direction::Backward);
        }
        self.coils.release();

        let to = self.store.get();
        MoveReport {
            from,
            to,
            steps: from.abs_diff(to),
        }
    }

    fn position(&self) -> u32 {
        self.store.get()
    }
}
