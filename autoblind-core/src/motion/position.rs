//! Position store and position/brightness scale
//!
//! Position is in motor steps. Brightness 1..=255 maps onto
//! `SCALE`-step bands, roughly two turns of the motor end to end.

/// Steps per brightness unit
pub const SCALE: u32 = 32;

/// Largest reported brightness
pub const MAX_BRIGHTNESS: u32 = 255;

/// Position of full brightness
pub const MAX_POSITION: u32 = MAX_BRIGHTNESS * SCALE;

/// The authoritative motor position
///
/// Only [`super::MotorDriver`] mutates it, one step at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PositionStore {
    steps: u32,
}

impl PositionStore {
    /// Position zero (boot state)
    pub const fn new() -> Self {
        Self { steps: 0 }
    }

    /// Current position in steps
    pub const fn get(&self) -> u32 {
        self.steps
    }

    pub(crate) fn advance(&mut self) {
        self.steps = self.steps.saturating_add(1);
    }

    pub(crate) fn retreat(&mut self) {
        self.steps = self.steps.saturating_sub(1);
    }
}

/// Clamp a requested target: negative parks at zero
pub const fn clamp_target(requested: i32) -> u32 {
    if requested < 0 {
        0
    } else {
        requested as u32
    }
}

/// Target position for a commanded brightness
///
/// Not clamped to [`MAX_POSITION`]; the caller decides what to do with
/// out-of-range requests.
pub fn target_for_brightness(brightness: i64) -> i32 {
    brightness
        .saturating_mul(i64::from(SCALE))
        .clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}
