//! Device state projection

use autoblind_protocol::{PowerState, StatePayload};

use crate::motion::{MAX_BRIGHTNESS, SCALE};

/// Light state derived from the motor position
///
/// Recomputed for every publish; never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceState {
    /// Blind is open at all
    pub on: bool,
    /// `ceil(position / SCALE)`, clamped to 1..=255
    pub brightness: u8,
}

impl DeviceState {
    /// Project a position
    pub fn from_position(position: u32) -> Self {
        let brightness = position.div_ceil(SCALE).clamp(1, MAX_BRIGHTNESS) as u8;
        Self {
            on: position > 0,
            brightness,
        }
    }

    /// Wire form
    pub fn to_payload(self) -> StatePayload {
        StatePayload {
            state: if self.on {
                PowerState::On
            } else {
                PowerState::Off
            },
            brightness: self.brightness,
        }
    }
}
