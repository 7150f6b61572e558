//! Hardware configuration types
//!
//! Pin assignments for the coil outputs and the status LED.

/// Pin configuration with optional inversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinConfig {
    /// GPIO pin number (0-29 for RP2040)
    pub pin: u8,
    /// Pin is active-low (inverted)
    pub inverted: bool,
}

impl PinConfig {
    /// Create a new pin config
    pub const fn new(pin: u8) -> Self {
        Self {
            pin,
            inverted: false,
        }
    }

    /// Create an inverted (active-low) pin
    pub const fn inverted(pin: u8) -> Self {
        Self {
            pin,
            inverted: true,
        }
    }
}

/// The four coil outputs of a unipolar stepper, in phase-table order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CoilPins {
    pub blue: PinConfig,
    pub pink: PinConfig,
    pub yellow: PinConfig,
    pub orange: PinConfig,
}

impl CoilPins {
    /// Pins in Blue, Pink, Yellow, Orange order
    pub const fn as_array(&self) -> [PinConfig; 4] {
        [self.blue, self.pink, self.yellow, self.orange]
    }

    /// Whether two coils share a GPIO
    pub fn has_duplicates(&self) -> bool {
        let pins = self.as_array();
        (0..4).any(|i| (i + 1..4).any(|j| pins[i].pin == pins[j].pin))
    }
}

impl Default for CoilPins {
    fn default() -> Self {
        Self {
            blue: PinConfig::new(2),
            pink: PinConfig::new(3),
            yellow: PinConfig::new(4),
            orange: PinConfig::new(5),
        }
    }
}
