//! Status LED
//!
//! Blinks twice when a broker session comes up.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use autoblind_core::traits::Indicator;

/// Time each phase of the blink is held
pub const BLINK_PHASE_MS: u32 = 100;

/// Single GPIO LED
pub struct StatusLed<P, D> {
    pin: P,
    delay: D,
    /// If true, LED on = pin LOW
    inverted: bool,
}

impl<P: OutputPin, D: DelayNs> StatusLed<P, D> {
    /// Create an LED, initially off
    pub fn new(pin: P, delay: D, inverted: bool) -> Self {
        let mut led = Self {
            pin,
            delay,
            inverted,
        };
        led.set(false);
        led
    }

    /// Drive the LED
    pub fn set(&mut self, on: bool) {
        if on != self.inverted {
            self.pin.set_high().ok();
        } else {
            self.pin.set_low().ok();
        }
    }
}

impl<P: OutputPin, D: DelayNs> Indicator for StatusLed<P, D> {
    /// off, on, off, on; ends lit
    fn blink(&mut self) {
        self.set(false);
        self.delay.delay_ms(BLINK_PHASE_MS);
        self.set(true);
        self.delay.delay_ms(BLINK_PHASE_MS);
        self.set(false);
        self.delay.delay_ms(BLINK_PHASE_MS);
        self.set(true);
    }
}
