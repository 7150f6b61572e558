//! ULN2003 unipolar stepper stage
//!
//! Four GPIOs drive the Darlington array; a high input sinks the coil.
//! Pins are given in Blue, Pink, Yellow, Orange order.

use embedded_hal::digital::OutputPin;

use autoblind_core::config::CoilPins;
use autoblind_core::motion::{Coil, CoilPattern};
use autoblind_core::traits::CoilDriver;

/// Four-coil output stage
pub struct Uln2003<P> {
    pins: [P; 4],
    /// Per-pin: coil energized = pin LOW
    inverted: [bool; 4],
    pattern: CoilPattern,
}

impl<P: OutputPin> Uln2003<P> {
    /// Create a stage with all coils released
    pub fn new(pins: [P; 4], inverted: [bool; 4]) -> Self {
        let mut stage = Self {
            pins,
            inverted,
            pattern: CoilPattern::RELEASED,
        };
        stage.energize(CoilPattern::RELEASED);
        stage
    }

    /// Create a stage taking inversion flags from the pin configuration
    pub fn from_config(pins: [P; 4], config: &CoilPins) -> Self {
        Self::new(pins, config.as_array().map(|p| p.inverted))
    }

    /// Last pattern written
    pub fn pattern(&self) -> CoilPattern {
        self.pattern
    }
}

impl<P: OutputPin> CoilDriver for Uln2003<P> {
    fn energize(&mut self, pattern: CoilPattern) {
        for coil in Coil::ALL {
            let i = coil.index();
            let pin = &mut self.pins[i];
            // GPIO writes on this target cannot fail
            if pattern.is_energized(coil) != self.inverted[i] {
                pin.set_high().ok();
            } else {
                pin.set_low().ok();
            }
        }
        self.pattern = pattern;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autoblind_core::config::PinConfig;
    use autoblind_core::motion::PHASE_TABLE;
    use core::convert::Infallible;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Mock GPIO pin sharing its level with the test
    #[derive(Clone, Default)]
    struct MockPin {
        high: Rc<Cell<bool>>,
    }

    impl embedded_hal::digital::ErrorType for MockPin {
        type Error = Infallible;
    }

    impl OutputPin for MockPin {
        fn set_low(&mut self) -> Result<(), Infallible> {
            self.high.set(false);
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            self.high.set(true);
            Ok(())
        }
    }

    fn pins() -> ([MockPin; 4], [Rc<Cell<bool>>; 4]) {
        let pins: [MockPin; 4] = Default::default();
        let levels = pins.clone().map(|p| p.high);
        (pins, levels)
    }

    fn levels(l: &[Rc<Cell<bool>>; 4]) -> [bool; 4] {
        [l[0].get(), l[1].get(), l[2].get(), l[3].get()]
    }

    #[test]
    fn test_phase_table_outputs() {
        let (p, l) = pins();
        let mut stage = Uln2003::new(p, [false; 4]);
        assert_eq!(levels(&l), [false; 4]);

        stage.energize(PHASE_TABLE[0]);
        assert_eq!(levels(&l), [true, false, false, false]);

        stage.energize(PHASE_TABLE[1]);
        assert_eq!(levels(&l), [true, true, false, false]);

        stage.energize(PHASE_TABLE[7]);
        assert_eq!(levels(&l), [true, false, false, true]);
        assert_eq!(stage.pattern(), PHASE_TABLE[7]);

        stage.release();
        assert_eq!(levels(&l), [false; 4]);
        assert_eq!(stage.pattern(), CoilPattern::RELEASED);
    }

    #[test]
    fn test_inverted_pins() {
        let (p, l) = pins();
        let coils = CoilPins {
            blue: PinConfig::inverted(2),
            ..CoilPins::default()
        };
        let mut stage = Uln2003::from_config(p, &coils);

        // Released: inverted blue idles high
        assert_eq!(levels(&l), [true, false, false, false]);

        stage.energize(PHASE_TABLE[1]);
        assert_eq!(levels(&l), [false, true, false, false]);
    }
}
