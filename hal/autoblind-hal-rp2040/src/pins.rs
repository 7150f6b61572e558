//! Pin allocation by number for config-driven hardware setup
//!
//! Coil and LED pins come from the configuration file, so they are handed
//! out by GPIO number at runtime. The bridge UART (GPIO0/GPIO1) and the
//! encoder ADC input (GPIO26) need typed pins and are split off up front.

use embassy_rp::gpio::AnyPin;
use embassy_rp::peripherals::{ADC, PIN_0, PIN_1, PIN_26, UART0};
use embassy_rp::{Peri, Peripherals};

/// Bridge UART transmit pin
pub const UART_TX_PIN: u8 = 0;
/// Bridge UART receive pin
pub const UART_RX_PIN: u8 = 1;
/// Encoder ADC input
pub const ENCODER_ADC_PIN: u8 = 26;

/// Number of user GPIOs
const PIN_COUNT: usize = 30;

/// Error when requesting a pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinError {
    /// Pin number out of range (0-29 valid)
    InvalidPin,
    /// Pin already taken
    AlreadyTaken,
    /// Pin reserved for the UART or ADC
    Reserved,
}

/// Whether a pin is held back for a special function
pub fn is_reserved(pin_num: u8) -> bool {
    matches!(pin_num, UART_TX_PIN | UART_RX_PIN | ENCODER_ADC_PIN)
}

/// GPIO pins that can be taken by number
pub struct PinBank {
    pins: [Option<Peri<'static, AnyPin>>; PIN_COUNT],
}

impl PinBank {
    /// Split the peripherals into the pin bank and everything else
    pub fn split(p: Peripherals) -> (Self, RemainingPeripherals) {
        let bank = Self {
            pins: [
                None, // GPIO0
                None, // GPIO1
                Some(p.PIN_2.into()),
                Some(p.PIN_3.into()),
                Some(p.PIN_4.into()),
                Some(p.PIN_5.into()),
                Some(p.PIN_6.into()),
                Some(p.PIN_7.into()),
                Some(p.PIN_8.into()),
                Some(p.PIN_9.into()),
                Some(p.PIN_10.into()),
                Some(p.PIN_11.into()),
                Some(p.PIN_12.into()),
                Some(p.PIN_13.into()),
                Some(p.PIN_14.into()),
                Some(p.PIN_15.into()),
                Some(p.PIN_16.into()),
                Some(p.PIN_17.into()),
                Some(p.PIN_18.into()),
                Some(p.PIN_19.into()),
                Some(p.PIN_20.into()),
                Some(p.PIN_21.into()),
                Some(p.PIN_22.into()),
                Some(p.PIN_23.into()),
                Some(p.PIN_24.into()),
                Some(p.PIN_25.into()),
                None, // GPIO26
                Some(p.PIN_27.into()),
                Some(p.PIN_28.into()),
                Some(p.PIN_29.into()),
            ],
        };
        let remaining = RemainingPeripherals {
            uart0: p.UART0,
            uart_tx: p.PIN_0,
            uart_rx: p.PIN_1,
            adc: p.ADC,
            adc_pin: p.PIN_26,
        };
        (bank, remaining)
    }

    /// Take a pin by number
    pub fn take(&mut self, pin_num: u8) -> Result<Peri<'static, AnyPin>, PinError> {
        if usize::from(pin_num) >= PIN_COUNT {
            return Err(PinError::InvalidPin);
        }
        if is_reserved(pin_num) {
            return Err(PinError::Reserved);
        }
        self.pins[usize::from(pin_num)]
            .take()
            .ok_or(PinError::AlreadyTaken)
    }

    /// Check if a pin is available
    pub fn is_available(&self, pin_num: u8) -> bool {
        self.pins
            .get(usize::from(pin_num))
            .is_some_and(|p| p.is_some())
    }
}

/// Peripherals that stay typed after creating the [`PinBank`]
pub struct RemainingPeripherals {
    pub uart0: Peri<'static, UART0>,
    pub uart_tx: Peri<'static, PIN_0>,
    pub uart_rx: Peri<'static, PIN_1>,
    pub adc: Peri<'static, ADC>,
    pub adc_pin: Peri<'static, PIN_26>,
}
