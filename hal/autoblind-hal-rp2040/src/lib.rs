//! RP2040-specific HAL for the window blind firmware
//!
//! This crate provides RP2040-specific implementations of the shared
//! `autoblind-hal` traits, plus RP2040-specific functionality:
//!
//! - GPIO allocation by number for config-driven setup
//! - UART pin mapping and the bridge serial link
//! - ADC channel mapping and blocking conversions
//! - Millisecond clock on the embassy time driver

#![no_std]

pub mod adc;
pub mod clock;
pub mod pins;
pub mod uart;

pub use adc::{AdcChannel, AdcInput};
pub use clock::EmbassyClock;
pub use pins::{PinBank, PinError, RemainingPeripherals};
pub use uart::{gpio_to_uart, BridgeUart, UartId};
