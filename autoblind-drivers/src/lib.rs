//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in autoblind-core for the blind's hardware:
//!
//! - Stepper output stage (ULN2003 transistor array, 4 coils)
//! - Encoder level sensor (resistor ladder on an ADC channel)
//! - Status indicator (single LED)

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod indicator;
pub mod sensor;
pub mod stepper;
