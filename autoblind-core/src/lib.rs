//! Board-agnostic core logic for the window blind controller
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Hardware abstraction traits (coils, level sensor, indicator)
//! - Step sequencing and the authoritative position
//! - Encoder decoding (analog ladder to rotation intents)
//! - Position to brightness projection and payload building
//! - Remote command interpretation
//! - Connection supervision
//! - The [`blind::Blind`] orchestrator tying them together
//! - Configuration type definitions

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod blind;
pub mod command;
pub mod config;
pub mod encoder;
pub mod motion;
pub mod state;
pub mod traits;

pub use blind::{Blind, CommandOutcome, LinkReport};
