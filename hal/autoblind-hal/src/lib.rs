//! Autoblind Hardware Abstraction Layer
//!
//! Board-agnostic traits for the few peripherals the blind controller
//! touches directly. Chip HALs implement them; the protocol and driver
//! crates are written against them so they can be tested on the host.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  autoblind-firmware                     │
//! └─────────────────────────────────────────┘
//!          │                    │
//!          ▼                    ▼
//! ┌─────────────────┐  ┌─────────────────────┐
//! │ autoblind-      │  │ autoblind-drivers   │
//! │ protocol (MQTT) │  │ (coils, ladder, LED)│
//! └─────────────────┘  └─────────────────────┘
//!          │                    │
//!          ▼                    ▼
//! ┌─────────────────────────────────────────┐
//! │  autoblind-hal (this crate - traits)    │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//!            ┌──────────────────┐
//!            │ autoblind-hal-   │
//!            │     rp2040       │
//!            └──────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`uart::UartTx`], [`uart::UartRx`] - Byte link to the network bridge
//! - [`adc::AnalogInput`] - Single analog channel
//! - [`clock::Monotonic`] - Millisecond timebase for timeouts

#![no_std]
#![deny(unsafe_code)]

pub mod adc;
pub mod clock;
pub mod uart;

// Re-export key traits at crate root for convenience
pub use adc::AnalogInput;
pub use clock::Monotonic;
pub use uart::{UartRx, UartTx};
