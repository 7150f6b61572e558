//! Autoblind Broker Protocol
//!
//! Everything the controller says to, and hears from, Home Assistant.
//!
//! # Protocol Overview
//!
//! The blind appears as an MQTT JSON-schema light. Three topics are used:
//! ```text
//! ┌──────────────────────────────────────┬──────────┬──────────────────┐
//! │ TOPIC                                │ RETAINED │ PAYLOAD          │
//! ├──────────────────────────────────────┼──────────┼──────────────────┤
//! │ homeassistant/light/autoblind/config │ yes      │ discovery record │
//! │ homeassistant/autoblind/state        │ no       │ {state,brightness}│
//! │ homeassistant/autoblind/set          │ inbound  │ {state|brightness}│
//! └──────────────────────────────────────┴──────────┴──────────────────┘
//! ```
//!
//! The MQTT 3.1.1 session itself is carried over a byte link (a UART to a
//! serial-to-TCP bridge). [`mqtt`] holds the packet codec and the client;
//! [`link`] holds the transport-agnostic [`BrokerLink`] seam the core
//! logic is written against.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

extern crate alloc;

pub mod link;
pub mod mqtt;
pub mod payloads;

pub use link::{BrokerLink, Message, MAX_MESSAGE_PAYLOAD, MAX_TOPIC_LEN};
pub use mqtt::{MqttClient, MqttError, PacketError, SessionConfig, MAX_PACKET_SIZE};
pub use payloads::{
    Announcement, CommandPayload, DeviceDescriptor, PayloadError, PowerState, StatePayload,
};
