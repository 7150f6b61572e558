//! Minimal MQTT 3.1.1 client
//!
//! Only what a QoS 0 light needs: CONNECT, SUBSCRIBE, PUBLISH, PUBACK for
//! QoS 1 deliveries from the broker, PINGREQ and DISCONNECT.

pub mod client;
pub mod packet;

pub use client::{MqttClient, MqttError, SessionConfig};
pub use packet::{Packet, PacketError, PacketParser, MAX_PACKET_SIZE};
