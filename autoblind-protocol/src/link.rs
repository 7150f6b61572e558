//! Publish/subscribe channel abstraction
//!
//! The control logic only needs five operations from the broker session.
//! [`crate::MqttClient`] provides them over a UART; tests provide them with
//! a recorder.

use heapless::{String, Vec};

/// Longest topic accepted on inbound messages
pub const MAX_TOPIC_LEN: usize = 64;

/// Largest inbound payload kept (commands are a few dozen bytes)
pub const MAX_MESSAGE_PAYLOAD: usize = 256;

/// An inbound application message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Topic the message was published on
    pub topic: String<MAX_TOPIC_LEN>,
    /// Raw payload bytes
    pub payload: Vec<u8, MAX_MESSAGE_PAYLOAD>,
}

impl Message {
    /// Build a message from borrowed parts
    ///
    /// Returns `None` when either part exceeds its capacity.
    pub fn new(topic: &str, payload: &[u8]) -> Option<Self> {
        let mut t = String::new();
        t.push_str(topic).ok()?;
        let mut p = Vec::new();
        p.extend_from_slice(payload).ok()?;
        Some(Self {
            topic: t,
            payload: p,
        })
    }
}

/// A publish/subscribe channel to the broker
pub trait BrokerLink {
    /// Transport or session error
    type Error: core::fmt::Debug;

    /// Establish a fresh session
    ///
    /// Any previous session is abandoned. Subscriptions do not survive.
    fn connect(&mut self, client_id: &str) -> Result<(), Self::Error>;

    /// Whether the session is believed to be up
    fn is_connected(&self) -> bool;

    /// Subscribe to a topic at QoS 0
    fn subscribe(&mut self, topic: &str) -> Result<(), Self::Error>;

    /// Publish a message at QoS 0
    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), Self::Error>;

    /// Service the session and return the next inbound message, if any
    ///
    /// Never blocks waiting for traffic.
    fn poll(&mut self) -> Result<Option<Message>, Self::Error>;
}
