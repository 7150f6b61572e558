//! Blocking MQTT session over a UART byte link
//!
//! Requests that expect an acknowledgement (CONNECT, SUBSCRIBE) spin on the
//! link until the answer arrives or [`SessionConfig::ack_timeout_ms`]
//! passes. Everything else is fire-and-forget at QoS 0.

use autoblind_hal::uart::{UartRx, UartTx};
use autoblind_hal::Monotonic;
use heapless::Deque;

use super::packet::{self, Packet, PacketError, PacketParser, CONNACK, MAX_PACKET_SIZE, SUBACK};
use crate::link::{BrokerLink, Message};

/// Inbound messages held between polls
const INBOX_DEPTH: usize = 4;

/// SUBACK return code for a rejected subscription
const SUBSCRIBE_FAILURE: u8 = 0x80;

/// Session parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SessionConfig {
    /// Keep-alive interval advertised in CONNECT (0 disables pings)
    pub keep_alive_s: u16,
    /// How long to wait for CONNACK, SUBACK or PINGRESP
    pub ack_timeout_ms: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            keep_alive_s: 120,
            ack_timeout_ms: 5000,
        }
    }
}

/// Session errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MqttError {
    /// The byte link failed
    Io,
    /// Outbound packet could not be encoded
    Packet(PacketError),
    /// Broker refused CONNECT or SUBSCRIBE with this code
    Refused(u8),
    /// Acknowledgement or PINGRESP overdue
    Timeout,
    /// No session
    NotConnected,
}

impl From<PacketError> for MqttError {
    fn from(e: PacketError) -> Self {
        MqttError::Packet(e)
    }
}

/// MQTT client driving a UART link
pub struct MqttClient<U, K> {
    uart: U,
    clock: K,
    config: SessionConfig,
    parser: PacketParser,
    connected: bool,
    next_packet_id: u16,
    last_sent_ms: u64,
    ping_sent_ms: Option<u64>,
    inbox: Deque<Message, INBOX_DEPTH>,
    tx_buf: [u8; MAX_PACKET_SIZE],
}

impl<U, K> MqttClient<U, K>
where
    U: UartTx + UartRx,
    K: Monotonic,
{
    /// Create a client; no traffic is sent until [`BrokerLink::connect`]
    pub fn new(uart: U, clock: K, config: SessionConfig) -> Self {
        Self {
            uart,
            clock,
            config,
            parser: PacketParser::new(),
            connected: false,
            next_packet_id: 0,
            last_sent_ms: 0,
            ping_sent_ms: None,
            inbox: Deque::new(),
            tx_buf: [0u8; MAX_PACKET_SIZE],
        }
    }

    /// Close the session politely if one is open
    pub fn disconnect(&mut self) {
        if self.connected {
            if let Ok(len) = packet::encode_disconnect(&mut self.tx_buf) {
                let _ = self.uart.write_blocking(&self.tx_buf[..len]);
                let _ = self.uart.flush();
            }
        }
        self.connected = false;
        self.ping_sent_ms = None;
    }

    fn lost(&mut self, err: MqttError) -> MqttError {
        self.connected = false;
        self.ping_sent_ms = None;
        err
    }

    fn send(&mut self, len: usize) -> Result<(), MqttError> {
        if self.uart.write_blocking(&self.tx_buf[..len]).is_err() || self.uart.flush().is_err() {
            return Err(self.lost(MqttError::Io));
        }
        self.last_sent_ms = self.clock.now_ms();
        Ok(())
    }

    fn allocate_packet_id(&mut self) -> u16 {
        self.next_packet_id = self.next_packet_id.wrapping_add(1);
        if self.next_packet_id == 0 {
            self.next_packet_id = 1;
        }
        self.next_packet_id
    }

    /// Drain pending bytes until one packet completes
    fn next_packet(&mut self) -> Result<Option<Packet>, MqttError> {
        loop {
            let byte = match self.uart.read_byte() {
                Ok(Some(byte)) => byte,
                Ok(None) => return Ok(None),
                Err(_) => return Err(self.lost(MqttError::Io)),
            };
            // Dropped packets leave the parser resynchronized
            if let Ok(Some(packet)) = self.parser.feed(byte) {
                return Ok(Some(packet));
            }
        }
    }

    /// Handle a packet nobody is waiting for
    fn absorb(&mut self, packet: Packet) -> Result<(), MqttError> {
        match packet {
            Packet::Publish {
                message,
                qos,
                packet_id,
            } => {
                if let (1, Some(id)) = (qos, packet_id) {
                    let len = packet::encode_puback(&mut self.tx_buf, id)?;
                    self.send(len)?;
                }
                // Only reachable while waiting for an ack; poll stops
                // reading before the inbox fills
                let _ = self.inbox.push_back(message);
            }
            Packet::PingResp => self.ping_sent_ms = None,
            _ => {}
        }
        Ok(())
    }

    fn await_packet(&mut self, packet_type: u8) -> Result<Packet, MqttError> {
        let started = self.clock.now_ms();
        loop {
            if let Some(packet) = self.next_packet()? {
                if packet.packet_type() == packet_type {
                    return Ok(packet);
                }
                self.absorb(packet)?;
            }
            if self.clock.now_ms().saturating_sub(started) >= u64::from(self.config.ack_timeout_ms) {
                return Err(self.lost(MqttError::Timeout));
            }
        }
    }

    fn service_keep_alive(&mut self) -> Result<(), MqttError> {
        if self.config.keep_alive_s == 0 {
            return Ok(());
        }
        let now = self.clock.now_ms();
        match self.ping_sent_ms {
            Some(sent) => {
                if now.saturating_sub(sent) >= u64::from(self.config.ack_timeout_ms) {
                    return Err(self.lost(MqttError::Timeout));
                }
            }
            None => {
                // Ping at half the advertised interval
                let idle = now.saturating_sub(self.last_sent_ms);
                if idle >= u64::from(self.config.keep_alive_s) * 500 {
                    let len = packet::encode_pingreq(&mut self.tx_buf)?;
                    self.send(len)?;
                    self.ping_sent_ms = Some(now);
                }
            }
        }
        Ok(())
    }
}

impl<U, K> BrokerLink for MqttClient<U, K>
where
    U: UartTx + UartRx,
    K: Monotonic,
{
    type Error = MqttError;

    fn connect(&mut self, client_id: &str) -> Result<(), MqttError> {
        self.disconnect();
        self.parser.reset();
        self.inbox.clear();

        let len = packet::encode_connect(&mut self.tx_buf, client_id, self.config.keep_alive_s)?;
        self.send(len)?;

        match self.await_packet(CONNACK)? {
            Packet::ConnAck { return_code: 0, .. } => {
                self.connected = true;
                Ok(())
            }
            Packet::ConnAck { return_code, .. } => Err(MqttError::Refused(return_code)),
            _ => Err(MqttError::Packet(PacketError::MalformedPacket)),
        }
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), MqttError> {
        if !self.connected {
            return Err(MqttError::NotConnected);
        }
        let id = self.allocate_packet_id();
        let len = packet::encode_subscribe(&mut self.tx_buf, id, topic)?;
        self.send(len)?;

        match self.await_packet(SUBACK)? {
            Packet::SubAck {
                return_code: SUBSCRIBE_FAILURE,
                ..
            } => Err(MqttError::Refused(SUBSCRIBE_FAILURE)),
            _ => Ok(()),
        }
    }

    fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), MqttError> {
        if !self.connected {
            return Err(MqttError::NotConnected);
        }
        let len = packet::encode_publish(&mut self.tx_buf, topic, payload, retain)?;
        self.send(len)
    }

    fn poll(&mut self) -> Result<Option<Message>, MqttError> {
        if !self.connected {
            return Err(MqttError::NotConnected);
        }
        // Bytes past a full inbox stay in the UART buffer, in order
        let mut drained = false;
        while !self.inbox.is_full() {
            match self.next_packet()? {
                Some(packet) => self.absorb(packet)?,
                None => {
                    drained = true;
                    break;
                }
            }
        }
        // A PINGRESP may still be queued behind unread messages
        if drained {
            self.service_keep_alive()?;
        }
        Ok(self.inbox.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autoblind_hal::uart::ErrorType;
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;
    use std::rc::Rc;
    use std::vec::Vec;

    #[derive(Clone, Default)]
    struct MockUart {
        rx: Rc<RefCell<VecDeque<u8>>>,
        tx: Rc<RefCell<Vec<u8>>>,
        broken: Rc<Cell<bool>>,
    }

    impl MockUart {
        fn inject(&self, bytes: &[u8]) {
            self.rx.borrow_mut().extend(bytes.iter().copied());
        }

        fn take_tx(&self) -> Vec<u8> {
            core::mem::take(&mut *self.tx.borrow_mut())
        }
    }

    impl ErrorType for MockUart {
        type Error = ();
    }

    impl UartTx for MockUart {
        fn write_blocking(&mut self, data: &[u8]) -> Result<(), ()> {
            if self.broken.get() {
                return Err(());
            }
            self.tx.borrow_mut().extend_from_slice(data);
            Ok(())
        }

        fn flush(&mut self) -> Result<(), ()> {
            Ok(())
        }
    }

    impl UartRx for MockUart {
        fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, ()> {
            if self.broken.get() {
                return Err(());
            }
            let mut rx = self.rx.borrow_mut();
            let mut n = 0;
            while n < buf.len() {
                match rx.pop_front() {
                    Some(b) => {
                        buf[n] = b;
                        n += 1;
                    }
                    None => break,
                }
            }
            Ok(n)
        }
    }

    /// Clock that advances by `step` on every read
    #[derive(Clone, Default)]
    struct MockClock {
        now: Rc<Cell<u64>>,
        step: u64,
    }

    impl MockClock {
        fn advance(&self, ms: u64) {
            self.now.set(self.now.get() + ms);
        }
    }

    impl Monotonic for MockClock {
        fn now_ms(&self) -> u64 {
            let t = self.now.get();
            self.now.set(t + self.step);
            t
        }
    }

    const CONNACK_OK: [u8; 4] = [0x20, 2, 0, 0];

    fn connected_client() -> (MqttClient<MockUart, MockClock>, MockUart, MockClock) {
        let uart = MockUart::default();
        let clock = MockClock::default();
        let mut client = MqttClient::new(uart.clone(), clock.clone(), SessionConfig::default());
        uart.inject(&CONNACK_OK);
        client.connect("autoblind").unwrap();
        uart.take_tx();
        (client, uart, clock)
    }

    #[test]
    fn test_connect_sends_connect_and_waits_for_connack() {
        let uart = MockUart::default();
        let mut client = MqttClient::new(uart.clone(), MockClock::default(), SessionConfig::default());
        uart.inject(&CONNACK_OK);

        assert!(!client.is_connected());
        client.connect("autoblind").unwrap();
        assert!(client.is_connected());

        let tx = uart.take_tx();
        assert_eq!(tx[0], 0x10);
        assert_eq!(&tx[tx.len() - 9..], b"autoblind");
    }

    #[test]
    fn test_connect_refused() {
        let uart = MockUart::default();
        let mut client = MqttClient::new(uart.clone(), MockClock::default(), SessionConfig::default());
        uart.inject(&[0x20, 2, 0, 5]);

        assert_eq!(client.connect("autoblind"), Err(MqttError::Refused(5)));
        assert!(!client.is_connected());
    }

    #[test]
    fn test_connect_times_out_without_connack() {
        let clock = MockClock {
            step: 1000,
            ..Default::default()
        };
        let mut client = MqttClient::new(MockUart::default(), clock, SessionConfig::default());

        assert_eq!(client.connect("autoblind"), Err(MqttError::Timeout));
        assert!(!client.is_connected());
    }

    #[test]
    fn test_reconnect_sends_disconnect_first() {
        let (mut client, uart, _clock) = connected_client();
        uart.inject(&CONNACK_OK);
        client.connect("autoblind").unwrap();

        let tx = uart.take_tx();
        assert_eq!(&tx[..2], &[0xE0, 0]);
        assert_eq!(tx[2], 0x10);
    }

    #[test]
    fn test_requires_session() {
        let mut client =
            MqttClient::new(MockUart::default(), MockClock::default(), SessionConfig::default());
        assert_eq!(client.publish("a", b"{}", false), Err(MqttError::NotConnected));
        assert_eq!(client.subscribe("a"), Err(MqttError::NotConnected));
        assert_eq!(client.poll(), Err(MqttError::NotConnected));
    }

    #[test]
    fn test_subscribe_waits_for_suback() {
        let (mut client, uart, _clock) = connected_client();
        uart.inject(&[0x90, 3, 0, 1, 0]);

        client.subscribe("x/y").unwrap();
        assert_eq!(uart.take_tx(), vec![0x82, 8, 0, 1, 0, 3, b'x', b'/', b'y', 0]);
    }

    #[test]
    fn test_subscribe_rejected() {
        let (mut client, uart, _clock) = connected_client();
        uart.inject(&[0x90, 3, 0, 1, 0x80]);
        assert_eq!(client.subscribe("x/y"), Err(MqttError::Refused(0x80)));
    }

    #[test]
    fn test_publish_writes_packet() {
        let (mut client, uart, _clock) = connected_client();
        client.publish("a/b", b"hi", true).unwrap();
        assert_eq!(uart.take_tx(), vec![0x31, 7, 0, 3, b'a', b'/', b'b', b'h', b'i']);
    }

    #[test]
    fn test_poll_delivers_and_acks_qos1() {
        let (mut client, uart, _clock) = connected_client();
        // QoS 1 publish, topic "t", id 9, payload "{}"
        uart.inject(&[0x32, 7, 0, 1, b't', 0, 9, b'{', b'}']);

        let msg = client.poll().unwrap().unwrap();
        assert_eq!(msg.topic.as_str(), "t");
        assert_eq!(&msg.payload[..], b"{}");
        assert_eq!(uart.take_tx(), vec![0x40, 2, 0, 9]);
        assert_eq!(client.poll(), Ok(None));
    }

    #[test]
    fn test_poll_keeps_messages_seen_while_waiting_for_ack() {
        let (mut client, uart, _clock) = connected_client();
        uart.inject(&[0x30, 5, 0, 1, b't', b'{', b'}']);
        uart.inject(&[0x90, 3, 0, 1, 0]);

        client.subscribe("t").unwrap();
        let msg = client.poll().unwrap().unwrap();
        assert_eq!(msg.topic.as_str(), "t");
    }

    #[test]
    fn test_burst_delivered_in_order() {
        let (mut client, uart, _clock) = connected_client();
        let burst = INBOX_DEPTH as u8 + 4;
        for n in 1..=burst {
            uart.inject(&[0x30, 4, 0, 1, b't', b'0' + n]);
        }

        let mut delivered = Vec::new();
        while let Some(msg) = client.poll().unwrap() {
            delivered.push(msg.payload[0]);
        }
        let expected: Vec<u8> = (1..=burst).map(|n| b'0' + n).collect();
        assert_eq!(delivered, expected);
        assert!(client.is_connected());
    }

    #[test]
    fn test_pingresp_read_before_deadline_check() {
        let (mut client, uart, clock) = connected_client();

        clock.advance(60_000);
        assert_eq!(client.poll(), Ok(None));
        assert_eq!(uart.take_tx(), vec![0xC0, 0]);

        // Answer arrived during a long move; first poll after it is late
        uart.inject(&[0xD0, 0]);
        clock.advance(20_000);
        assert_eq!(client.poll(), Ok(None));
        assert!(client.is_connected());
    }

    #[test]
    fn test_keep_alive_ping_and_response() {
        let (mut client, uart, clock) = connected_client();

        clock.advance(30_000);
        assert_eq!(client.poll(), Ok(None));
        assert!(uart.take_tx().is_empty());

        clock.advance(30_000);
        assert_eq!(client.poll(), Ok(None));
        assert_eq!(uart.take_tx(), vec![0xC0, 0]);

        uart.inject(&[0xD0, 0]);
        clock.advance(1000);
        assert_eq!(client.poll(), Ok(None));
        clock.advance(10_000);
        assert_eq!(client.poll(), Ok(None));
        assert!(client.is_connected());
    }

    #[test]
    fn test_overdue_pingresp_drops_session() {
        let (mut client, uart, clock) = connected_client();

        clock.advance(60_000);
        assert_eq!(client.poll(), Ok(None));
        assert_eq!(uart.take_tx(), vec![0xC0, 0]);

        clock.advance(5_000);
        assert_eq!(client.poll(), Err(MqttError::Timeout));
        assert!(!client.is_connected());
    }

    #[test]
    fn test_io_error_drops_session() {
        let (mut client, uart, _clock) = connected_client();
        uart.broken.set(true);

        assert_eq!(client.publish("a", b"{}", false), Err(MqttError::Io));
        assert!(!client.is_connected());
    }
}
