//! MQTT 3.1.1 packet encoding and decoding.
//!
//! Fixed header:
//! - TYPE|FLAGS (1 byte): packet type in the high nibble
//! - REMAINING LENGTH (1-4 bytes): base-128 varint, low bits first
//!
//! Encoders write into caller-provided buffers. The parser is fed one byte
//! at a time and skips packets larger than [`MAX_PACKET_SIZE`].

use heapless::Vec;

use crate::link::{Message, MAX_MESSAGE_PAYLOAD, MAX_TOPIC_LEN};

/// Largest packet sent or accepted (the discovery record is ~600 bytes)
pub const MAX_PACKET_SIZE: usize = 1024;

/// Client request to connect
pub const CONNECT: u8 = 0x10;
/// Connect acknowledgment
pub const CONNACK: u8 = 0x20;
/// Publish message
pub const PUBLISH: u8 = 0x30;
/// Publish acknowledgment (QoS 1)
pub const PUBACK: u8 = 0x40;
/// Subscribe request (flags fixed at 0b0010)
pub const SUBSCRIBE: u8 = 0x82;
/// Subscribe acknowledgment
pub const SUBACK: u8 = 0x90;
/// Ping request
pub const PINGREQ: u8 = 0xC0;
/// Ping response
pub const PINGRESP: u8 = 0xD0;
/// Client is disconnecting
pub const DISCONNECT: u8 = 0xE0;

const PROTOCOL_NAME: &str = "MQTT";
const PROTOCOL_LEVEL: u8 = 4;
const CLEAN_SESSION: u8 = 0x02;
const RETAIN: u8 = 0x01;

/// Errors that can occur during packet parsing or encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PacketError {
    /// Buffer too small for encoding
    BufferTooSmall,
    /// Packet exceeds [`MAX_PACKET_SIZE`]
    PacketTooLarge,
    /// Remaining-length field longer than four bytes
    MalformedLength,
    /// Body does not match its packet type
    MalformedPacket,
    /// Inbound topic longer than we keep
    TopicTooLong,
    /// Inbound payload larger than we keep
    PayloadTooLarge,
}

/// A decoded inbound packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    /// Broker answer to CONNECT
    ConnAck {
        session_present: bool,
        return_code: u8,
    },
    /// Application message
    Publish {
        message: Message,
        qos: u8,
        packet_id: Option<u16>,
    },
    /// Broker answer to SUBSCRIBE
    SubAck { packet_id: u16, return_code: u8 },
    /// Broker answer to PINGREQ
    PingResp,
    /// Anything else, identified by its first header byte
    Other(u8),
}

impl Packet {
    /// Packet type nibble (flags cleared)
    pub fn packet_type(&self) -> u8 {
        match self {
            Packet::ConnAck { .. } => CONNACK,
            Packet::Publish { .. } => PUBLISH,
            Packet::SubAck { .. } => SUBACK,
            Packet::PingResp => PINGRESP,
            Packet::Other(header) => header & 0xF0,
        }
    }
}

/// Cursor over an output buffer
struct Writer<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> Writer<'a> {
    fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn put(&mut self, bytes: &[u8]) -> Result<(), PacketError> {
        let end = self.pos + bytes.len();
        let dst = self
            .buf
            .get_mut(self.pos..end)
            .ok_or(PacketError::BufferTooSmall)?;
        dst.copy_from_slice(bytes);
        self.pos = end;
        Ok(())
    }

    fn put_u8(&mut self, byte: u8) -> Result<(), PacketError> {
        self.put(&[byte])
    }

    fn put_u16(&mut self, value: u16) -> Result<(), PacketError> {
        self.put(&value.to_be_bytes())
    }

    fn put_str(&mut self, s: &str) -> Result<(), PacketError> {
        let len = u16::try_from(s.len()).map_err(|_| PacketError::PacketTooLarge)?;
        self.put_u16(len)?;
        self.put(s.as_bytes())
    }

    fn put_header(&mut self, first: u8, remaining: usize) -> Result<(), PacketError> {
        if 1 + varint_len(remaining) + remaining > MAX_PACKET_SIZE {
            return Err(PacketError::PacketTooLarge);
        }
        self.put_u8(first)?;
        let mut len = remaining;
        loop {
            let mut byte = (len % 128) as u8;
            len /= 128;
            if len > 0 {
                byte |= 0x80;
            }
            self.put_u8(byte)?;
            if len == 0 {
                return Ok(());
            }
        }
    }
}

fn varint_len(value: usize) -> usize {
    match value {
        0..=127 => 1,
        128..=16_383 => 2,
        16_384..=2_097_151 => 3,
        _ => 4,
    }
}

/// Encode CONNECT with a clean session
///
/// Returns the number of bytes written
pub fn encode_connect(
    buffer: &mut [u8],
    client_id: &str,
    keep_alive_s: u16,
) -> Result<usize, PacketError> {
    // name + level + flags + keep-alive + client id
    let remaining = 2 + PROTOCOL_NAME.len() + 1 + 1 + 2 + 2 + client_id.len();
    let mut w = Writer::new(buffer);
    w.put_header(CONNECT, remaining)?;
    w.put_str(PROTOCOL_NAME)?;
    w.put_u8(PROTOCOL_LEVEL)?;
    w.put_u8(CLEAN_SESSION)?;
    w.put_u16(keep_alive_s)?;
    w.put_str(client_id)?;
    Ok(w.pos)
}

/// Encode a QoS 0 PUBLISH
pub fn encode_publish(
    buffer: &mut [u8],
    topic: &str,
    payload: &[u8],
    retain: bool,
) -> Result<usize, PacketError> {
    let remaining = 2 + topic.len() + payload.len();
    let first = if retain { PUBLISH | RETAIN } else { PUBLISH };
    let mut w = Writer::new(buffer);
    w.put_header(first, remaining)?;
    w.put_str(topic)?;
    w.put(payload)?;
    Ok(w.pos)
}

/// Encode SUBSCRIBE for a single topic at QoS 0
pub fn encode_subscribe(
    buffer: &mut [u8],
    packet_id: u16,
    topic: &str,
) -> Result<usize, PacketError> {
    let remaining = 2 + 2 + topic.len() + 1;
    let mut w = Writer::new(buffer);
    w.put_header(SUBSCRIBE, remaining)?;
    w.put_u16(packet_id)?;
    w.put_str(topic)?;
    w.put_u8(0)?;
    Ok(w.pos)
}

/// Encode PUBACK for a QoS 1 delivery
pub fn encode_puback(buffer: &mut [u8], packet_id: u16) -> Result<usize, PacketError> {
    let mut w = Writer::new(buffer);
    w.put_header(PUBACK, 2)?;
    w.put_u16(packet_id)?;
    Ok(w.pos)
}

/// Encode PINGREQ
pub fn encode_pingreq(buffer: &mut [u8]) -> Result<usize, PacketError> {
    let mut w = Writer::new(buffer);
    w.put_header(PINGREQ, 0)?;
    Ok(w.pos)
}

/// Encode DISCONNECT
pub fn encode_disconnect(buffer: &mut [u8]) -> Result<usize, PacketError> {
    let mut w = Writer::new(buffer);
    w.put_header(DISCONNECT, 0)?;
    Ok(w.pos)
}

/// State machine for parsing inbound packets
#[derive(Debug, Clone)]
pub struct PacketParser {
    state: ParseState,
    header: u8,
    remaining: usize,
    multiplier: usize,
    length_bytes: u8,
    buffer: Vec<u8, MAX_PACKET_SIZE>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    /// Waiting for the TYPE|FLAGS byte
    WaitingForHeader,
    /// Accumulating the remaining-length varint
    ReadingLength,
    /// Reading body bytes
    ReadingBody,
    /// Discarding the body of an oversized packet
    Skipping,
}

impl Default for PacketParser {
    fn default() -> Self {
        Self::new()
    }
}

impl PacketParser {
    /// Create a new packet parser
    pub fn new() -> Self {
        Self {
            state: ParseState::WaitingForHeader,
            header: 0,
            remaining: 0,
            multiplier: 1,
            length_bytes: 0,
            buffer: Vec::new(),
        }
    }

    /// Reset the parser state
    pub fn reset(&mut self) {
        self.state = ParseState::WaitingForHeader;
        self.header = 0;
        self.remaining = 0;
        self.multiplier = 1;
        self.length_bytes = 0;
        self.buffer.clear();
    }

    /// Feed a single byte to the parser
    ///
    /// Returns `Ok(Some(packet))` when a complete packet is decoded,
    /// `Ok(None)` when more bytes are needed, or `Err` when the packet is
    /// dropped. The parser is always ready for the next packet afterwards.
    pub fn feed(&mut self, byte: u8) -> Result<Option<Packet>, PacketError> {
        match self.state {
            ParseState::WaitingForHeader => {
                // Type 0 is reserved; treat as line noise
                if byte & 0xF0 != 0 {
                    self.header = byte;
                    self.state = ParseState::ReadingLength;
                }
                Ok(None)
            }
            ParseState::ReadingLength => {
                self.remaining += (byte & 0x7F) as usize * self.multiplier;
                self.length_bytes += 1;
                if byte & 0x80 != 0 {
                    if self.length_bytes >= 4 {
                        self.reset();
                        return Err(PacketError::MalformedLength);
                    }
                    self.multiplier *= 128;
                    return Ok(None);
                }

                if self.remaining > MAX_PACKET_SIZE {
                    self.state = ParseState::Skipping;
                    return Err(PacketError::PacketTooLarge);
                }
                if self.remaining == 0 {
                    let header = self.header;
                    self.reset();
                    return decode(header, &[]).map(Some);
                }
                self.buffer.clear();
                self.state = ParseState::ReadingBody;
                Ok(None)
            }
            ParseState::ReadingBody => {
                // Cannot overflow: remaining was bounded above
                let _ = self.buffer.push(byte);
                if self.buffer.len() < self.remaining {
                    return Ok(None);
                }
                let result = decode(self.header, &self.buffer);
                self.reset();
                result.map(Some)
            }
            ParseState::Skipping => {
                self.remaining -= 1;
                if self.remaining == 0 {
                    self.reset();
                }
                Ok(None)
            }
        }
    }

    /// Feed multiple bytes to the parser
    ///
    /// Returns the first complete packet found, if any.
    /// Remaining bytes after a complete packet are not consumed.
    pub fn feed_bytes(&mut self, bytes: &[u8]) -> Result<Option<Packet>, PacketError> {
        for &byte in bytes {
            if let Some(packet) = self.feed(byte)? {
                return Ok(Some(packet));
            }
        }
        Ok(None)
    }
}

fn decode(header: u8, body: &[u8]) -> Result<Packet, PacketError> {
    match header & 0xF0 {
        CONNACK => match body {
            [flags, code] => Ok(Packet::ConnAck {
                session_present: flags & 0x01 != 0,
                return_code: *code,
            }),
            _ => Err(PacketError::MalformedPacket),
        },
        PUBLISH => decode_publish(header, body),
        SUBACK => match body {
            [hi, lo, code, ..] => Ok(Packet::SubAck {
                packet_id: u16::from_be_bytes([*hi, *lo]),
                return_code: *code,
            }),
            _ => Err(PacketError::MalformedPacket),
        },
        PINGRESP => Ok(Packet::PingResp),
        _ => Ok(Packet::Other(header)),
    }
}

fn decode_publish(header: u8, body: &[u8]) -> Result<Packet, PacketError> {
    let qos = (header >> 1) & 0x03;
    if qos == 3 || body.len() < 2 {
        return Err(PacketError::MalformedPacket);
    }

    let topic_end = 2 + u16::from_be_bytes([body[0], body[1]]) as usize;
    let topic_bytes = body.get(2..topic_end).ok_or(PacketError::MalformedPacket)?;
    let topic = core::str::from_utf8(topic_bytes).map_err(|_| PacketError::MalformedPacket)?;

    let (packet_id, payload_start) = if qos > 0 {
        let id = body
            .get(topic_end..topic_end + 2)
            .ok_or(PacketError::MalformedPacket)?;
        (Some(u16::from_be_bytes([id[0], id[1]])), topic_end + 2)
    } else {
        (None, topic_end)
    };
    let payload = &body[payload_start..];

    if topic.len() > MAX_TOPIC_LEN {
        return Err(PacketError::TopicTooLong);
    }
    if payload.len() > MAX_MESSAGE_PAYLOAD {
        return Err(PacketError::PayloadTooLarge);
    }
    let message = Message::new(topic, payload).ok_or(PacketError::MalformedPacket)?;

    Ok(Packet::Publish {
        message,
        qos,
        packet_id,
    })
}
