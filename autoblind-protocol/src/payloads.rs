//! JSON payloads exchanged with Home Assistant
//!
//! Outbound documents are plain `Serialize` structs; field order matches
//! what Home Assistant's MQTT JSON light schema documents. Inbound commands
//! are read leniently: unknown keys are ignored and a non-numeric
//! brightness reads as zero.

use alloc::vec::Vec;

use serde::Serialize;
use serde_json::Value;

/// Payload errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PayloadError {
    /// Inbound bytes are not valid JSON
    Malformed,
    /// Outbound document could not be serialized
    Encode,
}

/// Light on/off state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerState {
    #[serde(rename = "ON")]
    On,
    #[serde(rename = "OFF")]
    Off,
}

/// State report published on the state topic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatePayload {
    pub state: PowerState,
    pub brightness: u8,
}

impl StatePayload {
    /// Serialize to JSON bytes
    pub fn to_json(&self) -> Result<Vec<u8>, PayloadError> {
        serde_json::to_vec(self).map_err(|_| PayloadError::Encode)
    }
}

/// Device registry entry nested in the discovery record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeviceDescriptor<'a> {
    pub identifiers: [&'a str; 1],
    pub name: &'a str,
    pub model: &'a str,
    pub sw_version: &'a str,
    pub manufacturer: &'a str,
}

/// Discovery record, published retained on `<base>/config`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Announcement<'a> {
    pub json_attributes_topic: &'a str,
    pub availability_topic: &'a str,
    pub name: &'a str,
    pub unique_id: &'a str,
    pub command_topic: &'a str,
    pub state_topic: &'a str,
    pub schema: &'a str,
    pub brightness: bool,
    pub ct: bool,
    pub xy: bool,
    pub device: DeviceDescriptor<'a>,
}

impl Announcement<'_> {
    /// Light schema we speak
    pub const SCHEMA: &'static str = "json";

    /// Serialize to JSON bytes
    pub fn to_json(&self) -> Result<Vec<u8>, PayloadError> {
        serde_json::to_vec(self).map_err(|_| PayloadError::Encode)
    }
}

/// Inbound command, as far as we care about it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CommandPayload {
    /// `state` when it is exactly `"ON"` or `"OFF"`
    pub state: Option<PowerState>,
    /// `brightness` when present and not null
    pub brightness: Option<i64>,
}

impl CommandPayload {
    /// Parse a command document
    pub fn parse(bytes: &[u8]) -> Result<Self, PayloadError> {
        let doc: Value = serde_json::from_slice(bytes).map_err(|_| PayloadError::Malformed)?;

        let state = match doc.get("state") {
            Some(Value::String(s)) if s == "OFF" => Some(PowerState::Off),
            Some(Value::String(s)) if s == "ON" => Some(PowerState::On),
            _ => None,
        };

        let brightness = match doc.get("brightness") {
            None | Some(Value::Null) => None,
            Some(Value::Number(n)) => Some(
                n.as_i64()
                    .or_else(|| n.as_f64().map(|f| f as i64))
                    .unwrap_or(0),
            ),
            Some(_) => Some(0),
        };

        Ok(Self { state, brightness })
    }
}
