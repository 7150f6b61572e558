//! Configuration type definitions
//!
//! Defaults match the first prototype: Home Assistant discovery under
//! `homeassistant/light/autoblind`, 2 ms per step, a resistor-ladder
//! encoder tuned for a 10-bit converter.

use heapless::String;

use autoblind_protocol::SessionConfig;

use super::hardware::{CoilPins, PinConfig};

/// Maximum length for names shown in Home Assistant
pub const MAX_NAME_LEN: usize = 64;

/// Maximum length for short identifiers (client id, versions)
pub const MAX_ID_LEN: usize = 40;

/// Maximum topic length (matches the inbound message limit)
pub const MAX_TOPIC_LEN: usize = autoblind_protocol::MAX_TOPIC_LEN;

/// Suffix appended to the discovery topic for the retained record
pub const ANNOUNCE_SUFFIX: &str = "/config";

/// Topic plus [`ANNOUNCE_SUFFIX`]
pub type AnnounceTopic = String<{ MAX_TOPIC_LEN + 8 }>;

fn text<const N: usize>(s: &str) -> String<N> {
    let mut out = String::new();
    let _ = out.push_str(s);
    out
}

/// Device identity advertised in the discovery record
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceConfig {
    /// Entity name
    pub entity_name: String<MAX_ID_LEN>,
    /// Device registry name
    pub name: String<MAX_NAME_LEN>,
    /// Stable unique id, also the device identifier
    pub unique_id: String<MAX_ID_LEN>,
    pub model: String<MAX_NAME_LEN>,
    pub manufacturer: String<MAX_NAME_LEN>,
    pub sw_version: String<MAX_ID_LEN>,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            entity_name: text("autoblind"),
            name: text("Autoblind"),
            unique_id: text("c16af742-4724-11eb-b378-0242ac130002"),
            model: text("Autoblind Mk 1"),
            manufacturer: text("Strickland Electronics and Electronics Accessories"),
            sw_version: text("0.1a"),
        }
    }
}

/// Broker session and topics
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MqttConfig {
    pub client_id: String<MAX_ID_LEN>,
    /// Discovery base; also the json attributes topic
    pub discovery_topic: String<MAX_TOPIC_LEN>,
    /// State reports; also the availability topic
    pub state_topic: String<MAX_TOPIC_LEN>,
    pub command_topic: String<MAX_TOPIC_LEN>,
    pub keep_alive_s: u16,
    /// Pause before each connection attempt
    pub retry_ms: u32,
    /// CONNACK/SUBACK/PINGRESP deadline
    pub connect_timeout_ms: u32,
    /// Bridge UART pins
    pub uart_tx_pin: u8,
    pub uart_rx_pin: u8,
    pub baud: u32,
}

impl MqttConfig {
    /// Topic the retained discovery record goes to
    pub fn announcement_topic(&self) -> AnnounceTopic {
        let mut topic = AnnounceTopic::new();
        let _ = topic.push_str(&self.discovery_topic);
        let _ = topic.push_str(ANNOUNCE_SUFFIX);
        topic
    }

    /// Session parameters for the MQTT client
    pub fn session(&self) -> SessionConfig {
        SessionConfig {
            keep_alive_s: self.keep_alive_s,
            ack_timeout_ms: self.connect_timeout_ms,
        }
    }
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            client_id: text("autoblind"),
            discovery_topic: text("homeassistant/light/autoblind"),
            state_topic: text("homeassistant/autoblind/state"),
            command_topic: text("homeassistant/autoblind/set"),
            keep_alive_s: 120,
            retry_ms: 100,
            connect_timeout_ms: 5000,
            uart_tx_pin: 0,
            uart_rx_pin: 1,
            baud: 115200,
        }
    }
}

/// Stepper wiring and timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StepperConfig {
    pub coils: CoilPins,
    /// Settle time after each step
    pub step_delay_us: u32,
}

impl Default for StepperConfig {
    fn default() -> Self {
        Self {
            coils: CoilPins::default(),
            step_delay_us: 2000,
        }
    }
}

/// Resistor-ladder encoder sampling and thresholds
///
/// Thresholds are in 10-bit counts, after `level_shift`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EncoderConfig {
    pub adc_pin: u8,
    /// Readings averaged per sample
    pub samples: u8,
    /// Wait before sampling (RC filter charge time)
    pub settle_ms: u32,
    /// A jump this large is the ladder wrapping around
    pub wrap_threshold: i32,
    /// A change this large is one detent
    pub tick_threshold: i32,
    /// Steps moved per detent
    pub jump_steps: i32,
    /// Right shift bringing raw counts to 10 bits
    pub level_shift: u8,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            adc_pin: 26,
            samples: 10,
            settle_ms: 50,
            wrap_threshold: 500,
            tick_threshold: 100,
            jump_steps: 1024,
            level_shift: 2,
        }
    }
}

/// Status LED
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LedConfig {
    pub pin: PinConfig,
}

impl Default for LedConfig {
    fn default() -> Self {
        Self {
            pin: PinConfig::new(25),
        }
    }
}

/// Complete controller configuration
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BlindConfig {
    pub device: DeviceConfig,
    pub mqtt: MqttConfig,
    pub stepper: StepperConfig,
    pub encoder: EncoderConfig,
    pub led: LedConfig,
}
