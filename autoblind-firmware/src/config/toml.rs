//! Simple TOML parser for the blind configuration
//!
//! This is a minimal TOML parser that handles only the subset needed for
//! blind.toml. It does NOT support full TOML.
//!
//! Supported features:
//! - Key = value pairs (string, integer, boolean)
//! - [section] headers
//! - Comments (# ...), including trailing ones
//!
//! Keys not listed here are ignored so older firmware accepts newer files.

use heapless::String as HString;

use autoblind_core::config::{BlindConfig, PinConfig};

/// Parse error
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Unknown or malformed section header
    InvalidSection,
    /// Invalid value type
    InvalidValue,
    /// String longer than its field
    TooLong,
    /// Invalid pin string
    InvalidPin,
}

/// Current parsing context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Device,
    Mqtt,
    Stepper,
    Encoder,
    Led,
}

/// Parse TOML configuration into BlindConfig
///
/// Anything not mentioned keeps its default.
pub fn parse_config(input: &str) -> Result<BlindConfig, ParseError> {
    let mut config = BlindConfig::default();
    let mut section = Section::Root;

    for line in input.lines() {
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with('[') && line.ends_with(']') {
            section = parse_section_header(&line[1..line.len() - 1])?;
            continue;
        }

        if let Some((key, value)) = parse_key_value(line) {
            apply_value(section, key, value, &mut config)?;
        }
    }

    Ok(config)
}

fn parse_section_header(header: &str) -> Result<Section, ParseError> {
    match header.trim() {
        "device" => Ok(Section::Device),
        "mqtt" => Ok(Section::Mqtt),
        "stepper" => Ok(Section::Stepper),
        "encoder" => Ok(Section::Encoder),
        "led" => Ok(Section::Led),
        _ => Err(ParseError::InvalidSection),
    }
}

/// Parse key = value line
fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let eq_pos = line.find('=')?;
    let key = line[..eq_pos].trim();
    let value = line[eq_pos + 1..].trim();

    // Remove inline comments
    let value = if let Some(hash_pos) = value.find('#') {
        // Make sure # is not inside a string
        let quote_count = value[..hash_pos].matches('"').count();
        if quote_count % 2 == 0 {
            value[..hash_pos].trim()
        } else {
            value
        }
    } else {
        value
    };

    if key.is_empty() || value.is_empty() {
        return None;
    }

    Some((key, value))
}

/// Parse quoted string value
fn parse_string(value: &str) -> Result<&str, ParseError> {
    if value.starts_with('"') && value.ends_with('"') && value.len() >= 2 {
        Ok(&value[1..value.len() - 1])
    } else {
        // Allow unquoted strings for simple values
        Ok(value)
    }
}

/// Parse a string into a fixed-capacity field
fn parse_text<const N: usize>(value: &str) -> Result<HString<N>, ParseError> {
    HString::try_from(parse_string(value)?).map_err(|_| ParseError::TooLong)
}

/// Parse integer value
fn parse_int<T: core::str::FromStr>(value: &str) -> Result<T, ParseError> {
    value.parse().map_err(|_| ParseError::InvalidValue)
}

/// Parse boolean value
fn parse_bool(value: &str) -> Result<bool, ParseError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ParseError::InvalidValue),
    }
}

/// Parse pin specification like "gpio11" or "!gpio25"
fn parse_pin(value: &str) -> Result<PinConfig, ParseError> {
    let value = parse_string(value)?;
    let (inverted, s) = match value.strip_prefix('!') {
        Some(rest) => (true, rest),
        None => (false, value),
    };

    let num = s.strip_prefix("gpio").ok_or(ParseError::InvalidPin)?;
    let pin: u8 = num.parse().map_err(|_| ParseError::InvalidPin)?;
    if pin >= 30 {
        return Err(ParseError::InvalidPin);
    }

    Ok(PinConfig { pin, inverted })
}

/// Apply a key-value pair to the current section
fn apply_value(
    section: Section,
    key: &str,
    value: &str,
    config: &mut BlindConfig,
) -> Result<(), ParseError> {
    match section {
        Section::Device => {
            let d = &mut config.device;
            match key {
                "entity_name" => d.entity_name = parse_text(value)?,
                "name" => d.name = parse_text(value)?,
                "unique_id" => d.unique_id = parse_text(value)?,
                "model" => d.model = parse_text(value)?,
                "manufacturer" => d.manufacturer = parse_text(value)?,
                "sw_version" => d.sw_version = parse_text(value)?,
                _ => {}
            }
        }
        Section::Mqtt => {
            let m = &mut config.mqtt;
            match key {
                "client_id" => m.client_id = parse_text(value)?,
                "discovery_topic" => m.discovery_topic = parse_text(value)?,
                "state_topic" => m.state_topic = parse_text(value)?,
                "command_topic" => m.command_topic = parse_text(value)?,
                "keep_alive_s" => m.keep_alive_s = parse_int(value)?,
                "retry_ms" => m.retry_ms = parse_int(value)?,
                "connect_timeout_ms" => m.connect_timeout_ms = parse_int(value)?,
                "uart_tx_pin" | "tx_pin" => m.uart_tx_pin = parse_pin(value)?.pin,
                "uart_rx_pin" | "rx_pin" => m.uart_rx_pin = parse_pin(value)?.pin,
                "baud" | "baud_rate" => m.baud = parse_int(value)?,
                _ => {}
            }
        }
        Section::Stepper => {
            let s = &mut config.stepper;
            match key {
                "blue_pin" => s.coils.blue = parse_pin(value)?,
                "pink_pin" => s.coils.pink = parse_pin(value)?,
                "yellow_pin" => s.coils.yellow = parse_pin(value)?,
                "orange_pin" => s.coils.orange = parse_pin(value)?,
                "step_delay_us" => s.step_delay_us = parse_int(value)?,
                _ => {}
            }
        }
        Section::Encoder => {
            let e = &mut config.encoder;
            match key {
                "adc_pin" => e.adc_pin = parse_pin(value)?.pin,
                "samples" => e.samples = parse_int(value)?,
                "settle_ms" => e.settle_ms = parse_int(value)?,
                "wrap_threshold" => e.wrap_threshold = parse_int(value)?,
                "tick_threshold" => e.tick_threshold = parse_int(value)?,
                "jump_steps" => e.jump_steps = parse_int(value)?,
                "level_shift" => e.level_shift = parse_int(value)?,
                _ => {}
            }
        }
        Section::Led => match key {
            "pin" => {
                // Keep an explicit `inverted` that came first
                let pin = parse_pin(value)?;
                config.led.pin.pin = pin.pin;
                config.led.pin.inverted |= pin.inverted;
            }
            "inverted" => config.led.pin.inverted = parse_bool(value)?,
            _ => {}
        },
        Section::Root => {}
    }

    Ok(())
}
