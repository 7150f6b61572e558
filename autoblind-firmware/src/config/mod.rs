//! Configuration loading and parsing
//!
//! The configuration is blind.toml, embedded at build time and parsed at
//! boot by a custom no_std parser. A file that parses but cannot be wired
//! on this board is rejected as a whole.

pub mod toml;

use autoblind_core::config::BlindConfig;
use autoblind_hal_rp2040::pins::{ENCODER_ADC_PIN, UART_RX_PIN, UART_TX_PIN};
use autoblind_hal_rp2040::uart::{uart_for_pins, UartId};

pub use self::toml::{parse_config, ParseError};

/// Why a configuration was not used
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// File did not parse
    Parse(ParseError),
    /// Two outputs share a GPIO
    DuplicatePin(u8),
    /// Output assigned to the bridge UART or encoder input
    ReservedPin(u8),
    /// Bridge must sit on UART0 at GPIO0/GPIO1
    UartPins,
    /// Encoder must sit on ADC0 at GPIO26
    AdcPin,
    /// Zero readings per sample
    NoSamples,
}

impl From<ParseError> for ConfigError {
    fn from(e: ParseError) -> Self {
        ConfigError::Parse(e)
    }
}

/// Check that a configuration can be wired on this board
pub fn validate(config: &BlindConfig) -> Result<(), ConfigError> {
    let mqtt = &config.mqtt;
    if uart_for_pins(mqtt.uart_tx_pin, mqtt.uart_rx_pin) != Some(UartId::Uart0)
        || mqtt.uart_tx_pin != UART_TX_PIN
        || mqtt.uart_rx_pin != UART_RX_PIN
    {
        return Err(ConfigError::UartPins);
    }
    if config.encoder.adc_pin != ENCODER_ADC_PIN {
        return Err(ConfigError::AdcPin);
    }
    if config.encoder.samples == 0 {
        return Err(ConfigError::NoSamples);
    }

    let coils = config.stepper.coils.as_array();
    let outputs = [
        coils[0].pin,
        coils[1].pin,
        coils[2].pin,
        coils[3].pin,
        config.led.pin.pin,
    ];
    for (i, &pin) in outputs.iter().enumerate() {
        if matches!(pin, UART_TX_PIN | UART_RX_PIN | ENCODER_ADC_PIN) {
            return Err(ConfigError::ReservedPin(pin));
        }
        if outputs[i + 1..].contains(&pin) {
            return Err(ConfigError::DuplicatePin(pin));
        }
    }
    Ok(())
}

/// Parse and validate, falling back to the built-in defaults
pub fn load(source: &str) -> BlindConfig {
    let parsed = parse_config(source)
        .map_err(ConfigError::from)
        .and_then(|config| validate(&config).map(|()| config));

    match parsed {
        Ok(config) => {
            defmt::info!("Parsed embedded configuration successfully");
            config
        }
        Err(e) => {
            defmt::error!("Rejected embedded config: {:?}", e);
            defmt::error!("Using built-in defaults");
            BlindConfig::default()
        }
    }
}
