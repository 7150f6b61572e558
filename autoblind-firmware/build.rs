//! Build script for autoblind-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates blind.toml at compile time

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

fn main() {
    setup_linker();
    validate_config();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tlink-rp.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");

    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate blind.toml at compile time
fn validate_config() {
    println!("cargo:rerun-if-changed=blind.toml");

    let config_path = Path::new("blind.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: blind.toml not found!                                    ║\n\
            ║                                                                  ║\n\
            ║  The firmware embeds blind.toml as its configuration.            ║\n\
            ║  Please create one in the autoblind-firmware directory.          ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read blind.toml                                ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in blind.toml                        ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                {}\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    let mut errors = Vec::new();
    validate_sections(&config, &mut errors);
    validate_device(&config, &mut errors);
    validate_mqtt(&config, &mut errors);
    validate_pins(&config, &mut errors);
    validate_encoder(&config, &mut errors);

    if !errors.is_empty() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Invalid configuration in blind.toml                      ║\n\
            ╠══════════════════════════════════════════════════════════════════╣\n\
            {}\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            errors
                .iter()
                .map(|e| format!("║  • {:<62} ║", e))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }

    println!("cargo:warning=blind.toml validated successfully");
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

const SECTIONS: [&str; 5] = ["device", "mqtt", "stepper", "encoder", "led"];

/// Only known sections, each a table
fn validate_sections(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(root) = config.as_table() else {
        errors.push("top level must be a table".to_string());
        return;
    };
    for (name, value) in root {
        if !SECTIONS.contains(&name.as_str()) {
            errors.push(format!("unknown section [{}]", name));
        } else if !value.is_table() {
            errors.push(format!("[{}] must be a table", name));
        }
    }
}

fn check_len(
    config: &toml::Value,
    section: &str,
    key: &str,
    max: usize,
    errors: &mut Vec<String>,
) {
    if let Some(value) = config.get(section).and_then(|s| s.get(key)) {
        match value.as_str() {
            Some(s) if s.len() > max => {
                errors.push(format!("[{}] {} longer than {} bytes", section, key, max))
            }
            Some(_) => {}
            None => errors.push(format!("[{}] {} must be a string", section, key)),
        }
    }
}

fn check_range(
    config: &toml::Value,
    section: &str,
    key: &str,
    range: std::ops::RangeInclusive<i64>,
    errors: &mut Vec<String>,
) {
    if let Some(value) = config.get(section).and_then(|s| s.get(key)) {
        match value.as_integer() {
            Some(n) if !range.contains(&n) => errors.push(format!(
                "[{}] {} must be {}-{}",
                section,
                key,
                range.start(),
                range.end()
            )),
            Some(_) => {}
            None => errors.push(format!("[{}] {} must be an integer", section, key)),
        }
    }
}

fn validate_device(config: &toml::Value, errors: &mut Vec<String>) {
    for key in ["entity_name", "unique_id", "sw_version"] {
        check_len(config, "device", key, 40, errors);
    }
    for key in ["name", "model", "manufacturer"] {
        check_len(config, "device", key, 64, errors);
    }
}

fn validate_mqtt(config: &toml::Value, errors: &mut Vec<String>) {
    check_len(config, "mqtt", "client_id", 23, errors);
    for key in ["discovery_topic", "state_topic", "command_topic"] {
        check_len(config, "mqtt", key, 64, errors);
    }
    check_range(config, "mqtt", "keep_alive_s", 0..=65535, errors);
    check_range(config, "mqtt", "retry_ms", 0..=60_000, errors);
    check_range(config, "mqtt", "connect_timeout_ms", 1..=60_000, errors);
    check_range(config, "mqtt", "baud", 1200..=921_600, errors);

    let topic = |key: &str| {
        config
            .get("mqtt")
            .and_then(|m| m.get(key))
            .and_then(|v| v.as_str())
    };
    if let (Some(state), Some(command)) = (topic("state_topic"), topic("command_topic")) {
        if state == command {
            errors.push("[mqtt] state_topic and command_topic must differ".to_string());
        }
    }
}

/// Parse "gpioNN" / "!gpioNN"
fn pin_number(value: &toml::Value) -> Option<u8> {
    let s = value.as_str()?;
    let s = s.strip_prefix('!').unwrap_or(s);
    let n: u8 = s.strip_prefix("gpio")?.parse().ok()?;
    (n < 30).then_some(n)
}

fn validate_pins(config: &toml::Value, errors: &mut Vec<String>) {
    let pin_keys = [
        ("mqtt", "uart_tx_pin"),
        ("mqtt", "uart_rx_pin"),
        ("stepper", "blue_pin"),
        ("stepper", "pink_pin"),
        ("stepper", "yellow_pin"),
        ("stepper", "orange_pin"),
        ("encoder", "adc_pin"),
        ("led", "pin"),
    ];

    let mut used: Vec<(u8, String)> = Vec::new();
    for (section, key) in pin_keys {
        let Some(value) = config.get(section).and_then(|s| s.get(key)) else {
            continue;
        };
        let Some(pin) = pin_number(value) else {
            errors.push(format!("[{}] {} must be \"gpio0\"-\"gpio29\"", section, key));
            continue;
        };
        let name = format!("[{}] {}", section, key);
        if let Some((_, other)) = used.iter().find(|(p, _)| *p == pin) {
            errors.push(format!("{} reuses gpio{} from {}", name, pin, other));
        }
        used.push((pin, name));
    }

    let get = |section: &str, key: &str| config.get(section).and_then(|s| s.get(key));
    if let Some(pin) = get("mqtt", "uart_tx_pin").and_then(pin_number) {
        if pin != 0 {
            errors.push("[mqtt] uart_tx_pin must be gpio0 (UART0)".to_string());
        }
    }
    if let Some(pin) = get("mqtt", "uart_rx_pin").and_then(pin_number) {
        if pin != 1 {
            errors.push("[mqtt] uart_rx_pin must be gpio1 (UART0)".to_string());
        }
    }
    if let Some(pin) = get("encoder", "adc_pin").and_then(pin_number) {
        if pin != 26 {
            errors.push("[encoder] adc_pin must be gpio26 (ADC0)".to_string());
        }
    }
}

fn validate_encoder(config: &toml::Value, errors: &mut Vec<String>) {
    check_range(config, "encoder", "samples", 1..=255, errors);
    check_range(config, "encoder", "settle_ms", 0..=1000, errors);
    check_range(config, "encoder", "wrap_threshold", 1..=1023, errors);
    check_range(config, "encoder", "tick_threshold", 1..=1023, errors);
    check_range(config, "encoder", "jump_steps", 1..=100_000, errors);
    check_range(config, "encoder", "level_shift", 0..=15, errors);

    let int = |key: &str| {
        config
            .get("encoder")
            .and_then(|e| e.get(key))
            .and_then(|v| v.as_integer())
    };
    if let (Some(wrap), Some(tick)) = (int("wrap_threshold"), int("tick_threshold")) {
        if tick >= wrap {
            errors.push("[encoder] tick_threshold must be below wrap_threshold".to_string());
        }
    }
}
