//! Autoblind - Window Blind Controller Firmware
//!
//! Main firmware binary for RP2040 boards driving a roller blind with a
//! 28BYJ-48 style stepper. The blind shows up in Home Assistant as a
//! dimmable light: brightness is how far the blind is open.

#![no_std]
#![no_main]

extern crate alloc;

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::adc::{Adc, Channel, Config as AdcConfig};
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Level, Output, Pull};
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart};
use embassy_time::Delay;
use embedded_alloc::LlffHeap as Heap;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use autoblind_core::config::{BlindConfig, PinConfig};
use autoblind_core::motion::MotorDriver;
use autoblind_core::Blind;
use autoblind_drivers::indicator::StatusLed;
use autoblind_drivers::sensor::LadderEncoder;
use autoblind_drivers::stepper::Uln2003;
use autoblind_hal_rp2040::{AdcInput, BridgeUart, EmbassyClock, PinBank, PinError};
use autoblind_protocol::MqttClient;

mod config;
mod tasks;

// Heap allocator for JSON payloads
#[global_allocator]
static HEAP: Heap = Heap::empty();

// Heap size: 32KB
const HEAP_SIZE: usize = 32 * 1024;

/// Embedded configuration (compiled into firmware)
/// Edit blind.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../blind.toml");

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 1024]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 1024]> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Autoblind firmware starting...");

    init_heap();

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let config = config::load(EMBEDDED_CONFIG);
    info!(
        "Device {} ({}), client id {}",
        config.device.name.as_str(),
        config.device.unique_id.as_str(),
        config.mqtt.client_id.as_str()
    );

    let (mut bank, rest) = PinBank::split(p);

    // Bridge UART, buffered so bytes arriving during a move are kept
    let mut uart_config = UartConfig::default();
    uart_config.baudrate = config.mqtt.baud;
    let tx_buf = TX_BUF.init([0u8; 1024]);
    let rx_buf = RX_BUF.init([0u8; 1024]);
    let uart = Uart::new_blocking(rest.uart0, rest.uart_tx, rest.uart_rx, uart_config);
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);
    info!("Bridge UART initialized at {} baud", config.mqtt.baud);

    // Encoder ladder on ADC0
    let adc = Adc::new_blocking(rest.adc, AdcConfig::default());
    let channel = Channel::new_pin(rest.adc_pin, Pull::None);
    let encoder =
        LadderEncoder::from_config(AdcInput::new(adc, channel), Delay, &config.encoder);
    info!("Encoder ADC initialized");

    // Coil and LED outputs come from the config
    let coils = config.stepper.coils;
    // Validated by config::load: no overlaps, nothing reserved
    let (coil_pins, led_pin) = unwrap!(take_outputs(&mut bank, &config));

    let stage = Uln2003::from_config(coil_pins, &coils);
    let motor = MotorDriver::new(stage, Delay, config.stepper.step_delay_us);
    let led = StatusLed::new(led_pin, Delay, config.led.pin.inverted);
    info!(
        "Stepper on gpio{}/{}/{}/{}, {} us per step",
        coils.blue.pin,
        coils.pink.pin,
        coils.yellow.pin,
        coils.orange.pin,
        config.stepper.step_delay_us
    );

    let link = MqttClient::new(BridgeUart::new(uart), EmbassyClock, config.mqtt.session());

    let blind = Blind::new(motor, encoder, link, led, Delay, config);

    spawner.spawn(tasks::control_task(blind)).unwrap();

    info!("Control task spawned, firmware running");

    // Main task has nothing else to do
    loop {
        embassy_time::Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
    }
}

/// Take the four coil outputs and the LED output
fn take_outputs(
    bank: &mut PinBank,
    config: &BlindConfig,
) -> Result<([Output<'static>; 4], Output<'static>), PinError> {
    let [blue, pink, yellow, orange] = config.stepper.coils.as_array();
    let coils = [
        take_output(bank, blue)?,
        take_output(bank, pink)?,
        take_output(bank, yellow)?,
        take_output(bank, orange)?,
    ];
    let led = take_output(bank, config.led.pin)?;
    Ok((coils, led))
}

/// Take a pin and make it an output at its inactive level
fn take_output(bank: &mut PinBank, pin: PinConfig) -> Result<Output<'static>, PinError> {
    let idle = if pin.inverted { Level::High } else { Level::Low };
    Ok(Output::new(bank.take(pin.pin)?, idle))
}

/// Initialize the heap allocator
fn init_heap() {
    use core::mem::MaybeUninit;
    static mut HEAP_MEM: [MaybeUninit<u8>; HEAP_SIZE] = [MaybeUninit::uninit(); HEAP_SIZE];
    #[allow(static_mut_refs)]
    unsafe {
        HEAP.init(HEAP_MEM.as_ptr() as usize, HEAP_SIZE)
    }
}
