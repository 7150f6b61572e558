//! Control task
//!
//! Drives the blind: encoder first, then the broker link, then at most one
//! inbound command per pass. Library outcomes are logged here.

use defmt::*;
use embassy_futures::yield_now;
use embassy_rp::gpio::Output;
use embassy_rp::uart::BufferedUart;
use embassy_time::Delay;

use autoblind_core::{Blind, CommandOutcome, LinkReport};
use autoblind_core::motion::MotorDriver;
use autoblind_drivers::indicator::StatusLed;
use autoblind_drivers::sensor::LadderEncoder;
use autoblind_drivers::stepper::Uln2003;
use autoblind_hal_rp2040::{AdcInput, BridgeUart, EmbassyClock};
use autoblind_protocol::MqttClient;

/// MQTT session over the bridge UART
pub type BridgeLink = MqttClient<BridgeUart<BufferedUart>, EmbassyClock>;

/// The blind as wired on this board
pub type BoardBlind = Blind<
    MotorDriver<Uln2003<Output<'static>>, Delay>,
    LadderEncoder<AdcInput<'static>, Delay>,
    BridgeLink,
    StatusLed<Output<'static>, Delay>,
    Delay,
>;

/// Control task - owns the blind and runs it forever
#[embassy_executor::task]
pub async fn control_task(mut blind: BoardBlind) {
    info!("Control task started");

    loop {
        match blind.service_encoder() {
            Ok(Some(report)) => debug!(
                "Encoder move {} -> {} ({} steps)",
                report.from, report.to, report.steps
            ),
            Ok(None) => {}
            Err(e) => warn!("Encoder sample failed: {:?}", e),
        }

        if let LinkReport::Reconnected { attempts } = blind.maintain_link() {
            info!(
                "Broker session up after {} attempt(s), position {}",
                attempts,
                blind.position()
            );
        }

        match blind.service_link() {
            Some(CommandOutcome::Moved { command, report }) => debug!(
                "Command {:?}: {} -> {} ({} steps)",
                command, report.from, report.to, report.steps
            ),
            Some(CommandOutcome::Refreshed) => debug!("State refreshed"),
            Some(CommandOutcome::Rejected(e)) => warn!("Bad payload: {:?}", e),
            Some(CommandOutcome::Ignored) => trace!("Message ignored"),
            None => {}
        }

        yield_now().await;
    }
}
