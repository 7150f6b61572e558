//! Blind controller
//!
//! Owns the motor, the encoder sampler, the broker link and the status LED,
//! and runs one cooperative control loop over them:
//!
//! ```text
//! loop {
//!     service_encoder()   // manual knob -> 1024-step jumps
//!     maintain_link()     // reconnect + resubscribe + announce if needed
//!     service_link()      // at most one inbound command
//! }
//! ```
//!
//! Moves block the loop; nothing else runs until the coils are released.
//! Every completed move is followed by a state report.

use embedded_hal::delay::DelayNs;

use autoblind_protocol::{BrokerLink, CommandPayload, Message, PayloadError};

use crate::command::RemoteCommand;
use crate::config::BlindConfig;
use crate::encoder::EncoderDecoder;
use crate::motion::{MotionIntent, MoveReport};
use crate::state::{announcement, state_payload, ConnectionSupervisor, LinkEvent, LinkState};
use crate::traits::{Indicator, LevelSensor, PositionStepper, SensorError};

/// Result of handling one inbound message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandOutcome {
    /// A command moved the motor
    Moved {
        command: RemoteCommand,
        report: MoveReport,
    },
    /// A command asked for nothing but a state report
    Refreshed,
    /// Payload did not parse; nothing published
    Rejected(PayloadError),
    /// Message on a topic we do not act on
    Ignored,
}

/// Result of a link check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkReport {
    /// Already connected; nothing sent
    Steady,
    /// A new session was established
    Reconnected {
        /// Connection attempts it took, including the successful one
        attempts: u32,
    },
}

#[derive(Debug)]
enum PublishError<E> {
    Encode(PayloadError),
    Link(E),
}

/// The window blind controller
pub struct Blind<M, S, L, I, D> {
    motor: M,
    sensor: S,
    link: L,
    indicator: I,
    delay: D,
    encoder: EncoderDecoder,
    supervisor: ConnectionSupervisor,
    config: BlindConfig,
}

impl<M, S, L, I, D> Blind<M, S, L, I, D>
where
    M: PositionStepper,
    S: LevelSensor,
    L: BrokerLink,
    I: Indicator,
    D: DelayNs,
{
    /// Assemble a controller
    ///
    /// Takes the boot encoder reference. A failed sample leaves the
    /// reference to the first successful poll.
    pub fn new(
        motor: M,
        mut sensor: S,
        link: L,
        indicator: I,
        delay: D,
        config: BlindConfig,
    ) -> Self {
        let mut encoder = EncoderDecoder::new(&config.encoder);
        if encoder.rebaseline(&mut sensor).is_err() {
            encoder.reset();
        }
        Self {
            motor,
            sensor,
            link,
            indicator,
            delay,
            encoder,
            supervisor: ConnectionSupervisor::new(),
            config,
        }
    }

    /// Current motor position in steps
    pub fn position(&self) -> u32 {
        self.motor.position()
    }

    /// Connection state as last established
    pub fn link_state(&self) -> LinkState {
        self.supervisor.state()
    }

    /// Connection counters
    pub fn supervisor(&self) -> &ConnectionSupervisor {
        &self.supervisor
    }

    /// Configuration in use
    pub fn config(&self) -> &BlindConfig {
        &self.config
    }

    /// Borrow the broker link
    pub fn link(&self) -> &L {
        &self.link
    }

    /// Borrow the motor
    pub fn motor(&self) -> &M {
        &self.motor
    }

    /// Sample the encoder and act on a detected rotation
    ///
    /// A move is reported and the reference is retaken afterwards.
    pub fn service_encoder(&mut self) -> Result<Option<MoveReport>, SensorError> {
        let position = self.motor.position();
        match self.encoder.poll(&mut self.sensor, position)? {
            MotionIntent::NoOp => Ok(None),
            MotionIntent::MoveTo(target) => {
                let report = self.motor.move_to(target);
                self.publish_state();
                self.retake_reference();
                Ok(Some(report))
            }
        }
    }

    /// Make sure a session is up, reconnecting until one is
    ///
    /// Each attempt waits `retry_ms` first. Blocks until connected.
    pub fn maintain_link(&mut self) -> LinkReport {
        if !self.supervisor.needs_connect(self.link.is_connected()) {
            return LinkReport::Steady;
        }

        let mut attempts = 0u32;
        loop {
            self.delay.delay_ms(self.config.mqtt.retry_ms);
            attempts = attempts.saturating_add(1);
            match self.establish() {
                Ok(()) => {
                    self.supervisor.record(LinkEvent::ConnectSucceeded);
                    return LinkReport::Reconnected { attempts };
                }
                Err(_) => {
                    self.supervisor.record(LinkEvent::ConnectFailed);
                }
            }
        }
    }

    /// Handle at most one inbound message
    ///
    /// Returns `None` when nothing arrived or the link errored; the next
    /// [`Self::maintain_link`] deals with a dead link.
    pub fn service_link(&mut self) -> Option<CommandOutcome> {
        match self.link.poll() {
            Ok(Some(message)) => Some(self.dispatch(&message)),
            Ok(None) | Err(_) => None,
        }
    }

    /// Act on a command document
    ///
    /// A move retakes the encoder reference like a local one.
    pub fn handle_command(&mut self, payload: &[u8]) -> CommandOutcome {
        let command = match RemoteCommand::interpret(payload) {
            Ok(command) => command,
            Err(e) => return CommandOutcome::Rejected(e),
        };

        if command.echoes_before_move() {
            self.publish_state();
        }

        match command.intent() {
            MotionIntent::MoveTo(target) => {
                let report = self.motor.move_to(target);
                self.publish_state();
                self.retake_reference();
                CommandOutcome::Moved { command, report }
            }
            MotionIntent::NoOp => {
                self.publish_state();
                CommandOutcome::Refreshed
            }
        }
    }

    /// Report the current state, reconnecting if the link is down
    ///
    /// A reconnect already reports state as part of establishment, so the
    /// report is not repeated afterwards.
    pub fn publish_state(&mut self) {
        if self.supervisor.state().is_connected() && self.link.is_connected() {
            match self.emit_state() {
                Ok(()) | Err(PublishError::Encode(_)) => return,
                Err(PublishError::Link(_)) => {
                    self.supervisor.record(LinkEvent::Dropped);
                }
            }
        }
        self.maintain_link();
    }

    /// Re-send the retained discovery record
    ///
    /// Normally only sent on establishment; a reconnect covers it too.
    pub fn publish_announcement(&mut self) {
        if self.supervisor.state().is_connected() && self.link.is_connected() {
            match self.emit_announcement() {
                Ok(()) | Err(PublishError::Encode(_)) => return,
                Err(PublishError::Link(_)) => {
                    self.supervisor.record(LinkEvent::Dropped);
                }
            }
        }
        self.maintain_link();
    }

    /// New encoder reference after a move; a failed sample clears it
    fn retake_reference(&mut self) {
        if self.encoder.rebaseline(&mut self.sensor).is_err() {
            self.encoder.reset();
        }
    }

    fn dispatch(&mut self, message: &Message) -> CommandOutcome {
        let topic = message.topic.as_str();
        if topic == self.config.mqtt.command_topic.as_str() {
            self.handle_command(&message.payload)
        } else if topic == self.config.mqtt.state_topic.as_str() {
            // Our own reports echo back; only parse failures are worth noting
            match CommandPayload::parse(&message.payload) {
                Ok(_) => CommandOutcome::Ignored,
                Err(e) => CommandOutcome::Rejected(e),
            }
        } else {
            CommandOutcome::Ignored
        }
    }

    /// Session, subscriptions, announcement, state, blink
    fn establish(&mut self) -> Result<(), PublishError<L::Error>> {
        let mqtt = &self.config.mqtt;
        self.link.connect(&mqtt.client_id).map_err(PublishError::Link)?;
        self.link.subscribe(&mqtt.state_topic).map_err(PublishError::Link)?;
        self.link.subscribe(&mqtt.command_topic).map_err(PublishError::Link)?;

        self.emit_announcement()?;
        self.emit_state()?;
        self.indicator.blink();
        Ok(())
    }

    fn emit_announcement(&mut self) -> Result<(), PublishError<L::Error>> {
        let record = announcement(&self.config)
            .to_json()
            .map_err(PublishError::Encode)?;
        self.link
            .publish(&self.config.mqtt.announcement_topic(), &record, true)
            .map_err(PublishError::Link)
    }

    fn emit_state(&mut self) -> Result<(), PublishError<L::Error>> {
        let payload = state_payload(self.motor.position())
            .to_json()
            .map_err(PublishError::Encode)?;
        self.link
            .publish(&self.config.mqtt.state_topic, &payload, false)
            .map_err(PublishError::Link)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::{CoilPattern, MotorDriver};
    use crate::traits::CoilDriver;
    use std::collections::VecDeque;
    use std::string::{String, ToString};
    use std::vec::Vec;

    const STATE: &str = "homeassistant/autoblind/state";
    const COMMAND: &str = "homeassistant/autoblind/set";
    const ANNOUNCE: &str = "homeassistant/light/autoblind/config";

    struct NullCoils;

    impl CoilDriver for NullCoils {
        fn energize(&mut self, _pattern: CoilPattern) {}
    }

    struct NoDelay;

    impl DelayNs for NoDelay {
        fn delay_ns(&mut self, _ns: u32) {}
    }

    struct ScriptedSensor(VecDeque<Result<u16, SensorError>>);

    impl LevelSensor for ScriptedSensor {
        fn sample(&mut self) -> Result<u16, SensorError> {
            self.0
                .pop_front()
                .unwrap_or(Err(SensorError::ConversionError))
        }
    }

    #[derive(Default)]
    struct CountingLed {
        blinks: u32,
    }

    impl Indicator for CountingLed {
        fn blink(&mut self) {
            self.blinks += 1;
        }
    }

    #[derive(Default)]
    struct MockLink {
        connected: bool,
        connect_failures: u32,
        connects: u32,
        subscriptions: Vec<String>,
        published: Vec<(String, Vec<u8>, bool)>,
        inbox: VecDeque<Message>,
    }

    impl MockLink {
        fn states(&self) -> Vec<&[u8]> {
            self.published
                .iter()
                .filter(|(topic, _, _)| topic == STATE)
                .map(|(_, payload, _)| payload.as_slice())
                .collect()
        }

        fn announcements(&self) -> usize {
            self.published
                .iter()
                .filter(|(topic, _, _)| topic == ANNOUNCE)
                .count()
        }
    }

    impl BrokerLink for MockLink {
        type Error = ();

        fn connect(&mut self, _client_id: &str) -> Result<(), ()> {
            self.connects += 1;
            if self.connect_failures > 0 {
                self.connect_failures -= 1;
                self.connected = false;
                return Err(());
            }
            self.connected = true;
            Ok(())
        }

        fn is_connected(&self) -> bool {
            self.connected
        }

        fn subscribe(&mut self, topic: &str) -> Result<(), ()> {
            if !self.connected {
                return Err(());
            }
            self.subscriptions.push(topic.to_string());
            Ok(())
        }

        fn publish(&mut self, topic: &str, payload: &[u8], retain: bool) -> Result<(), ()> {
            if !self.connected {
                return Err(());
            }
            self.published
                .push((topic.to_string(), payload.to_vec(), retain));
            Ok(())
        }

        fn poll(&mut self) -> Result<Option<Message>, ()> {
            Ok(self.inbox.pop_front())
        }
    }

    type TestBlind =
        Blind<MotorDriver<NullCoils, NoDelay>, ScriptedSensor, MockLink, CountingLed, NoDelay>;

    fn blind(samples: &[u16]) -> TestBlind {
        scripted(samples.iter().map(|&level| Ok(level)).collect())
    }

    fn scripted(script: VecDeque<Result<u16, SensorError>>) -> TestBlind {
        Blind::new(
            MotorDriver::new(NullCoils, NoDelay, 0),
            ScriptedSensor(script),
            MockLink::default(),
            CountingLed::default(),
            NoDelay,
            BlindConfig::default(),
        )
    }

    /// Connected, with the establishment traffic cleared
    fn connected(samples: &[u16]) -> TestBlind {
        settle(blind(samples))
    }

    fn settle(mut b: TestBlind) -> TestBlind {
        assert_eq!(b.maintain_link(), LinkReport::Reconnected { attempts: 1 });
        b.link.published.clear();
        b.link.subscriptions.clear();
        b.indicator.blinks = 0;
        b
    }

    #[test]
    fn test_off_publishes_once() {
        let mut b = connected(&[]);
        b.handle_command(br#"{"brightness":20}"#);
        b.link.published.clear();

        let outcome = b.handle_command(br#"{"state":"OFF"}"#);
        assert_eq!(
            outcome,
            CommandOutcome::Moved {
                command: RemoteCommand::Park,
                report: MoveReport {
                    from: 640,
                    to: 0,
                    steps: 640
                }
            }
        );
        assert_eq!(b.link.states(), [&br#"{"state":"OFF","brightness":1}"#[..]]);
    }

    #[test]
    fn test_brightness_echoes_then_reports() {
        let mut b = connected(&[]);
        let outcome = b.handle_command(br#"{"state":"ON","brightness":10}"#);

        assert!(matches!(outcome, CommandOutcome::Moved { .. }));
        assert_eq!(b.position(), 320);
        assert_eq!(
            b.link.states(),
            [
                &br#"{"state":"OFF","brightness":1}"#[..],
                &br#"{"state":"ON","brightness":10}"#[..],
            ]
        );
        assert!(b.link.published.iter().all(|(_, _, retain)| !retain));
    }

    #[test]
    fn test_refresh_publishes_once() {
        let mut b = connected(&[]);
        assert_eq!(b.handle_command(br#"{"brightness":0}"#), CommandOutcome::Refreshed);
        assert_eq!(b.handle_command(br#"{}"#), CommandOutcome::Refreshed);
        assert_eq!(b.link.states().len(), 2);
        assert_eq!(b.position(), 0);
    }

    #[test]
    fn test_malformed_publishes_nothing() {
        let mut b = connected(&[]);
        assert_eq!(
            b.handle_command(b"{\"brightness\":"),
            CommandOutcome::Rejected(PayloadError::Malformed)
        );
        assert!(b.link.published.is_empty());
    }

    #[test]
    fn test_dispatch_by_topic() {
        let mut b = connected(&[]);
        b.link
            .inbox
            .push_back(Message::new(STATE, br#"{"state":"ON","brightness":10}"#).unwrap());
        b.link
            .inbox
            .push_back(Message::new(STATE, b"garbage").unwrap());
        b.link
            .inbox
            .push_back(Message::new("other/topic", br#"{"state":"OFF"}"#).unwrap());
        b.link
            .inbox
            .push_back(Message::new(COMMAND, br#"{"brightness":2}"#).unwrap());

        assert_eq!(b.service_link(), Some(CommandOutcome::Ignored));
        assert_eq!(
            b.service_link(),
            Some(CommandOutcome::Rejected(PayloadError::Malformed))
        );
        assert_eq!(b.service_link(), Some(CommandOutcome::Ignored));
        assert!(b.link.published.is_empty());

        assert!(matches!(b.service_link(), Some(CommandOutcome::Moved { .. })));
        assert_eq!(b.position(), 64);
        assert_eq!(b.service_link(), None);
    }

    #[test]
    fn test_reconnect_sequence() {
        let mut b = blind(&[]);
        b.link.connect_failures = 2;

        assert_eq!(b.maintain_link(), LinkReport::Reconnected { attempts: 3 });
        assert_eq!(b.link.connects, 3);
        assert_eq!(b.link.subscriptions, [STATE, COMMAND]);
        assert_eq!(b.link.published.len(), 2);
        assert_eq!(b.link.published[0].0, ANNOUNCE);
        assert!(b.link.published[0].2);
        assert_eq!(b.link.published[1].0, STATE);
        assert!(!b.link.published[1].2);
        assert_eq!(b.indicator.blinks, 1);
        assert_eq!(b.supervisor().failed_attempts(), 2);
        assert_eq!(b.supervisor().sessions(), 1);

        // Idempotent while connected
        assert_eq!(b.maintain_link(), LinkReport::Steady);
        assert_eq!(b.link.published.len(), 2);
        assert_eq!(b.link.connects, 3);
    }

    #[test]
    fn test_publish_while_down_reconnects_once() {
        let mut b = connected(&[]);
        b.link.connected = false;

        b.handle_command(br#"{"state":"OFF"}"#);
        assert_eq!(b.link.announcements(), 1);
        assert_eq!(b.link.states().len(), 1);
        assert_eq!(b.link.subscriptions.len(), 2);
        assert_eq!(b.supervisor().drops(), 1);
        assert_eq!(b.link_state(), LinkState::Connected);
    }

    #[test]
    fn test_remote_move_retakes_reference() {
        // Boot reference 500; the move drags the ladder down to 350
        let mut b = connected(&[500, 350, 352]);
        b.handle_command(br#"{"brightness":10}"#);
        assert_eq!(b.encoder.reference(), Some(350));

        assert_eq!(b.service_encoder(), Ok(None));
        assert_eq!(b.position(), 320);
    }

    #[test]
    fn test_failed_reference_after_remote_move_reseeds() {
        let mut b = settle(scripted(VecDeque::from([
            Ok(500),
            Err(SensorError::ConversionError),
            Ok(350),
            Ok(355),
        ])));
        b.handle_command(br#"{"brightness":10}"#);
        assert_eq!(b.encoder.reference(), None);

        assert_eq!(b.service_encoder(), Ok(None));
        assert_eq!(b.service_encoder(), Ok(None));
        assert_eq!(b.position(), 320);
    }

    #[test]
    fn test_failed_reference_after_local_move_reseeds() {
        let mut b = settle(scripted(VecDeque::from([
            Ok(100),
            Ok(700),
            Err(SensorError::ConversionError),
            Ok(100),
            Ok(120),
        ])));
        assert!(matches!(b.service_encoder(), Ok(Some(_))));
        assert_eq!(b.encoder.reference(), None);

        // 100 against the stale 700 would be a backward detent
        assert_eq!(b.service_encoder(), Ok(None));
        assert_eq!(b.service_encoder(), Ok(None));
        assert_eq!(b.position(), 1024);
    }

    #[test]
    fn test_repeated_drops_announce_once_each() {
        const CYCLES: usize = 5;
        let mut b = blind(&[]);
        assert!(matches!(b.maintain_link(), LinkReport::Reconnected { .. }));

        for _ in 0..CYCLES {
            b.link.connected = false;
            assert_eq!(b.maintain_link(), LinkReport::Reconnected { attempts: 1 });
            assert_eq!(b.maintain_link(), LinkReport::Steady);
        }

        assert_eq!(b.link.announcements(), CYCLES + 1);
        assert_eq!(b.link.states().len(), CYCLES + 1);
        assert_eq!(b.indicator.blinks, CYCLES as u32 + 1);
        assert_eq!(b.link.subscriptions.len(), 2 * (CYCLES + 1));
        assert_eq!(b.supervisor().sessions(), CYCLES as u32 + 1);
        assert_eq!(b.supervisor().drops(), CYCLES as u32);
    }

    #[test]
    fn test_publish_announcement() {
        let mut b = connected(&[]);
        b.publish_announcement();
        assert_eq!(b.link.announcements(), 1);
        assert!(b.link.states().is_empty());

        // While down, the reconnect sends it
        b.link.connected = false;
        b.publish_announcement();
        assert_eq!(b.link.announcements(), 2);
        assert_eq!(b.link.states().len(), 1);
    }

    #[test]
    fn test_encoder_jump_forward() {
        let mut b = connected(&[100, 700, 700]);
        let report = b.service_encoder().unwrap();
        assert_eq!(
            report,
            Some(MoveReport {
                from: 0,
                to: 1024,
                steps: 1024
            })
        );
        assert_eq!(b.link.states(), [&br#"{"state":"ON","brightness":32}"#[..]]);
        assert_eq!(b.encoder.reference(), Some(700));
    }

    #[test]
    fn test_encoder_backward_at_zero_still_reports() {
        let mut b = connected(&[700, 100, 100]);
        let report = b.service_encoder().unwrap();
        assert_eq!(
            report,
            Some(MoveReport {
                from: 0,
                to: 0,
                steps: 0
            })
        );
        assert_eq!(b.link.states().len(), 1);
    }

    #[test]
    fn test_encoder_quiet() {
        let mut b = connected(&[500, 520]);
        assert_eq!(b.service_encoder(), Ok(None));
        assert!(b.link.published.is_empty());
        assert_eq!(b.service_encoder(), Err(SensorError::ConversionError));
    }
}
