//! Remote command interpretation
//!
//! | Document                          | Command                |
//! |-----------------------------------|------------------------|
//! | `{"state":"OFF", ...}`            | park at zero           |
//! | `{"brightness":b}` with `b > 0`   | move to `b * 32`       |
//! | anything else that parses         | republish state        |
//!
//! `OFF` wins over a brightness in the same document.

use autoblind_protocol::{CommandPayload, PayloadError, PowerState};

use crate::motion::{target_for_brightness, MotionIntent};

/// A decoded command from the command topic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RemoteCommand {
    /// Close fully
    Park,
    /// Open to a brightness level
    MoveToBrightness(i64),
    /// Nothing to move; report state
    Refresh,
}

impl RemoteCommand {
    /// Classify a parsed document
    pub fn from_payload(payload: &CommandPayload) -> Self {
        if payload.state == Some(PowerState::Off) {
            return RemoteCommand::Park;
        }
        match payload.brightness {
            Some(b) if b > 0 => RemoteCommand::MoveToBrightness(b),
            _ => RemoteCommand::Refresh,
        }
    }

    /// Parse and classify raw bytes
    pub fn interpret(bytes: &[u8]) -> Result<Self, PayloadError> {
        CommandPayload::parse(bytes).map(|payload| Self::from_payload(&payload))
    }

    /// What the motor should do
    pub fn intent(self) -> MotionIntent {
        match self {
            RemoteCommand::Park => MotionIntent::MoveTo(0),
            RemoteCommand::MoveToBrightness(b) => MotionIntent::MoveTo(target_for_brightness(b)),
            RemoteCommand::Refresh => MotionIntent::NoOp,
        }
    }

    /// Whether the current state is reported before the motor starts
    ///
    /// Brightness moves can take many seconds; the early report lets the
    /// controller see the command was taken.
    pub fn echoes_before_move(self) -> bool {
        matches!(self, RemoteCommand::MoveToBrightness(_))
    }
}

/// Interpret a command payload straight to a motion intent
pub fn interpret(bytes: &[u8]) -> Result<MotionIntent, PayloadError> {
    RemoteCommand::interpret(bytes).map(RemoteCommand::intent)
}
