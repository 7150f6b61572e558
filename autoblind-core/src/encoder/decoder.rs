//! Encoder sample decoder

use crate::config::EncoderConfig;
use crate::motion::MotionIntent;
use crate::traits::{Direction, LevelSensor, SensorError};

/// Turns consecutive ladder samples into motion intents
///
/// The reference is the previous sample. It advances on every poll and is
/// retaken after a move so that the move itself is not read as a detent.
#[derive(Debug, Clone)]
pub struct EncoderDecoder {
    reference: Option<u16>,
    wrap_threshold: i32,
    tick_threshold: i32,
    jump_steps: i32,
}

impl EncoderDecoder {
    /// Create a decoder with no reference yet
    pub fn new(config: &EncoderConfig) -> Self {
        Self {
            reference: None,
            wrap_threshold: config.wrap_threshold,
            tick_threshold: config.tick_threshold,
            jump_steps: config.jump_steps,
        }
    }

    /// Last sample taken, if any
    pub fn reference(&self) -> Option<u16> {
        self.reference
    }

    /// Classify a sample delta, checking thresholds in priority order
    pub fn classify(&self, delta: i32) -> Option<Direction> {
        if delta >= self.wrap_threshold {
            Some(Direction::Forward)
        } else if delta <= -self.wrap_threshold {
            Some(Direction::Backward)
        } else if delta <= -self.tick_threshold {
            Some(Direction::Forward)
        } else if delta >= self.tick_threshold {
            Some(Direction::Backward)
        } else {
            None
        }
    }

    /// Decode a pair of samples against the current position
    pub fn decode(&self, previous: u16, current: u16, position: u32) -> MotionIntent {
        let delta = i32::from(current) - i32::from(previous);
        let position = i32::try_from(position).unwrap_or(i32::MAX);
        match self.classify(delta) {
            Some(Direction::Forward) => {
                MotionIntent::MoveTo(position.saturating_add(self.jump_steps))
            }
            Some(Direction::Backward) => {
                MotionIntent::MoveTo(position.saturating_sub(self.jump_steps))
            }
            None => MotionIntent::NoOp,
        }
    }

    /// Take a sample and decode it against the previous one
    ///
    /// The first successful sample only establishes the reference.
    pub fn poll<S: LevelSensor>(
        &mut self,
        sensor: &mut S,
        position: u32,
    ) -> Result<MotionIntent, SensorError> {
        let current = sensor.sample()?;
        let intent = match self.reference {
            Some(previous) => self.decode(previous, current, position),
            None => MotionIntent::NoOp,
        };
        self.reference = Some(current);
        Ok(intent)
    }

    /// Forget the reference; the next poll only seeds it
    pub fn reset(&mut self) {
        self.reference = None;
    }

    /// Retake the reference sample
    pub fn rebaseline<S: LevelSensor>(&mut self, sensor: &mut S) -> Result<u16, SensorError> {
        let level = sensor.sample()?;
        self.reference = Some(level);
        Ok(level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    struct ScriptedSensor(VecDeque<Result<u16, SensorError>>);

    impl LevelSensor for ScriptedSensor {
        fn sample(&mut self) -> Result<u16, SensorError> {
            self.0.pop_front().unwrap_or(Err(SensorError::ConversionError))
        }
    }

    fn decoder() -> EncoderDecoder {
        EncoderDecoder::new(&EncoderConfig::default())
    }

    #[test]
    fn test_threshold_table() {
        let d = decoder();
        assert_eq!(d.classify(600), Some(Direction::Forward));
        assert_eq!(d.classify(-150), Some(Direction::Forward));
        assert_eq!(d.classify(-600), Some(Direction::Backward));
        assert_eq!(d.classify(150), Some(Direction::Backward));
        assert_eq!(d.classify(50), None);
    }

    #[test]
    fn test_threshold_boundaries() {
        let d = decoder();
        assert_eq!(d.classify(500), Some(Direction::Forward));
        assert_eq!(d.classify(499), Some(Direction::Backward));
        assert_eq!(d.classify(-500), Some(Direction::Backward));
        assert_eq!(d.classify(-499), Some(Direction::Forward));
        assert_eq!(d.classify(-100), Some(Direction::Forward));
        assert_eq!(d.classify(100), Some(Direction::Backward));
        assert_eq!(d.classify(99), None);
        assert_eq!(d.classify(-99), None);
        assert_eq!(d.classify(0), None);
    }

    #[test]
    fn test_decode_jumps() {
        let d = decoder();
        assert_eq!(d.decode(100, 700, 2048), MotionIntent::MoveTo(3072));
        assert_eq!(d.decode(700, 100, 2048), MotionIntent::MoveTo(1024));
        assert_eq!(d.decode(500, 350, 0), MotionIntent::MoveTo(1024));
        assert_eq!(d.decode(350, 500, 0), MotionIntent::MoveTo(-1024));
        assert_eq!(d.decode(500, 530, 77), MotionIntent::NoOp);
    }

    #[test]
    fn test_first_poll_sets_reference() {
        let mut d = decoder();
        let mut sensor = ScriptedSensor(VecDeque::from([Ok(700), Ok(100)]));

        assert_eq!(d.poll(&mut sensor, 0), Ok(MotionIntent::NoOp));
        assert_eq!(d.reference(), Some(700));
        assert_eq!(d.poll(&mut sensor, 0), Ok(MotionIntent::MoveTo(-1024)));
        assert_eq!(d.reference(), Some(100));
    }

    #[test]
    fn test_poll_compares_consecutive_samples() {
        let mut d = decoder();
        let mut sensor = ScriptedSensor(VecDeque::from([Ok(500), Ok(460), Ok(420), Ok(380)]));
        d.rebaseline(&mut sensor).unwrap();

        // Slow drift never crosses the tick threshold between samples
        for _ in 0..3 {
            assert_eq!(d.poll(&mut sensor, 0), Ok(MotionIntent::NoOp));
        }
        assert_eq!(d.reference(), Some(380));
    }

    #[test]
    fn test_sensor_error_keeps_reference() {
        let mut d = decoder();
        let mut sensor = ScriptedSensor(VecDeque::from([Ok(500)]));
        d.rebaseline(&mut sensor).unwrap();

        assert_eq!(d.poll(&mut sensor, 0), Err(SensorError::ConversionError));
        assert_eq!(d.reference(), Some(500));
    }

    #[test]
    fn test_reset_reseeds() {
        let mut d = decoder();
        let mut sensor = ScriptedSensor(VecDeque::from([Ok(500), Ok(100), Ok(700)]));
        d.rebaseline(&mut sensor).unwrap();
        d.reset();
        assert_eq!(d.reference(), None);

        // A large step after reset is a seed, not a detent
        assert_eq!(d.poll(&mut sensor, 0), Ok(MotionIntent::NoOp));
        assert_eq!(d.reference(), Some(100));
        assert_eq!(d.poll(&mut sensor, 0), Ok(MotionIntent::MoveTo(1024)));
    }
}
