//! Resistor-ladder rotary encoder
//!
//! The knob switches a resistor ladder into an RC filter on one ADC pin,
//! so each detent shows up as a step in voltage. A sample waits for the
//! filter to charge, averages a burst of conversions and scales the result
//! to 10 bits.

use embedded_hal::delay::DelayNs;

use autoblind_core::config::EncoderConfig;
use autoblind_core::traits::{LevelSensor, SensorError};
use autoblind_hal::AnalogInput;

/// Ladder encoder on an analog input
pub struct LadderEncoder<A, D> {
    adc: A,
    delay: D,
    samples: u8,
    settle_ms: u32,
    level_shift: u8,
}

impl<A: AnalogInput, D: DelayNs> LadderEncoder<A, D> {
    /// Create a sampler
    ///
    /// # Arguments
    /// - `samples`: conversions averaged per sample
    /// - `settle_ms`: wait before the burst
    /// - `level_shift`: right shift from raw counts to 10 bits
    pub fn new(adc: A, delay: D, samples: u8, settle_ms: u32, level_shift: u8) -> Self {
        Self {
            adc,
            delay,
            samples,
            settle_ms,
            level_shift,
        }
    }

    /// Create a sampler from the encoder configuration
    pub fn from_config(adc: A, delay: D, config: &EncoderConfig) -> Self {
        Self::new(
            adc,
            delay,
            config.samples,
            config.settle_ms,
            config.level_shift,
        )
    }

    /// Average raw counts over one burst, without settling
    pub fn read_raw(&mut self) -> Result<u16, SensorError> {
        if self.samples == 0 {
            return Err(SensorError::NoSamples);
        }
        let mut sum = 0u32;
        for _ in 0..self.samples {
            let raw = self.adc.read().map_err(|_| SensorError::ConversionError)?;
            sum += u32::from(raw);
        }
        Ok((sum / u32::from(self.samples)) as u16)
    }
}

impl<A: AnalogInput, D: DelayNs> LevelSensor for LadderEncoder<A, D> {
    fn sample(&mut self) -> Result<u16, SensorError> {
        self.delay.delay_ms(self.settle_ms);
        let raw = self.read_raw()?;
        Ok(raw >> self.level_shift)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    struct ScriptedAdc(VecDeque<u16>);

    impl AnalogInput for ScriptedAdc {
        type Error = ();

        fn read(&mut self) -> Result<u16, ()> {
            self.0.pop_front().ok_or(())
        }
    }

    #[derive(Default)]
    struct RecordingDelay {
        total_ns: u64,
    }

    impl DelayNs for RecordingDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.total_ns += u64::from(ns);
        }
    }

    fn adc(readings: &[u16]) -> ScriptedAdc {
        ScriptedAdc(readings.iter().copied().collect())
    }

    #[test]
    fn test_average_and_shift() {
        let readings = [2000, 2004, 1996, 2000, 2000, 2000, 2000, 2000, 2000, 2000];
        let mut enc = LadderEncoder::from_config(
            adc(&readings),
            RecordingDelay::default(),
            &EncoderConfig::default(),
        );

        // 2000 raw 12-bit counts is 500 on the 10-bit scale
        assert_eq!(enc.sample(), Ok(500));
        assert_eq!(enc.delay.total_ns, 50_000_000);
    }

    #[test]
    fn test_average_truncates() {
        let mut enc = LadderEncoder::new(adc(&[1, 2]), RecordingDelay::default(), 2, 0, 0);
        assert_eq!(enc.sample(), Ok(1));
    }

    #[test]
    fn test_full_scale_does_not_overflow() {
        let mut enc = LadderEncoder::new(
            adc(&[u16::MAX; 255]),
            RecordingDelay::default(),
            255,
            0,
            0,
        );
        assert_eq!(enc.read_raw(), Ok(u16::MAX));
    }

    #[test]
    fn test_conversion_error() {
        let mut enc = LadderEncoder::new(adc(&[100, 100]), RecordingDelay::default(), 10, 0, 2);
        assert_eq!(enc.sample(), Err(SensorError::ConversionError));
    }

    #[test]
    fn test_zero_samples() {
        let mut enc = LadderEncoder::new(adc(&[100]), RecordingDelay::default(), 0, 0, 2);
        assert_eq!(enc.sample(), Err(SensorError::NoSamples));
    }
}
