//! Encoder level sensor trait

/// Errors that can occur while sampling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorError {
    /// ADC conversion error
    ConversionError,
    /// Sampler configured with zero readings
    NoSamples,
}

/// A denoised analog level
///
/// One call is one settled, averaged sample on a 10-bit scale.
pub trait LevelSensor {
    /// Take one sample
    fn sample(&mut self) -> Result<u16, SensorError>;
}
