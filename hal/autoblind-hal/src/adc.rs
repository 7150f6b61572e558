//! Analog input abstraction

/// A single analog channel
///
/// Returns the raw converter count. Resolution is chip specific; callers
/// that care about scale shift the value themselves.
pub trait AnalogInput {
    /// Error type for conversions
    type Error: core::fmt::Debug;

    /// Perform one blocking conversion
    fn read(&mut self) -> Result<u16, Self::Error>;
}

impl<T: AnalogInput + ?Sized> AnalogInput for &mut T {
    type Error = T::Error;

    fn read(&mut self) -> Result<u16, Self::Error> {
        (**self).read()
    }
}
