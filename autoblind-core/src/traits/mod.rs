//! Hardware abstraction traits
//!
//! These traits define the interface between the application logic
//! and hardware-specific implementations.

pub mod indicator;
pub mod sensor;
pub mod stepper;

pub use indicator::Indicator;
pub use sensor::{LevelSensor, SensorError};
pub use stepper::{CoilDriver, Direction, PositionStepper};
