//! Monotonic clock on the embassy time driver

use autoblind_hal::Monotonic;
use embassy_time::Instant;

/// Milliseconds since boot from the RP2040 timer
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyClock;

impl Monotonic for EmbassyClock {
    fn now_ms(&self) -> u64 {
        Instant::now().as_millis()
    }
}
