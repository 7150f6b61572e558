//! Monotonic time source

/// Milliseconds since boot
///
/// Only differences are meaningful. Used for keep-alive and
/// acknowledgement timeouts.
pub trait Monotonic {
    /// Current time in milliseconds
    fn now_ms(&self) -> u64;
}
