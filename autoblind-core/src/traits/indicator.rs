//! Status indicator trait

/// Something that can acknowledge an event to a person standing nearby
pub trait Indicator {
    /// Short double blink; blocks until done
    fn blink(&mut self);
}
