//! Rotary encoder decoding
//!
//! The manual knob is a 2-bit encoder feeding a resistor ladder into one
//! analog input. Its two low bits count up as the voltage steps down
//! through four levels (~750, ~550, ~350, ~0 mV) and wrap every fourth
//! detent, so a detent is recognised from the size and sign of the change
//! between consecutive samples:
//!
//! ```text
//!   delta >=  wrap   -> wrapped from the bottom: forward
//!   delta <= -wrap   -> wrapped from the top:    backward
//!   delta <= -tick   -> stepped down:            forward
//!   delta >=  tick   -> stepped up:              backward
//! ```

mod decoder;

pub use decoder::EncoderDecoder;
