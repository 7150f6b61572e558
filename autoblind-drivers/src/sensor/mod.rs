//! Level sensors

pub mod ladder;

pub use ladder::LadderEncoder;
