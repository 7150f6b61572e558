//! Half-step coil sequence
//!
//! Eight phases alternate one and two energized coils. The phase for a
//! step is selected by `position % 8` before the position changes.

/// Coil identifiers, in table order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Coil {
    Blue,
    Pink,
    Yellow,
    Orange,
}

impl Coil {
    /// All coils in table order
    pub const ALL: [Coil; 4] = [Coil::Blue, Coil::Pink, Coil::Yellow, Coil::Orange];

    /// Position within [`Coil::ALL`]
    pub const fn index(self) -> usize {
        match self {
            Coil::Blue => 0,
            Coil::Pink => 1,
            Coil::Yellow => 2,
            Coil::Orange => 3,
        }
    }
}

/// Energized coils, one bit per coil, Blue in bit 3
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CoilPattern(u8);

impl CoilPattern {
    /// All coils off
    pub const RELEASED: Self = Self(0);

    /// Build from a nibble written Blue-first, e.g. `0b1100` is Blue+Pink
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & 0x0F)
    }

    /// Raw nibble
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Whether `coil` is energized
    pub const fn is_energized(self, coil: Coil) -> bool {
        self.0 & (0b1000 >> coil.index()) != 0
    }

    /// Number of energized coils
    pub const fn count(self) -> u32 {
        self.0.count_ones()
    }

    /// Pattern driven when stepping away from `position`
    pub const fn for_position(position: u32) -> Self {
        PHASE_TABLE[(position % 8) as usize]
    }
}

/// Phase table, Blue/Pink/Yellow/Orange
pub const PHASE_TABLE: [CoilPattern; 8] = [
    CoilPattern::from_bits(0b1000),
    CoilPattern::from_bits(0b1100),
    CoilPattern::from_bits(0b0100),
    CoilPattern::from_bits(0b0110),
    CoilPattern::from_bits(0b0010),
    CoilPattern::from_bits(0b0011),
    CoilPattern::from_bits(0b0001),
    CoilPattern::from_bits(0b1001),
];
