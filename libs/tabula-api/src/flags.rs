use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Opaque set of converter flags.
///
/// The meaning of each bit is owned by the converter family that reads it;
/// families publish their flags as associated constants
/// (e.g. `EnumConverter::FORMAT_IS_UNKNOWN_VALUE`). Bits are combined with `|`.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ConverterFlags(u64);

impl ConverterFlags {
    pub const NONE: ConverterFlags = ConverterFlags(0);

    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u64 {
        self.0
    }

    /// True when every bit of `other` is set in `self`.
    pub const fn contains(self, other: ConverterFlags) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for ConverterFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for ConverterFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl From<u64> for ConverterFlags {
    fn from(bits: u64) -> Self {
        Self(bits)
    }
}

impl fmt::Debug for ConverterFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConverterFlags({:#b})", self.0)
    }
}
