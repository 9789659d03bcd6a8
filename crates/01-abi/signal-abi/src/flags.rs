use serde::Serialize;
use std::fmt;

/// Number of independent flags a [`FlagMask`] can carry.
pub const MAX_FLAGS: usize = u32::BITS as usize;

/// Name of one readiness contribution, e.g. `"possessed"`.
///
/// Flags are addressed by name, never by position; the bit a name maps to is an
/// implementation detail of the aggregator that declared it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct FlagName(&'static str);

impl FlagName {
    /// Wraps a static flag name.
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// Borrow the underlying name.
    pub const fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for FlagName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl From<&'static str> for FlagName {
    fn from(name: &'static str) -> Self {
        Self(name)
    }
}

/// Set of readiness bits, one per declared flag.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct FlagMask(u32);

impl FlagMask {
    /// Mask with no bits set.
    pub const NONE: FlagMask = FlagMask(0);

    /// Wraps raw bits.
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Raw bits.
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Mask with only bit `index` set.
    ///
    /// `index` must be below [`MAX_FLAGS`]; larger indices yield an empty mask.
    pub fn bit(index: usize) -> Self {
        if index >= MAX_FLAGS {
            return Self::NONE;
        }
        Self(1 << index)
    }

    /// Returns `true` if bit `index` is set.
    pub fn contains_bit(self, index: usize) -> bool {
        !Self::bit(index).is_empty() && self.0 & Self::bit(index).0 != 0
    }

    /// Returns `true` if every bit in `other` is set in `self`.
    pub fn contains(self, other: FlagMask) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns `true` if at least one bit in `other` is set in `self`.
    pub fn intersects(self, other: FlagMask) -> bool {
        self.0 & other.0 != 0
    }

    /// Returns a copy with bit `index` set to `value`.
    pub fn with_bit(self, index: usize, value: bool) -> Self {
        let bit = Self::bit(index).0;
        if value {
            Self(self.0 | bit)
        } else {
            Self(self.0 & !bit)
        }
    }

    /// Returns `true` if no bits are set.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of set bits.
    pub const fn count(self) -> u32 {
        self.0.count_ones()
    }
}

impl std::ops::BitOr for FlagMask {
    type Output = FlagMask;

    fn bitor(self, rhs: FlagMask) -> FlagMask {
        FlagMask(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for FlagMask {
    fn bitor_assign(&mut self, rhs: FlagMask) {
        self.0 |= rhs.0;
    }
}

impl fmt::Binary for FlagMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Binary::fmt(&self.0, f)
    }
}
