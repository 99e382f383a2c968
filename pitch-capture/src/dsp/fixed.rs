//! Q16.16 signed fixed-point samples.

use core::ops::{Add, Neg, Sub};

/// Signed fixed-point value with 16 fractional bits.
///
/// This is the numeric domain of the pitch detector: `Q16::ONE` is full scale
/// of the converted signal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Q16(i32);

impl Q16 {
    /// Number of fractional bits.
    pub const FRAC_BITS: u32 = 16;

    pub const ZERO: Q16 = Q16(0);
    pub const ONE: Q16 = Q16(1 << Self::FRAC_BITS);

    /// Wrap a raw Q16.16 bit pattern.
    #[inline(always)]
    pub const fn from_bits(bits: i32) -> Self {
        Q16(bits)
    }

    /// The raw Q16.16 bit pattern.
    #[inline(always)]
    pub const fn to_bits(self) -> i32 {
        self.0
    }

    /// Convert from `f32`, rounding half away from zero.
    ///
    /// Out-of-range inputs saturate to `i32::MIN` / `i32::MAX`.
    pub fn from_f32(value: f32) -> Self {
        Q16(libm::roundf(value * (1u32 << Self::FRAC_BITS) as f32) as i32)
    }

    pub fn to_f32(self) -> f32 {
        self.0 as f32 / (1u32 << Self::FRAC_BITS) as f32
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }
}

impl Add for Q16 {
    type Output = Q16;

    #[inline(always)]
    fn add(self, rhs: Q16) -> Q16 {
        Q16(self.0.wrapping_add(rhs.0))
    }
}

impl Sub for Q16 {
    type Output = Q16;

    #[inline(always)]
    fn sub(self, rhs: Q16) -> Q16 {
        Q16(self.0.wrapping_sub(rhs.0))
    }
}

impl Neg for Q16 {
    type Output = Q16;

    #[inline(always)]
    fn neg(self) -> Q16 {
        Q16(self.0.wrapping_neg())
    }
}
