//! Raw ADC counts to Q16.16.
//!
//! Each raw sample is re-centred on zero and scaled into the detector's
//! fixed-point domain:
//!
//! ```text
//! fixed_point(raw) = (raw - offset) << shift
//! ```
//!
//! There is no saturation. A [`SampleConverter`] can only be built for an
//! `(sample_bits, offset, shift)` triple whose whole raw domain fits in `i32`
//! after shifting, so overflow is ruled out before the first sample arrives.

use crate::constants::{SAMPLE_BITS, SAMPLE_OFFSET, SAMPLE_SHIFT};
use crate::error::ConfigError;

use super::fixed::Q16;

/// Stateless per-sample converter from unsigned counts to [`Q16`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleConverter {
    offset: i32,
    shift: u32,
    max_raw: u16,
}

impl SampleConverter {
    /// 12-bit ADC, offset `2048 - 60`, shift 5.
    pub const DEFAULT: SampleConverter = SampleConverter {
        offset: SAMPLE_OFFSET as i32,
        shift: SAMPLE_SHIFT,
        max_raw: (1 << SAMPLE_BITS) - 1,
    };

    /// Build a converter, rejecting any parameters that could overflow.
    pub fn new(sample_bits: u8, offset: u16, shift: u32) -> Result<Self, ConfigError> {
        if sample_bits == 0 || sample_bits > 16 {
            return Err(ConfigError::InvalidSampleBits(sample_bits));
        }
        let max_raw = raw_max(sample_bits);
        if offset > max_raw {
            return Err(ConfigError::OffsetOutOfRange {
                offset,
                sample_bits,
            });
        }
        if !conversion_fits(sample_bits, offset, shift) {
            return Err(ConfigError::ConversionOverflow {
                sample_bits,
                offset,
                shift,
            });
        }
        Ok(SampleConverter {
            offset: offset as i32,
            shift,
            max_raw,
        })
    }

    /// Convert a single raw sample.
    #[inline(always)]
    pub fn fixed_point(&self, raw: u16) -> Q16 {
        debug_assert!(raw <= self.max_raw, "raw sample {raw} outside converter domain");
        Q16::from_bits((raw as i32 - self.offset) << self.shift)
    }

    /// Convert `raw` into `out`, element by element in index order.
    pub fn convert_block<const N: usize>(&self, raw: &[u16; N], out: &mut [Q16; N]) {
        for (dst, &src) in out.iter_mut().zip(raw.iter()) {
            *dst = self.fixed_point(src);
        }
    }

    pub fn offset(&self) -> u16 {
        self.offset as u16
    }

    pub fn shift(&self) -> u32 {
        self.shift
    }

    /// Largest raw value this converter accepts.
    pub fn max_raw(&self) -> u16 {
        self.max_raw
    }
}

impl Default for SampleConverter {
    fn default() -> Self {
        Self::DEFAULT
    }
}

const fn raw_max(sample_bits: u8) -> u16 {
    ((1u32 << sample_bits) - 1) as u16
}

/// Whether both ends of the raw domain survive `(raw - offset) << shift` in `i32`.
pub const fn conversion_fits(sample_bits: u8, offset: u16, shift: u32) -> bool {
    if sample_bits == 0 || sample_bits > 16 || shift >= 32 {
        return false;
    }
    let hi = (raw_max(sample_bits) as i64 - offset as i64) << shift;
    let lo = (0 - offset as i64) << shift;
    hi <= i32::MAX as i64 && lo >= i32::MIN as i64
}
