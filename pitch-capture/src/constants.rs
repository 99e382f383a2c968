/// Number of raw samples per capture block.
pub const CAPTURE_DEPTH: usize = 32;

/// Number of converted samples per debug log block (a multiple of [`CAPTURE_DEPTH`]).
pub const LOG_DEPTH: usize = 2048;

/// Maximum number of note events the detector may report per block.
pub const MAX_EVENTS_PER_BLOCK: usize = 10;

/// Significant bits in a raw sample from the 12-bit ADC.
pub const SAMPLE_BITS: u8 = 12;

/// Mid-scale raw value of the ADC.
pub const ADC_MIDPOINT: u16 = 2048;

/// Measured DC bias from resistor tolerance on the input divider.
pub const BIAS_CORRECTION: u16 = 60;

/// Raw value that converts to zero.
pub const SAMPLE_OFFSET: u16 = ADC_MIDPOINT - BIAS_CORRECTION;

/// Left shift taking 12-bit counts into Q16.16 (±2048 counts span ±1.0).
pub const SAMPLE_SHIFT: u32 = 5;

/// Base clock of the sampling engine in Hz.
pub const SAMPLER_CLOCK_HZ: u32 = 48_000_000;

/// Clock divider giving ~10 kHz (each conversion takes `1 + divider` cycles).
pub const CLOCK_DIVIDER: u32 = 4800;
