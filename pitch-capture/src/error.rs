//! Configuration errors.
//!
//! The steady-state loop has no recoverable errors; everything that can be
//! wrong with the pipeline is rejected here, before the sampler is armed.

/// A pipeline configuration that cannot run correctly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("capture depth must be non-zero")]
    ZeroCaptureDepth,

    #[error("log depth {log_depth} is not a non-zero multiple of capture depth {capture_depth}")]
    LogDepthNotMultiple {
        log_depth: usize,
        capture_depth: usize,
    },

    #[error("sampler clock divider must be non-zero")]
    ZeroClockDivider,

    #[error("sampler FIFO depth is zero: no slack to rearm after a completed block")]
    NoRearmSlack,

    #[error("sample width of {0} bits is outside 1..=16")]
    InvalidSampleBits(u8),

    #[error("offset {offset} is outside the {sample_bits}-bit sample range")]
    OffsetOutOfRange { offset: u16, sample_bits: u8 },

    #[error("{sample_bits}-bit samples with offset {offset} overflow i32 when shifted by {shift}")]
    ConversionOverflow {
        sample_bits: u8,
        offset: u16,
        shift: u32,
    },

    #[error("detector thresholds must be non-negative with low <= high")]
    InvalidThresholds,
}
