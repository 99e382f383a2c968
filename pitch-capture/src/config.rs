//! Startup configuration of the acquisition pipeline.
//!
//! Everything here is checked once by [`PipelineConfig::validate`] before the
//! sampler is armed. A configuration that passes cannot overflow the
//! converter or leave the sampler without rearm slack.

use crate::constants::{
    CLOCK_DIVIDER, SAMPLER_CLOCK_HZ, SAMPLE_BITS, SAMPLE_OFFSET, SAMPLE_SHIFT,
};
use crate::detector::DetectorParams;
use crate::dsp::SampleConverter;
use crate::error::ConfigError;
use crate::sampler::ClockDivider;

/// Pipeline configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Analog input channel sampled.
    pub capture_channel: u8,
    /// Base clock of the sampling engine.
    pub sampler_clock_hz: u32,
    pub clock_divider: ClockDivider,
    /// Samples the engine can buffer after a transfer completes.
    pub sampler_fifo_depth: usize,
    /// Significant bits per raw sample.
    pub sample_bits: u8,
    /// Raw value mapped to zero.
    pub offset: u16,
    /// Left shift into Q16.16.
    pub shift: u32,
    pub detector: DetectorParams,
    /// Virtual cable used for every transport write.
    pub midi_cable: u8,
    /// Install the debug capture writer at startup.
    pub debug_capture: bool,
}

impl PipelineConfig {
    pub const DEFAULT: PipelineConfig = PipelineConfig {
        capture_channel: 0,
        sampler_clock_hz: SAMPLER_CLOCK_HZ,
        clock_divider: ClockDivider(CLOCK_DIVIDER),
        sampler_fifo_depth: 4,
        sample_bits: SAMPLE_BITS,
        offset: SAMPLE_OFFSET,
        shift: SAMPLE_SHIFT,
        detector: DetectorParams::DEFAULT,
        midi_cable: 0,
        debug_capture: true,
    };

    /// Check the configuration for capture depth `N` and log depth `M`.
    ///
    /// Returns the converter the pipeline will use.
    pub fn validate<const N: usize, const M: usize>(&self) -> Result<SampleConverter, ConfigError> {
        if N == 0 {
            return Err(ConfigError::ZeroCaptureDepth);
        }
        if M == 0 || M % N != 0 {
            return Err(ConfigError::LogDepthNotMultiple {
                log_depth: M,
                capture_depth: N,
            });
        }
        if self.clock_divider.0 == 0 {
            return Err(ConfigError::ZeroClockDivider);
        }
        if self.sampler_fifo_depth == 0 {
            return Err(ConfigError::NoRearmSlack);
        }
        self.detector.validate()?;
        SampleConverter::new(self.sample_bits, self.offset, self.shift)
    }

    pub fn sample_rate_hz(&self) -> u32 {
        self.clock_divider.sample_rate_hz(self.sampler_clock_hz)
    }

    /// Time for the sampler to fill one block of `n` samples.
    pub fn block_period_us(&self, n: usize) -> u32 {
        per_sample_us(n as u64, self.sample_rate_hz())
    }

    /// Time between transfer completion and FIFO overflow.
    pub fn rearm_slack_us(&self) -> u32 {
        per_sample_us(self.sampler_fifo_depth as u64, self.sample_rate_hz())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

fn per_sample_us(samples: u64, rate_hz: u32) -> u32 {
    if rate_hz == 0 {
        return u32::MAX;
    }
    (samples * 1_000_000 / rate_hz as u64).min(u32::MAX as u64) as u32
}
