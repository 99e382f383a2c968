//! Adapter around the external pitch detector.
//!
//! The detection and note-segmentation algorithm is not part of this crate.
//! It plugs in through [`PitchDetector`]; [`DetectorAdapter`] owns the event
//! output buffer and calls the detector exactly once per converted block.

use crate::dsp::Q16;
use crate::error::ConfigError;
use crate::midi::NoteEvent;

/// Three mode switches forwarded to the detector unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DetectorModes(pub [bool; 3]);

/// Sensitivity thresholds and mode switches for one detector instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectorParams {
    /// Lower sensitivity threshold (full scale = `Q16::ONE`).
    pub threshold_low: Q16,
    /// Upper sensitivity threshold.
    pub threshold_high: Q16,
    pub modes: DetectorModes,
}

impl DetectorParams {
    /// Thresholds 0.1 / 0.11 with every mode off.
    pub const DEFAULT: DetectorParams = DetectorParams {
        threshold_low: Q16::from_bits(6554),
        threshold_high: Q16::from_bits(7209),
        modes: DetectorModes([false; 3]),
    };

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.threshold_low.is_negative() || self.threshold_low > self.threshold_high {
            return Err(ConfigError::InvalidThresholds);
        }
        Ok(())
    }
}

impl Default for DetectorParams {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// A pitch detector that turns fixed-point blocks into note events.
pub trait PitchDetector {
    /// One-time setup with the actual sample rate.
    fn prepare(&mut self, _sample_rate_hz: u32) {}

    /// Analyse one block and write up to `events.len()` events.
    ///
    /// Returns the number of events written. Reporting more than
    /// `events.len()` is a contract violation.
    fn track(&mut self, block: &[Q16], params: &DetectorParams, events: &mut [NoteEvent]) -> usize;
}

/// Owns a detector, its parameters and a fixed event buffer of `E` slots.
pub struct DetectorAdapter<D, const E: usize> {
    detector: D,
    params: DetectorParams,
    events: [NoteEvent; E],
}

impl<D: PitchDetector, const E: usize> DetectorAdapter<D, E> {
    pub fn new(detector: D, params: DetectorParams) -> Self {
        const { assert!(E > 0, "event capacity must be non-zero") };

        DetectorAdapter {
            detector,
            params,
            events: [NoteEvent::default(); E],
        }
    }

    pub fn prepare(&mut self, sample_rate_hz: u32) {
        self.detector.prepare(sample_rate_hz);
    }

    /// Run the detector on `block`, returning the events it produced in order.
    ///
    /// The returned slice is only valid until the next call.
    pub fn detect(&mut self, block: &[Q16]) -> &[NoteEvent] {
        let reported = self.detector.track(block, &self.params, &mut self.events);
        debug_assert!(
            reported <= E,
            "detector reported {reported} events with capacity {E}"
        );
        if reported > E {
            tracing::warn!(reported, capacity = E, "detector exceeded event capacity");
        }
        &self.events[..reported.min(E)]
    }

    pub fn params(&self) -> &DetectorParams {
        &self.params
    }

    pub fn detector(&self) -> &D {
        &self.detector
    }

    pub fn detector_mut(&mut self) -> &mut D {
        &mut self.detector
    }

    /// Output capacity handed to the detector.
    pub const fn capacity(&self) -> usize {
        E
    }
}
