//! The primary acquisition loop.
//!
//! One cycle:
//!
//! ```text
//! wait for sampler ─► rearm on other slot ─► convert ─► detect ─► forward
//!                                                          └──► debug log
//! ```
//!
//! The sampler wait is the only scheduling point. Everything after the
//! rearm has one block period to finish before the next wait returns.
//!
//! ## Usage
//!
//! ```ignore
//! static CAPTURE: CaptureStorage<CAPTURE_DEPTH> = CaptureStorage::new();
//! static mut LOG: DebugCaptureLog<LOG_DEPTH> = DebugCaptureLog::new();
//!
//! let (writer, mut observer) = LOG.split();
//! core1.spawn(move || observer.run(&mut uart));
//!
//! let mut pipeline: Pipeline<_, _, _, _, CAPTURE_DEPTH, LOG_DEPTH> =
//!     Pipeline::new(PipelineConfig::DEFAULT, &CAPTURE, adc, detector, usb_midi, led)?
//!         .with_debug_log(writer);
//! pipeline.run();
//! ```

use embedded_hal::digital::OutputPin;

use crate::capture::{CaptureBufferPair, CaptureStorage};
use crate::config::PipelineConfig;
use crate::constants::MAX_EVENTS_PER_BLOCK;
use crate::detector::{DetectorAdapter, PitchDetector};
use crate::dsp::{Q16, SampleConverter};
use crate::error::ConfigError;
use crate::forward::{EventForwarder, MidiTransport};
use crate::sampler::{SamplerEngine, Slot};

#[cfg(feature = "debug-capture")]
use crate::debug_log::LogWriter;


/// Counters kept by the primary loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Completed cycles.
    pub cycles: u32,
    /// Sampler overruns reported by the engine.
    pub overruns: u32,
    /// Note events handed to the transport.
    pub events_forwarded: u32,
}

/// Capture, conversion, detection and forwarding for capture depth `N`
/// and debug log depth `M`.
pub struct Pipeline<'a, S, D, T, P, const N: usize, const M: usize> {
    config: PipelineConfig,
    sampler: S,
    capture: CaptureBufferPair<'a, N>,
    converter: SampleConverter,
    converted: [Q16; N],
    last_slot: Option<Slot>,
    detector: DetectorAdapter<D, MAX_EVENTS_PER_BLOCK>,
    forwarder: EventForwarder<T, P>,
    #[cfg(feature = "debug-capture")]
    debug_log: Option<LogWriter<'a, M>>,
    stats: PipelineStats,
}

impl<'a, S, D, T, P, const N: usize, const M: usize> Pipeline<'a, S, D, T, P, N, M>
where
    S: SamplerEngine,
    D: PitchDetector,
    T: MidiTransport,
    P: OutputPin,
{
    /// Validate `config`, configure the sampler and arm the first transfer.
    pub fn new(
        config: PipelineConfig,
        storage: &'a CaptureStorage<N>,
        mut sampler: S,
        detector: D,
        transport: T,
        indicator: P,
    ) -> Result<Self, ConfigError> {
        let converter = config.validate::<N, M>()?;

        sampler.select_channel(config.capture_channel);
        sampler.set_rate(config.clock_divider);

        let sample_rate_hz = config.sample_rate_hz();
        let mut detector = DetectorAdapter::new(detector, config.detector);
        detector.prepare(sample_rate_hz);

        let mut capture = CaptureBufferPair::new(storage);
        capture.prime(&mut sampler);

        tracing::info!(
            sample_rate_hz,
            capture_depth = N,
            block_period_us = config.block_period_us(N),
            rearm_slack_us = config.rearm_slack_us(),
            "acquisition pipeline armed"
        );

        Ok(Pipeline {
            config,
            sampler,
            capture,
            converter,
            converted: [Q16::ZERO; N],
            last_slot: None,
            detector,
            forwarder: EventForwarder::new(transport, indicator, config.midi_cable),
            #[cfg(feature = "debug-capture")]
            debug_log: None,
            stats: PipelineStats::default(),
        })
    }

    /// Attach the debug log writer, if debug capture is enabled in the config.
    #[cfg(feature = "debug-capture")]
    pub fn with_debug_log(mut self, writer: LogWriter<'a, M>) -> Self {
        if self.config.debug_capture {
            self.debug_log = Some(writer);
        } else {
            tracing::info!("debug capture disabled by configuration");
        }
        self
    }

    /// Run one full cycle, returning the number of events forwarded.
    pub fn run_cycle(&mut self) -> usize {
        let completed = self.capture.await_block_ready(&mut self.sampler);
        let block = self.capture.swap_and_rearm(&mut self.sampler, completed);

        if self.sampler.take_overrun() {
            self.stats.overruns = self.stats.overruns.wrapping_add(1);
            tracing::warn!(cycle = self.stats.cycles, "sampler overrun, samples lost");
        }

        self.last_slot = Some(block.slot());
        self.converter.convert_block(&*block, &mut self.converted);

        let events = self.detector.detect(&self.converted);
        let count = events.len();
        self.forwarder.forward(events);

        #[cfg(feature = "debug-capture")]
        if let Some(writer) = self.debug_log.as_mut() {
            writer.append(&self.converted);
        }

        self.stats.cycles = self.stats.cycles.wrapping_add(1);
        self.stats.events_forwarded = self.stats.events_forwarded.wrapping_add(count as u32);
        count
    }

    /// Run forever.
    pub fn run(&mut self) -> ! {
        loop {
            self.run_cycle();
        }
    }

    pub fn stats(&self) -> PipelineStats {
        self.stats
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The most recently converted block.
    pub fn converted(&self) -> &[Q16; N] {
        &self.converted
    }

    /// Slot the most recent block was read from.
    pub fn last_slot(&self) -> Option<Slot> {
        self.last_slot
    }

    /// Slot the sampler is writing.
    pub fn armed_slot(&self) -> Option<Slot> {
        self.capture.armed()
    }

    pub fn sampler(&self) -> &S {
        &self.sampler
    }

    pub fn sampler_mut(&mut self) -> &mut S {
        &mut self.sampler
    }

    pub fn detector(&self) -> &D {
        self.detector.detector()
    }

    pub fn forwarder(&self) -> &EventForwarder<T, P> {
        &self.forwarder
    }

    /// Whether a debug log writer is installed.
    pub fn has_debug_log(&self) -> bool {
        #[cfg(feature = "debug-capture")]
        {
            self.debug_log.is_some()
        }
        #[cfg(not(feature = "debug-capture"))]
        {
            false
        }
    }
}
