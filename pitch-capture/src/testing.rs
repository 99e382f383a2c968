//! Software stand-ins for the hardware and external collaborators.

use core::cell::RefCell;
use core::convert::Infallible;
use std::rc::Rc;
use std::vec::Vec;

use embedded_hal::digital::{self, ErrorType, OutputPin};

use crate::detector::{DetectorParams, PitchDetector};
use crate::forward::MidiTransport;
use crate::midi::NoteEvent;
use crate::sampler::{ClockDivider, SamplerEngine, Slot, Trigger, TransferDescriptor};
use crate::dsp::Q16;

// ── Sampler ────────────────────────────────────────────────────────────

/// Simulated sampler that writes through the armed descriptor.
///
/// Block `k` contains `pattern(k, i)` at index `i`. An immediate transfer
/// lands its first sample as soon as it is armed, the rest when the core
/// waits for completion.
pub struct SimSampler {
    pattern: fn(u32, usize) -> u16,
    armed: Option<TransferDescriptor>,
    written: usize,
    completed: u32,
    arm_log: Vec<(Slot, Trigger, usize)>,
    pub channel: Option<u8>,
    pub divider: Option<ClockDivider>,
    /// Overruns to report, one per `take_overrun` call.
    pub pending_overruns: u32,
}

impl SimSampler {
    pub fn new(pattern: fn(u32, usize) -> u16) -> Self {
        SimSampler {
            pattern,
            armed: None,
            written: 0,
            completed: 0,
            arm_log: Vec::new(),
            channel: None,
            divider: None,
            pending_overruns: 0,
        }
    }

    pub fn armed_slot(&self) -> Option<Slot> {
        self.armed.map(|d| d.slot)
    }

    pub fn arm_log(&self) -> &[(Slot, Trigger, usize)] {
        &self.arm_log
    }

    pub fn blocks_completed(&self) -> u32 {
        self.completed
    }

    fn write_sample(&mut self, index: usize) {
        let desc = self.armed.expect("sampler not armed");
        assert!(index < desc.count);
        let value = (self.pattern)(self.completed, index);
        // SAFETY: the descriptor contract lets the sampler write `count`
        // samples from `destination`.
        unsafe { desc.destination.as_ptr().add(index).write_volatile(value) };
    }
}

impl SamplerEngine for SimSampler {
    fn arm(&mut self, descriptor: TransferDescriptor) {
        self.arm_log
            .push((descriptor.slot, descriptor.trigger, descriptor.count));
        self.armed = Some(descriptor);
        self.written = 0;
        if descriptor.trigger == Trigger::Immediate && descriptor.count > 0 {
            self.write_sample(0);
            self.written = 1;
        }
    }

    fn wait_for_completion(&mut self) {
        let desc = self.armed.expect("waiting on a sampler that was never armed");
        for i in self.written..desc.count {
            self.write_sample(i);
        }
        self.written = desc.count;
        self.completed += 1;
    }

    fn select_channel(&mut self, channel: u8) {
        self.channel = Some(channel);
    }

    fn set_rate(&mut self, divider: ClockDivider) {
        self.divider = Some(divider);
    }

    fn take_overrun(&mut self) -> bool {
        if self.pending_overruns > 0 {
            self.pending_overruns -= 1;
            true
        } else {
            false
        }
    }
}

// ── Detector ───────────────────────────────────────────────────────────

/// What the detector saw on one call.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorCall {
    pub first: Q16,
    pub last: Q16,
    pub len: usize,
    pub capacity: usize,
    pub params: DetectorParams,
}

/// Detector that replays a fixed script of event lists, one per call.
pub struct ScriptedDetector {
    script: Vec<Vec<NoteEvent>>,
    pub calls: Vec<DetectorCall>,
    pub prepared_rate: Option<u32>,
    /// Report this many events regardless of the output capacity.
    pub claim_count: Option<usize>,
}

impl ScriptedDetector {
    pub fn new(script: Vec<Vec<NoteEvent>>) -> Self {
        ScriptedDetector {
            script,
            calls: Vec::new(),
            prepared_rate: None,
            claim_count: None,
        }
    }

    pub fn silent() -> Self {
        Self::new(Vec::new())
    }
}

impl PitchDetector for ScriptedDetector {
    fn prepare(&mut self, sample_rate_hz: u32) {
        self.prepared_rate = Some(sample_rate_hz);
    }

    fn track(&mut self, block: &[Q16], params: &DetectorParams, events: &mut [NoteEvent]) -> usize {
        let call = self.calls.len();
        self.calls.push(DetectorCall {
            first: block[0],
            last: block[block.len() - 1],
            len: block.len(),
            capacity: events.len(),
            params: *params,
        });
        let mut n = 0;
        if let Some(batch) = self.script.get(call) {
            for (slot, ev) in events.iter_mut().zip(batch.iter()) {
                *slot = *ev;
                n += 1;
            }
        }
        self.claim_count.unwrap_or(n)
    }
}

// ── Transport + indicator ──────────────────────────────────────────────

/// One observable side effect of forwarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Write { cable: u8, bytes: [u8; 3] },
    Indicator(bool),
    Timing(bool),
}

pub type EffectLog = Rc<RefCell<Vec<Effect>>>;

pub fn effect_log() -> EffectLog {
    Rc::new(RefCell::new(Vec::new()))
}

pub struct RecordingTransport {
    log: EffectLog,
}

impl RecordingTransport {
    pub fn new(log: &EffectLog) -> Self {
        RecordingTransport { log: log.clone() }
    }
}

impl MidiTransport for RecordingTransport {
    fn write_event(&mut self, cable: u8, bytes: [u8; 3]) {
        self.log.borrow_mut().push(Effect::Write { cable, bytes });
    }
}

pub struct RecordingPin {
    log: EffectLog,
    effect: fn(bool) -> Effect,
}

impl RecordingPin {
    /// Records `Effect::Indicator`.
    pub fn new(log: &EffectLog) -> Self {
        RecordingPin {
            log: log.clone(),
            effect: Effect::Indicator,
        }
    }

    /// Records `Effect::Timing`.
    pub fn timing(log: &EffectLog) -> Self {
        RecordingPin {
            log: log.clone(),
            effect: Effect::Timing,
        }
    }
}

impl ErrorType for RecordingPin {
    type Error = Infallible;
}

impl OutputPin for RecordingPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.log.borrow_mut().push((self.effect)(false));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.log.borrow_mut().push((self.effect)(true));
        Ok(())
    }
}

#[derive(Debug)]
pub struct PinFault;

impl digital::Error for PinFault {
    fn kind(&self) -> digital::ErrorKind {
        digital::ErrorKind::Other
    }
}

/// Pin whose every write fails.
pub struct BrokenPin;

impl ErrorType for BrokenPin {
    type Error = PinFault;
}

impl OutputPin for BrokenPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Err(PinFault)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Err(PinFault)
    }
}
