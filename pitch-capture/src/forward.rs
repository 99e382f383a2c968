//! Dispatch of detected note events to the transport and the status LED.
//!
//! The indicator is any [`OutputPin`]. To drive the LED and a timing line
//! for a logic analyzer together, pass a [`MirroredPin`].

use embedded_hal::digital::{self, ErrorType, OutputPin};

use crate::midi::{EventKind, NoteEvent};

/// Byte-oriented sink for note events (USB-MIDI on the target).
///
/// Writes are fire-and-forget; there is no acknowledgement.
pub trait MidiTransport {
    /// Send one 3-byte message on the given virtual cable.
    fn write_event(&mut self, cable: u8, bytes: [u8; 3]);
}

/// Forwards note events in order and mirrors "note sounding" on a pin.
pub struct EventForwarder<T, P> {
    transport: T,
    indicator: P,
    cable: u8,
    sounding: bool,
    forwarded: u32,
}

impl<T: MidiTransport, P: OutputPin> EventForwarder<T, P> {
    pub fn new(transport: T, indicator: P, cable: u8) -> Self {
        EventForwarder {
            transport,
            indicator,
            cable,
            sounding: false,
            forwarded: 0,
        }
    }

    /// One transport write per event, in the order given.
    ///
    /// The indicator goes high after a note-on and low after a note-off.
    pub fn forward(&mut self, events: &[NoteEvent]) {
        for event in events {
            self.transport.write_event(self.cable, event.bytes);
            self.forwarded = self.forwarded.wrapping_add(1);
            tracing::trace!(status = event.status(), "note event forwarded");

            let level = match event.kind() {
                EventKind::NoteOn => true,
                EventKind::NoteOff => false,
                EventKind::Other => continue,
            };
            let result = if level {
                self.indicator.set_high()
            } else {
                self.indicator.set_low()
            };
            if result.is_err() {
                tracing::warn!(level, "note indicator write failed");
            }
            self.sounding = level;
        }
    }

    /// Whether the last note event seen was a note-on.
    pub fn is_sounding(&self) -> bool {
        self.sounding
    }

    /// Total events forwarded since construction.
    pub fn forwarded(&self) -> u32 {
        self.forwarded
    }

    /// Return the transport and indicator.
    pub fn release(self) -> (T, P) {
        (self.transport, self.indicator)
    }
}

/// Two output pins driven to the same level.
pub struct MirroredPin<A, B> {
    primary: A,
    mirror: B,
}

impl<A: OutputPin, B: OutputPin> MirroredPin<A, B> {
    pub fn new(primary: A, mirror: B) -> Self {
        MirroredPin { primary, mirror }
    }

    pub fn release(self) -> (A, B) {
        (self.primary, self.mirror)
    }
}

/// Failure of one side of a [`MirroredPin`].
#[derive(Debug)]
pub enum MirroredPinError<EA, EB> {
    Primary(EA),
    Mirror(EB),
}

impl<EA: digital::Error, EB: digital::Error> digital::Error for MirroredPinError<EA, EB> {
    fn kind(&self) -> digital::ErrorKind {
        match self {
            MirroredPinError::Primary(e) => e.kind(),
            MirroredPinError::Mirror(e) => e.kind(),
        }
    }
}

impl<A: OutputPin, B: OutputPin> ErrorType for MirroredPin<A, B> {
    type Error = MirroredPinError<A::Error, B::Error>;
}

// Both pins are always written; the primary's error wins if both fail.
impl<A: OutputPin, B: OutputPin> OutputPin for MirroredPin<A, B> {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        let primary = self.primary.set_low();
        let mirror = self.mirror.set_low();
        primary.map_err(MirroredPinError::Primary)?;
        mirror.map_err(MirroredPinError::Mirror)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        let primary = self.primary.set_high();
        let mirror = self.mirror.set_high();
        primary.map_err(MirroredPinError::Primary)?;
        mirror.map_err(MirroredPinError::Mirror)
    }
}
