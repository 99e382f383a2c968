//! Note events produced by the detector.

/// MIDI status nibble for note-off.
pub const NOTE_OFF: u8 = 0x80;
/// MIDI status nibble for note-on.
pub const NOTE_ON: u8 = 0x90;

/// Coarse classification of a [`NoteEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    NoteOn,
    NoteOff,
    Other,
}

/// One 3-byte MIDI channel message: status followed by two data bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoteEvent {
    pub bytes: [u8; 3],
}

impl NoteEvent {
    pub const fn new(status: u8, data1: u8, data2: u8) -> Self {
        NoteEvent {
            bytes: [status, data1, data2],
        }
    }

    pub const fn note_on(channel: u8, note: u8, velocity: u8) -> Self {
        Self::new(NOTE_ON | (channel & 0x0F), note & 0x7F, velocity & 0x7F)
    }

    pub const fn note_off(channel: u8, note: u8, velocity: u8) -> Self {
        Self::new(NOTE_OFF | (channel & 0x0F), note & 0x7F, velocity & 0x7F)
    }

    pub const fn status(&self) -> u8 {
        self.bytes[0]
    }

    /// Classify by the status nibble; the channel is ignored.
    pub const fn kind(&self) -> EventKind {
        match self.bytes[0] & 0xF0 {
            NOTE_ON => EventKind::NoteOn,
            NOTE_OFF => EventKind::NoteOff,
            _ => EventKind::Other,
        }
    }
}
