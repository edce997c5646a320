//! MIDI event records and the conversions the engine needs.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MidiMessage {
    NoteOn { note: u8, velocity: u8 },
    NoteOff { note: u8, velocity: u8 },
    /// 14-bit bend value, 8192 is centre.
    PitchBend { value: u16 },
    ControlChange { controller: u8, value: u8 },
    AllNotesOff,
}

/// A MIDI message tagged with the sample it must fire on, relative to the
/// start of the buffer it was delivered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MidiEvent {
    pub message: MidiMessage,
    pub sample_offset: u32,
}

const CC_ALL_SOUND_OFF: u8 = 120;
const CC_ALL_NOTES_OFF: u8 = 123;

impl MidiEvent {
    pub fn new(message: MidiMessage, sample_offset: u32) -> Self {
        Self { message, sample_offset }
    }

    pub fn note_on(note: u8, velocity: u8, sample_offset: u32) -> Self {
        Self::new(MidiMessage::NoteOn { note, velocity }, sample_offset)
    }

    pub fn note_off(note: u8, sample_offset: u32) -> Self {
        Self::new(MidiMessage::NoteOff { note, velocity: 0 }, sample_offset)
    }

    /// Decodes a channel-voice message. Returns `None` for anything the
    /// engine does not act on.
    pub fn from_bytes(status: u8, data1: u8, data2: u8, sample_offset: u32) -> Option<Self> {
        let data1 = data1 & 0x7F;
        let data2 = data2 & 0x7F;
        let message = match status & 0xF0 {
            0x80 => MidiMessage::NoteOff { note: data1, velocity: data2 },
            // running-status convention: velocity 0 is a note-off
            0x90 if data2 == 0 => MidiMessage::NoteOff { note: data1, velocity: 0 },
            0x90 => MidiMessage::NoteOn { note: data1, velocity: data2 },
            0xB0 if data1 == CC_ALL_NOTES_OFF || data1 == CC_ALL_SOUND_OFF => {
                MidiMessage::AllNotesOff
            }
            0xB0 => MidiMessage::ControlChange { controller: data1, value: data2 },
            0xE0 => MidiMessage::PitchBend {
                value: (data2 as u16) << 7 | data1 as u16,
            },
            _ => return None,
        };
        Some(Self { message, sample_offset })
    }
}

/// Equal-tempered frequency of a MIDI note, A4 = 440 Hz.
#[inline]
pub fn midi_note_to_hz(note: f64) -> f64 {
    440.0 * 2f64.powf((note - 69.0) / 12.0)
}

/// Maps a 14-bit bend value to [-1, 1] with 8192 at zero.
#[inline]
pub fn pitch_bend_to_bipolar(value: u16) -> f64 {
    let value = value.min(0x3FFF) as f64;
    if value >= 8192.0 {
        (value - 8192.0) / 8191.0
    } else {
        (value - 8192.0) / 8192.0
    }
}

#[inline]
pub fn velocity_to_unit(velocity: u8) -> f64 {
    (velocity.min(127) as f64) / 127.0
}
