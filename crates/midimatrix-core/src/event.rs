//! MIDI events flowing into and out of the engines

use crate::error::DecodeError;

const NOTE_OFF: u8 = 0x80;
const NOTE_ON: u8 = 0x90;
const CONTROL_CHANGE: u8 = 0xB0;
const CHANNEL_PRESSURE: u8 = 0xD0;
const PITCH_BEND: u8 = 0xE0;

/// Centre of the 14-bit pitch-bend range
pub const PITCH_BEND_CENTER: i16 = 8192;

/// An undecoded short MIDI message (up to three bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawMessage {
    bytes: [u8; 3],
    len: u8,
}

impl RawMessage {
    pub fn new(bytes: &[u8]) -> Self {
        let len = bytes.len().min(3);
        let mut buf = [0u8; 3];
        buf[..len].copy_from_slice(&bytes[..len]);
        Self { bytes: buf, len: len as u8 }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }
}

/// An inbound or outbound MIDI event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiEvent {
    NoteOn { channel: u8, pitch: u8, velocity: u8 },
    NoteOff { channel: u8, pitch: u8, velocity: u8 },
    ControlChange { channel: u8, controller: u8, value: u8 },
    ChannelPressure { channel: u8, value: u8 },
    /// -8192 (full down) to 8191 (full up), 0 = centre
    PitchBend { channel: u8, value: i16 },
    /// Anything else; forwarded untouched
    Other(RawMessage),
}

impl MidiEvent {
    /// Decode a raw message. A note-on with velocity 0 decodes as a note-off.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        let &status = bytes.first().ok_or(DecodeError::Empty)?;
        if status < 0x80 {
            return Err(DecodeError::MissingStatus(status));
        }

        let kind = status & 0xF0;
        let channel = status & 0x0F;
        let expected = match kind {
            NOTE_OFF | NOTE_ON | CONTROL_CHANGE | PITCH_BEND => 3,
            CHANNEL_PRESSURE => 2,
            _ => return Ok(Self::Other(RawMessage::new(bytes))),
        };
        if bytes.len() < expected {
            return Err(DecodeError::Truncated { status, expected, got: bytes.len() });
        }

        let data1 = bytes[1] & 0x7F;
        let data2 = bytes.get(2).map_or(0, |b| b & 0x7F);

        Ok(match kind {
            NOTE_ON if data2 > 0 => Self::NoteOn { channel, pitch: data1, velocity: data2 },
            NOTE_ON | NOTE_OFF => Self::NoteOff { channel, pitch: data1, velocity: data2 },
            CONTROL_CHANGE => Self::ControlChange { channel, controller: data1, value: data2 },
            CHANNEL_PRESSURE => Self::ChannelPressure { channel, value: data1 },
            _ => {
                let raw = ((data2 as i16) << 7) | data1 as i16;
                Self::PitchBend { channel, value: raw - PITCH_BEND_CENTER }
            }
        })
    }

    pub fn to_bytes(&self) -> RawMessage {
        match *self {
            Self::NoteOn { channel, pitch, velocity } => {
                RawMessage::new(&[NOTE_ON | (channel & 0x0F), pitch & 0x7F, velocity & 0x7F])
            }
            Self::NoteOff { channel, pitch, velocity } => {
                RawMessage::new(&[NOTE_OFF | (channel & 0x0F), pitch & 0x7F, velocity & 0x7F])
            }
            Self::ControlChange { channel, controller, value } => {
                RawMessage::new(&[CONTROL_CHANGE | (channel & 0x0F), controller & 0x7F, value & 0x7F])
            }
            Self::ChannelPressure { channel, value } => {
                RawMessage::new(&[CHANNEL_PRESSURE | (channel & 0x0F), value & 0x7F])
            }
            Self::PitchBend { channel, value } => {
                let raw = (value.clamp(-8192, 8191) + PITCH_BEND_CENTER) as u16;
                RawMessage::new(&[PITCH_BEND | (channel & 0x0F), (raw & 0x7F) as u8, (raw >> 7) as u8])
            }
            Self::Other(raw) => raw,
        }
    }
}

/// A scaled value for one target slot (1-based index)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetEvent {
    pub target: usize,
    pub value: f32,
}

/// One output of an engine, in emission order
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FxOutput {
    /// Send immediately
    Midi(MidiEvent),
    Target(TargetEvent),
    /// Send once `delay_ms` have passed since the triggering event
    Delayed { event: MidiEvent, delay_ms: u32 },
}
