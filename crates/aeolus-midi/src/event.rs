//! Note events crossing the MIDI ingestion boundary.

use crate::error::{Error, Result};
use midi_msg::{ChannelVoiceMsg, MidiMsg};

/// Lowest key of the manual compass (C2).
pub const COMPASS_LOW: u8 = 36;
/// Highest key of the manual compass (C7).
pub const COMPASS_HIGH: u8 = 96;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoteKind {
    On,
    Off,
}

/// A stop-independent key event on one MIDI channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteEvent {
    pub channel: u8,
    pub key: u8,
    pub velocity: u8,
    pub kind: NoteKind,
}

impl NoteEvent {
    #[inline]
    pub fn on(channel: u8, key: u8, velocity: u8) -> Self {
        Self {
            channel,
            key,
            velocity,
            kind: NoteKind::On,
        }
    }

    #[inline]
    pub fn off(channel: u8, key: u8) -> Self {
        Self {
            channel,
            key,
            velocity: 0,
            kind: NoteKind::Off,
        }
    }

    #[inline]
    pub fn is_on(&self) -> bool {
        self.kind == NoteKind::On
    }

    /// Parse a raw MIDI message.
    ///
    /// Returns `Ok(None)` for messages that carry no key state (controllers,
    /// program changes, system messages). A note-on with velocity 0 is a
    /// note-off.
    pub fn from_bytes(bytes: &[u8]) -> Result<Option<Self>> {
        let Some(&status) = bytes.first() else {
            return Err(Error::Parse("empty message".into()));
        };
        // System common and real-time messages may be a single byte.
        if status >= 0xF0 {
            return Ok(None);
        }
        if bytes.len() < 2 {
            return Err(Error::Parse(format!(
                "need at least 2 bytes, got {}",
                bytes.len()
            )));
        }

        let (msg, _len) = MidiMsg::from_midi(bytes)?;
        let MidiMsg::ChannelVoice { channel, msg } = msg else {
            return Ok(None);
        };
        let channel = channel as u8;

        let event = match msg {
            ChannelVoiceMsg::NoteOn { note, velocity: 0 } => Self::off(channel, note),
            ChannelVoiceMsg::NoteOn { note, velocity } => Self::on(channel, note, velocity),
            ChannelVoiceMsg::NoteOff { note, .. } => Self::off(channel, note),
            _ => return Ok(None),
        };
        Ok(Some(event))
    }
}
