//! MIDI message model
//!
//! Parses raw bytes from the MIDI driver into the flat message record that
//! receive handlers get: a message type plus the two data bytes.

use std::fmt;

/// Kind of MIDI message carried by a [`MidiNodeMessage`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    NoteOff,
    NoteOn,
    PolyPressure,
    ControlChange,
    ProgramChange,
    ChannelPressure,
    PitchBend,
    /// Any system common / realtime message (0xF0-0xFF)
    System,
}

impl MessageType {
    /// Status nibble for channel messages, None for system messages
    fn status_nibble(self) -> Option<u8> {
        match self {
            MessageType::NoteOff => Some(0x80),
            MessageType::NoteOn => Some(0x90),
            MessageType::PolyPressure => Some(0xA0),
            MessageType::ControlChange => Some(0xB0),
            MessageType::ProgramChange => Some(0xC0),
            MessageType::ChannelPressure => Some(0xD0),
            MessageType::PitchBend => Some(0xE0),
            MessageType::System => None,
        }
    }
}

/// One parsed MIDI message as delivered to receive handlers
///
/// `data1`/`data2` are the raw data bytes; for Control Change they are the
/// controller number and value. Missing data bytes are zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MidiNodeMessage {
    pub message_type: MessageType,
    /// Channel 0-15 (always 0 for system messages)
    pub channel: u8,
    pub data1: u8,
    pub data2: u8,
}

impl MidiNodeMessage {
    /// Build a Control Change message
    pub fn control_change(channel: u8, cc: u8, value: u8) -> Self {
        Self {
            message_type: MessageType::ControlChange,
            channel: channel & 0x0F,
            data1: cc & 0x7F,
            data2: value & 0x7F,
        }
    }

    /// Parse a MIDI message from raw bytes
    ///
    /// Running status is not tracked, so a buffer starting with a data byte
    /// yields None. Truncated channel messages yield None as well.
    pub fn parse(data: &[u8]) -> Option<Self> {
        let (&status, rest) = data.split_first()?;

        if status < 0x80 {
            return None;
        }

        if status >= 0xF0 {
            return Some(Self {
                message_type: MessageType::System,
                channel: 0,
                data1: rest.first().map_or(0, |b| b & 0x7F),
                data2: rest.get(1).map_or(0, |b| b & 0x7F),
            });
        }

        let channel = status & 0x0F;
        let (message_type, needed) = match status & 0xF0 {
            0x80 => (MessageType::NoteOff, 2),
            0x90 => (MessageType::NoteOn, 2),
            0xA0 => (MessageType::PolyPressure, 2),
            0xB0 => (MessageType::ControlChange, 2),
            0xC0 => (MessageType::ProgramChange, 1),
            0xD0 => (MessageType::ChannelPressure, 1),
            0xE0 => (MessageType::PitchBend, 2),
            _ => return None,
        };

        if rest.len() < needed {
            return None;
        }

        let data1 = rest[0] & 0x7F;
        let data2 = if needed == 2 { rest[1] & 0x7F } else { 0 };

        // Note On with velocity 0 is a Note Off
        let message_type = if message_type == MessageType::NoteOn && data2 == 0 {
            MessageType::NoteOff
        } else {
            message_type
        };

        Some(Self {
            message_type,
            channel,
            data1,
            data2,
        })
    }

    /// Encode back to wire bytes (channel messages only)
    pub fn to_bytes(&self) -> Option<Vec<u8>> {
        let nibble = self.message_type.status_nibble()?;
        let status = nibble | (self.channel & 0x0F);
        Some(match self.message_type {
            MessageType::ProgramChange | MessageType::ChannelPressure => {
                vec![status, self.data1 & 0x7F]
            }
            _ => vec![status, self.data1 & 0x7F, self.data2 & 0x7F],
        })
    }

    /// Controller number (data1) of a Control Change
    pub fn ccnum(&self) -> u8 {
        self.data1
    }

    /// Controller value (data2) of a Control Change
    pub fn ccval(&self) -> u8 {
        self.data2
    }

    pub fn is_control_change(&self) -> bool {
        self.message_type == MessageType::ControlChange
    }
}

impl fmt::Display for MidiNodeMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.message_type {
            MessageType::ControlChange => write!(
                f,
                "CC ch:{} cc:{} v:{}",
                self.channel + 1,
                self.data1,
                self.data2
            ),
            MessageType::NoteOn | MessageType::NoteOff => write!(
                f,
                "{:?} ch:{} n:{} v:{}",
                self.message_type,
                self.channel + 1,
                self.data1,
                self.data2
            ),
            MessageType::System => write!(f, "System {:02X} {:02X}", self.data1, self.data2),
            other => write!(
                f,
                "{:?} ch:{} {} {}",
                other,
                self.channel + 1,
                self.data1,
                self.data2
            ),
        }
    }
}

/// Format MIDI bytes as hex string for debugging
pub fn format_hex(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
