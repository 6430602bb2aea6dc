/// Channel voice messages the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiEvent {
    NoteOn { channel: u8, key: u8, velocity: u8 },
    NoteOff { channel: u8, key: u8, velocity: u8 },
    ControlChange { channel: u8, controller: u8, value: u8 },
}

pub const CC_SUSTAIN: u8 = 64;
pub const CC_ALL_NOTES_OFF: u8 = 123;

impl MidiEvent {
    /// Parse one complete message. Running status, system messages and
    /// channel messages other than notes and controllers yield `None`.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let (&status, data) = bytes.split_first()?;
        if status & 0x80 == 0 {
            return None;
        }
        let channel = status & 0x0F;
        let data1 = data.first().map(|b| b & 0x7F);
        let data2 = data.get(1).map(|b| b & 0x7F);

        match status & 0xF0 {
            0x80 => Some(MidiEvent::NoteOff {
                channel,
                key: data1?,
                velocity: data2?,
            }),
            0x90 => Some(MidiEvent::NoteOn {
                channel,
                key: data1?,
                velocity: data2?,
            }),
            0xB0 => Some(MidiEvent::ControlChange {
                channel,
                controller: data1?,
                value: data2?,
            }),
            _ => None,
        }
    }

    pub fn channel(&self) -> u8 {
        match *self {
            MidiEvent::NoteOn { channel, .. }
            | MidiEvent::NoteOff { channel, .. }
            | MidiEvent::ControlChange { channel, .. } => channel,
        }
    }
}
