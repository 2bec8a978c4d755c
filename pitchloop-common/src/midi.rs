
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum MidiEvent {
    NoteOn {
        channel: u8,
        note: u8,
        velocity: u8,
    },
    NoteOff {
        channel: u8,
        note: u8,
        velocity: u8,
    },
    ControllerChange {
        channel: u8,
        controller: u8,
        data: u8,
    },
}

impl MidiEvent {
    pub fn from_bytes(bs: &[u8]) -> Option<Self> {
        if bs.len() != 3 {
            return None;
        }

        let channel = bs[0] & 0b1111;
        match bs[0] >> 4 {
            0x9 if bs[2] > 0 => Some(MidiEvent::NoteOn {
                channel,
                note: bs[1],
                velocity: bs[2],
            }),
            // a note-on with zero velocity is a release
            0x8 | 0x9 => Some(MidiEvent::NoteOff {
                channel,
                note: bs[1],
                velocity: bs[2],
            }),
            0xb => Some(MidiEvent::ControllerChange {
                channel,
                controller: bs[1],
                data: bs[2],
            }),
            _ => None,
        }
    }

    pub fn channel(&self) -> u8 {
        match self {
            MidiEvent::NoteOn { channel, .. }
            | MidiEvent::NoteOff { channel, .. }
            | MidiEvent::ControllerChange { channel, .. } => *channel,
        }
    }
}
