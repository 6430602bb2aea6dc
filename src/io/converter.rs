use crate::{
    io::midi::{MidiEvent, CC_ALL_NOTES_OFF, CC_SUSTAIN},
    preset::TimbreId,
    synth::message::SynthMessage,
};

/// Translate MIDI on `channel_filter` into engine messages for `timbre`.
///
/// Note-on with velocity 0 is a note-off. CC64 at 64 or above presses the
/// sustain pedal; CC123 silences everything.
pub fn midi_to_synth(midi: MidiEvent, channel_filter: u8, timbre: TimbreId) -> Option<SynthMessage> {
    if midi.channel() != channel_filter {
        return None;
    }

    match midi {
        MidiEvent::NoteOn { key, velocity: 0, .. } | MidiEvent::NoteOff { key, .. } => {
            Some(SynthMessage::NoteOff { pitch: key, timbre })
        }
        MidiEvent::NoteOn { key, velocity, .. } => Some(SynthMessage::NoteOn {
            pitch: key,
            timbre,
            velocity: velocity as f32 / 127.0,
        }),
        MidiEvent::ControlChange {
            controller: CC_SUSTAIN,
            value,
            ..
        } => Some(SynthMessage::Sustain { on: value >= 64 }),
        MidiEvent::ControlChange {
            controller: CC_ALL_NOTES_OFF,
            ..
        } => Some(SynthMessage::AllNotesOff),
        MidiEvent::ControlChange { .. } => None,
    }
}

/// Equal-tempered frequency of a MIDI note. A4 (69) = 440 Hz.
pub fn midi_note_to_freq(note: u8) -> f32 {
    440.0 * 2.0_f32.powf((note as f32 - 69.0) / 12.0)
}
