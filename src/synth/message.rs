#[cfg(feature = "rtrb")]
use rtrb::{Consumer, Producer};

use crate::{preset::TimbreId, synth::poly::VoiceCount};

/// Control-domain events, applied by the engine in arrival order.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum SynthMessage {
    NoteOn {
        pitch: u8,
        timbre: TimbreId,
        velocity: f32,
    },
    NoteOff {
        pitch: u8,
        timbre: TimbreId,
    },
    Sustain {
        on: bool,
    },
    AllNotesOff,
}

pub trait MessageReceiver {
    fn pop(&mut self) -> Option<SynthMessage>;
}

#[cfg(feature = "rtrb")]
impl MessageReceiver for Consumer<SynthMessage> {
    fn pop(&mut self) -> Option<SynthMessage> {
        Consumer::pop(self).ok()
    }
}

/// Receives the voice count after every note event.
pub trait VoiceCountObserver: Send {
    fn voice_count_changed(&mut self, count: VoiceCount);
}

/// Drops updates when the UI falls behind; the next event carries a fresh count.
#[cfg(feature = "rtrb")]
impl VoiceCountObserver for Producer<VoiceCount> {
    fn voice_count_changed(&mut self, count: VoiceCount) {
        let _ = self.push(count);
    }
}

#[cfg(all(test, feature = "rtrb"))]
mod tests {
    use super::*;
    use crate::preset::PresetBank;
    use rtrb::RingBuffer;

    #[test]
    fn consumer_drains_in_order() {
        let bank = PresetBank::builtin();
        let timbre = bank.resolve(crate::preset::DX7_E_PIANO_1).unwrap();
        let (mut tx, mut rx) = RingBuffer::<SynthMessage>::new(4);

        tx.push(SynthMessage::Sustain { on: true }).unwrap();
        tx.push(SynthMessage::NoteOff { pitch: 60, timbre }).unwrap();

        assert_eq!(
            MessageReceiver::pop(&mut rx),
            Some(SynthMessage::Sustain { on: true })
        );
        assert_eq!(
            MessageReceiver::pop(&mut rx),
            Some(SynthMessage::NoteOff { pitch: 60, timbre })
        );
        assert_eq!(MessageReceiver::pop(&mut rx), None);
    }

    #[test]
    fn full_observer_queue_drops_updates() {
        let (mut tx, mut rx) = RingBuffer::<VoiceCount>::new(1);
        tx.voice_count_changed(VoiceCount::new(1, 8));
        tx.voice_count_changed(VoiceCount::new(2, 8));

        assert_eq!(rx.pop().ok(), Some(VoiceCount::new(1, 8)));
        assert!(rx.pop().is_err());
    }
}
