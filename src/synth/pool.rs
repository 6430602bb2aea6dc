use crate::{
    dsp::buffer::SampleBuffer,
    preset::SynthesisKind,
    voice::Voice,
};

/// Address of a voice: which pool, which slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VoiceId {
    pub kind: SynthesisKind,
    pub slot: usize,
}

/// A claim on a voice at a point in its history.
///
/// Every allocation bumps the slot's generation, so a handle taken for one
/// note goes stale as soon as the voice is stolen for another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VoiceHandle {
    pub id: VoiceId,
    pub generation: u32,
}

#[derive(Debug, Clone)]
struct Slot {
    voice: Voice,
    generation: u32,
}

/// Two fixed arenas of pre-built voices, one per synthesis kind.
///
/// Sized once at construction (`max_voices / 2` each) and never resized.
/// Finding a free voice is a linear scan in slot order: O(pool size).
#[derive(Debug, Clone)]
pub struct VoicePool {
    fm: Vec<Slot>,
    sample: Vec<Slot>,
}

impl VoicePool {
    pub fn new(max_voices: usize) -> Self {
        let per_kind = max_voices / 2;
        let build = |kind: SynthesisKind| -> Vec<Slot> {
            (0..per_kind)
                .map(|_| Slot {
                    voice: Voice::new(kind),
                    generation: 0,
                })
                .collect()
        };

        Self {
            fm: build(SynthesisKind::Fm),
            sample: build(SynthesisKind::Sample),
        }
    }

    fn slots(&self, kind: SynthesisKind) -> &[Slot] {
        match kind {
            SynthesisKind::Fm => &self.fm,
            SynthesisKind::Sample => &self.sample,
        }
    }

    fn slots_mut(&mut self, kind: SynthesisKind) -> &mut [Slot] {
        match kind {
            SynthesisKind::Fm => &mut self.fm,
            SynthesisKind::Sample => &mut self.sample,
        }
    }

    pub fn capacity(&self) -> usize {
        self.fm.len() + self.sample.len()
    }

    pub fn kind_capacity(&self, kind: SynthesisKind) -> usize {
        self.slots(kind).len()
    }

    pub fn voice(&self, id: VoiceId) -> Option<&Voice> {
        self.slots(id.kind).get(id.slot).map(|slot| &slot.voice)
    }

    pub fn voice_mut(&mut self, id: VoiceId) -> Option<&mut Voice> {
        self.slots_mut(id.kind)
            .get_mut(id.slot)
            .map(|slot| &mut slot.voice)
    }

    /// First inactive voice of `kind`, in slot order.
    pub fn first_free(&self, kind: SynthesisKind) -> Option<VoiceId> {
        self.slots(kind)
            .iter()
            .position(|slot| !slot.voice.is_sounding())
            .map(|slot| VoiceId { kind, slot })
    }

    /// Take ownership of the voice for a new note.
    pub fn claim(&mut self, id: VoiceId) -> Option<VoiceHandle> {
        let slot = self.slots_mut(id.kind).get_mut(id.slot)?;
        slot.generation = slot.generation.wrapping_add(1);
        Some(VoiceHandle {
            id,
            generation: slot.generation,
        })
    }

    /// The voice behind `handle`, if it has not been reclaimed since.
    pub fn current_mut(&mut self, handle: VoiceHandle) -> Option<&mut Voice> {
        self.slots_mut(handle.id.kind)
            .get_mut(handle.id.slot)
            .filter(|slot| slot.generation == handle.generation)
            .map(|slot| &mut slot.voice)
    }

    pub fn is_current(&self, handle: VoiceHandle) -> bool {
        self.slots(handle.id.kind)
            .get(handle.id.slot)
            .is_some_and(|slot| slot.generation == handle.generation)
    }

    pub fn voices(&self) -> impl Iterator<Item = &Voice> {
        self.fm.iter().chain(self.sample.iter()).map(|slot| &slot.voice)
    }

    /// Bind the shared sample buffer to every sample voice.
    pub fn bind_buffer(&mut self, buffer: &SampleBuffer) {
        for slot in &mut self.sample {
            slot.voice.bind_buffer(buffer.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{effects::Bus, preset::Synthesis};

    #[test]
    fn splits_capacity_between_kinds() {
        let pool = VoicePool::new(256);
        assert_eq!(pool.capacity(), 256);
        assert_eq!(pool.kind_capacity(SynthesisKind::Fm), 128);
        assert_eq!(pool.kind_capacity(SynthesisKind::Sample), 128);
        assert!(pool
            .voices()
            .take(128)
            .all(|v| v.kind() == SynthesisKind::Fm));
    }

    #[test]
    fn odd_capacity_rounds_down() {
        let pool = VoicePool::new(5);
        assert_eq!(pool.kind_capacity(SynthesisKind::Fm), 2);
        assert_eq!(pool.capacity(), 4);
    }

    #[test]
    fn first_free_scans_in_slot_order() {
        let mut pool = VoicePool::new(8);
        let first = pool.first_free(SynthesisKind::Fm).unwrap();
        assert_eq!(first.slot, 0);

        pool.voice_mut(first)
            .unwrap()
            .start(440.0, 1.0, Bus::Effects, &Synthesis::Fm(vec![]), 0.0);
        assert_eq!(pool.first_free(SynthesisKind::Fm).unwrap().slot, 1);
    }

    #[test]
    fn claim_invalidates_older_handles() {
        let mut pool = VoicePool::new(4);
        let id = VoiceId {
            kind: SynthesisKind::Sample,
            slot: 1,
        };
        let old = pool.claim(id).unwrap();
        let new = pool.claim(id).unwrap();

        assert!(!pool.is_current(old));
        assert!(pool.is_current(new));
        assert!(pool.current_mut(old).is_none());
        assert!(pool.current_mut(new).is_some());
    }

    #[test]
    fn out_of_range_ids_are_rejected() {
        let mut pool = VoicePool::new(2);
        let id = VoiceId {
            kind: SynthesisKind::Fm,
            slot: 7,
        };
        assert!(pool.voice(id).is_none());
        assert!(pool.claim(id).is_none());
    }
}
