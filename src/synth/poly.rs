use std::{collections::HashMap, fmt, sync::Arc};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    context::RenderCtx,
    dsp::buffer::SampleBuffer,
    effects::Bus,
    io::converter::midi_note_to_freq,
    preset::{PresetBank, SynthesisKind, TimbreId},
    synth::{
        message::{SynthMessage, VoiceCountObserver},
        pool::{VoiceHandle, VoiceId, VoicePool},
    },
    voice::Voice,
};

/*
Polyphony Manager
=================

Turns note events into voice lifecycles. A key press consumes one voice per
layer of its timbre; the manager finds those voices, starts them, and
remembers which voices belong to which note so the key release can find
them again.

Per note (pitch, timbre):

    Unheld ──note_on──→ Held ──note_off, pedal up──→ Released (entry removed)
                         │
                         └──note_off, pedal down──→ Held-Sustained
                                                       │
                                 pedal up (ReleaseOnPedalUp) → Released

Bookkeeping
-----------

  registry    Allocated voices in allocation order. Only used to choose a
              stealing victim and to count sounding voices. Never longer
              than the pool.

  pressed     (pitch, timbre) → voice handles. Handles carry the slot's
              generation, so when a voice is stolen the old note's handle
              goes stale and its note-off leaves the new owner alone.

Stealing
--------

When the requested kind has no idle voice, a sounding voice of that kind is
taken over: the oldest one not held by the pedal, or failing that the
oldest one outright. The victim is cut (gain to zero immediately), not
released. Equal start times resolve in registry order.
*/

/// What happens to key-up notes still held by the pedal when it is lifted.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SustainPolicy {
    /// Release them, like a piano damper pedal.
    #[default]
    ReleaseOnPedalUp,
    /// Leave them sounding until stolen or stopped by `all_notes_off`.
    Latch,
}

/// Sounding voices against total capacity, for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VoiceCount {
    pub active: usize,
    pub capacity: usize,
}

impl VoiceCount {
    pub fn new(active: usize, capacity: usize) -> Self {
        Self { active, capacity }
    }
}

impl fmt::Display for VoiceCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "POLYPHONY: {}/{} VOICES", self.active, self.capacity)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NoteKey {
    pub pitch: u8,
    pub timbre: TimbreId,
}

#[derive(Debug, Clone)]
struct HeldNote {
    voices: Vec<VoiceHandle>,
    key_down: bool,
}

pub struct PolyphonyManager {
    bank: Arc<PresetBank>,
    pool: VoicePool,
    registry: Vec<VoiceId>,
    pressed: HashMap<NoteKey, HeldNote>,
    sustain: bool,
    policy: SustainPolicy,
    destination: Bus,
    observer: Option<Box<dyn VoiceCountObserver>>,
}

impl PolyphonyManager {
    pub fn new(bank: Arc<PresetBank>, max_voices: usize, policy: SustainPolicy) -> Self {
        let pool = VoicePool::new(max_voices);
        Self {
            bank,
            registry: Vec::with_capacity(pool.capacity()),
            pressed: HashMap::with_capacity(max_voices),
            pool,
            sustain: false,
            policy,
            destination: Bus::Effects,
            observer: None,
        }
    }

    pub fn bank(&self) -> &Arc<PresetBank> {
        &self.bank
    }

    pub fn pool(&self) -> &VoicePool {
        &self.pool
    }

    /// Allocated voices, oldest allocation first.
    pub fn registry(&self) -> &[VoiceId] {
        &self.registry
    }

    pub fn voice(&self, id: VoiceId) -> Option<&Voice> {
        self.pool.voice(id)
    }

    pub fn is_sustain_on(&self) -> bool {
        self.sustain
    }

    pub fn sustain_policy(&self) -> SustainPolicy {
        self.policy
    }

    pub fn set_sustain_policy(&mut self, policy: SustainPolicy) {
        self.policy = policy;
    }

    /// Bus newly started voices play into.
    pub fn set_destination(&mut self, destination: Bus) {
        self.destination = destination;
    }

    pub fn set_observer(&mut self, observer: Box<dyn VoiceCountObserver>) {
        self.observer = Some(observer);
    }

    pub fn is_held(&self, pitch: u8, timbre: TimbreId) -> bool {
        self.pressed.contains_key(&NoteKey { pitch, timbre })
    }

    /// Voices recorded for a note. May include voices stolen since the
    /// note's last strike.
    pub fn held_voices(&self, pitch: u8, timbre: TimbreId) -> Option<&[VoiceHandle]> {
        self.pressed
            .get(&NoteKey { pitch, timbre })
            .map(|note| note.voices.as_slice())
    }

    /// The voice a handle points at, if it still belongs to that note.
    pub fn handle_voice(&self, handle: VoiceHandle) -> Option<&Voice> {
        if self.pool.is_current(handle) {
            self.pool.voice(handle.id)
        } else {
            None
        }
    }

    pub fn held_note_count(&self) -> usize {
        self.pressed.len()
    }

    pub fn bind_sample_buffer(&mut self, buffer: &SampleBuffer) {
        self.pool.bind_buffer(buffer);
    }

    /// Sounding voices as of the last event or render.
    pub fn voice_count(&self) -> VoiceCount {
        let active = self
            .registry
            .iter()
            .filter(|&&id| self.pool.voice(id).is_some_and(Voice::is_sounding))
            .count();
        VoiceCount::new(active, self.pool.capacity())
    }

    /// Apply release-end transitions and drop idle voices from the registry.
    pub fn reap(&mut self, now: f64) {
        for &id in &self.registry {
            if let Some(voice) = self.pool.voice_mut(id) {
                voice.update(now);
            }
        }
        let pool = &self.pool;
        self.registry
            .retain(|&id| pool.voice(id).is_some_and(Voice::is_sounding));
    }

    /// Claim a voice of `kind`, stealing one if none is idle.
    ///
    /// Only returns `None` when the kind's pool is empty.
    pub fn allocate(&mut self, kind: SynthesisKind, now: f64) -> Option<VoiceHandle> {
        self.reap(now);

        let id = match self.pool.first_free(kind) {
            Some(id) => id,
            None => self.steal(kind, now)?,
        };

        self.registry.retain(|&entry| entry != id);
        self.registry.push(id);
        self.pool.claim(id)
    }

    fn steal(&mut self, kind: SynthesisKind, now: f64) -> Option<VoiceId> {
        let pool = &self.pool;
        let candidates = || {
            self.registry
                .iter()
                .copied()
                .filter(move |id| id.kind == kind)
                .filter_map(move |id| pool.voice(id).map(|voice| (id, voice)))
        };

        let victim = oldest(candidates().filter(|(_, voice)| !voice.is_sustained()))
            .or_else(|| oldest(candidates()))?;

        let voice = self.pool.voice_mut(victim)?;
        log::debug!(
            "stealing {} voice {} (started {:.3}s, sustained: {})",
            kind.as_str(),
            victim.slot,
            voice.start_time(),
            voice.is_sustained()
        );
        voice.cut(now);
        Some(victim)
    }

    pub fn note_on(&mut self, pitch: u8, timbre: &str, now: f64) {
        self.note_on_with_velocity(pitch, timbre, 1.0, now);
    }

    pub fn note_on_with_velocity(&mut self, pitch: u8, timbre: &str, velocity: f32, now: f64) {
        match self.bank.resolve(timbre) {
            Some(id) => self.note_on_id(pitch, id, velocity, now),
            None => log::debug!("note on for unknown timbre `{timbre}` ignored"),
        }
    }

    pub fn note_on_id(&mut self, pitch: u8, timbre: TimbreId, velocity: f32, now: f64) {
        let bank = Arc::clone(&self.bank);
        let Some(descriptor) = bank.get(timbre) else {
            log::debug!("note on for unknown timbre {timbre:?} ignored");
            return;
        };

        self.reap(now);
        let frequency = midi_note_to_freq(pitch);
        let velocity = if velocity.is_finite() {
            velocity.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let mut started = Vec::with_capacity(descriptor.layer_count);

        for _ in 0..descriptor.layer_count {
            let Some(handle) = self.allocate(descriptor.kind(), now) else {
                break;
            };
            let Some(voice) = self.pool.current_mut(handle) else {
                continue;
            };

            if voice.start(frequency, velocity, self.destination, &descriptor.synthesis, now) {
                started.push(handle);
            } else {
                self.registry.retain(|&id| id != handle.id);
            }
        }

        if !started.is_empty() {
            let pool = &self.pool;
            let note = self
                .pressed
                .entry(NoteKey { pitch, timbre })
                .or_insert_with(|| HeldNote {
                    voices: Vec::with_capacity(started.len()),
                    key_down: true,
                });
            note.key_down = true;
            // Drop handles whose voices were stolen or have gone quiet.
            note.voices.retain(|&h| {
                pool.is_current(h) && pool.voice(h.id).is_some_and(Voice::is_sounding)
            });
            note.voices.extend(started);
        }

        self.publish();
    }

    pub fn note_off(&mut self, pitch: u8, timbre: &str, now: f64) {
        if let Some(id) = self.bank.resolve(timbre) {
            self.note_off_id(pitch, id, now);
        }
    }

    pub fn note_off_id(&mut self, pitch: u8, timbre: TimbreId, now: f64) {
        let key = NoteKey { pitch, timbre };
        self.reap(now);

        let Some(note) = self.pressed.get_mut(&key) else {
            return;
        };

        for &handle in &note.voices {
            if let Some(voice) = self.pool.current_mut(handle) {
                voice.stop(self.sustain, now);
            }
        }

        if self.sustain {
            note.key_down = false;
        } else {
            self.pressed.remove(&key);
        }

        self.publish();
    }

    /// Only affects later note-offs, except under [`SustainPolicy::ReleaseOnPedalUp`]
    /// where lifting the pedal also releases every key-up note it was holding.
    pub fn set_sustain(&mut self, on: bool, now: f64) {
        self.reap(now);
        let lifted = self.sustain && !on;
        self.sustain = on;

        if lifted && self.policy == SustainPolicy::ReleaseOnPedalUp {
            let pool = &mut self.pool;
            let before = self.pressed.len();
            self.pressed.retain(|_, note| {
                if note.key_down {
                    return true;
                }
                for &handle in &note.voices {
                    if let Some(voice) = pool.current_mut(handle) {
                        voice.stop(false, now);
                    }
                }
                false
            });
            log::debug!(
                "pedal up released {} sustained notes",
                before - self.pressed.len()
            );
        }

        self.publish();
    }

    /// Release every allocated voice, pedal or not, and forget all notes.
    pub fn all_notes_off(&mut self, now: f64) {
        self.reap(now);
        for &id in &self.registry {
            if let Some(voice) = self.pool.voice_mut(id) {
                voice.stop(false, now);
            }
        }
        self.pressed.clear();
        self.publish();
    }

    pub fn handle_message(&mut self, message: SynthMessage, now: f64) {
        match message {
            SynthMessage::NoteOn {
                pitch,
                timbre,
                velocity,
            } => self.note_on_id(pitch, timbre, velocity, now),
            SynthMessage::NoteOff { pitch, timbre } => self.note_off_id(pitch, timbre, now),
            SynthMessage::Sustain { on } => self.set_sustain(on, now),
            SynthMessage::AllNotesOff => self.all_notes_off(now),
        }
    }

    /// Sum every allocated voice into the bus it was routed to.
    pub fn render_block(&mut self, effects: &mut [f32], master: &mut [f32], ctx: &RenderCtx) {
        for &id in &self.registry {
            let Some(voice) = self.pool.voice_mut(id) else {
                continue;
            };
            match voice.destination() {
                Bus::Effects => voice.render_block(effects, ctx),
                Bus::Master => voice.render_block(master, ctx),
            }
        }
    }

    fn publish(&mut self) {
        let count = self.voice_count();
        if let Some(observer) = &mut self.observer {
            observer.voice_count_changed(count);
        }
    }
}

/// Earliest start time; the first of equals wins.
fn oldest<'a>(voices: impl Iterator<Item = (VoiceId, &'a Voice)>) -> Option<VoiceId> {
    voices
        .min_by(|(_, a), (_, b)| a.start_time().total_cmp(&b.start_time()))
        .map(|(id, _)| id)
}
