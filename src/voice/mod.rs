//! Voices: the units of sound production a note is made of.
//!
//! A voice's synthesis kind is fixed when it is constructed; the pool hands
//! out FM voices for FM timbres and sample voices for sample timbres. Both
//! kinds share one contract (start, stop, cut, update, render), dispatched
//! by matching on the closed [`Voice`] enum.

pub mod envelope;
pub mod fm;
pub mod sampler;

pub use envelope::VoiceEnvelope;
pub use fm::FmVoice;
pub use sampler::SampleVoice;

use crate::{
    context::RenderCtx,
    dsp::buffer::SampleBuffer,
    effects::Bus,
    preset::{Synthesis, SynthesisKind},
};

#[derive(Debug, Clone)]
pub enum Voice {
    Fm(FmVoice),
    Sample(SampleVoice),
}

impl Voice {
    pub fn new(kind: SynthesisKind) -> Self {
        match kind {
            SynthesisKind::Fm => Voice::Fm(FmVoice::new()),
            SynthesisKind::Sample => Voice::Sample(SampleVoice::new()),
        }
    }

    pub fn kind(&self) -> SynthesisKind {
        match self {
            Voice::Fm(_) => SynthesisKind::Fm,
            Voice::Sample(_) => SynthesisKind::Sample,
        }
    }

    pub fn envelope(&self) -> &VoiceEnvelope {
        match self {
            Voice::Fm(voice) => voice.envelope(),
            Voice::Sample(voice) => voice.envelope(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.envelope().is_active()
    }

    pub fn is_sustained(&self) -> bool {
        self.envelope().is_sustained()
    }

    /// Counts toward polyphony: sounding, releasing or held by the pedal.
    pub fn is_sounding(&self) -> bool {
        self.is_active() || self.is_sustained()
    }

    pub fn start_time(&self) -> f64 {
        self.envelope().start_time()
    }

    /// Start a note. Returns whether the voice is now sounding; false when
    /// the parameters belong to the other kind or a sample voice has no
    /// buffer bound yet.
    pub fn start(
        &mut self,
        frequency: f32,
        velocity: f32,
        destination: Bus,
        synthesis: &Synthesis,
        now: f64,
    ) -> bool {
        match (self, synthesis) {
            (Voice::Fm(voice), Synthesis::Fm(operators)) => {
                voice.start(frequency, velocity, destination, operators, now);
                true
            }
            (Voice::Sample(voice), Synthesis::Sample(params)) => {
                voice.start(frequency, velocity, destination, params, now)
            }
            _ => false,
        }
    }

    /// Release the note, or just mark it sustained while the pedal is down.
    pub fn stop(&mut self, sustain_active: bool, now: f64) {
        match self {
            Voice::Fm(voice) => voice.stop(sustain_active, now),
            Voice::Sample(voice) => voice.stop(sustain_active, now),
        }
    }

    /// Silence immediately, ignoring sustain. Used when stealing.
    pub fn cut(&mut self, now: f64) {
        match self {
            Voice::Fm(voice) => voice.cut(now),
            Voice::Sample(voice) => voice.cut(now),
        }
    }

    /// Apply scheduled state transitions up to `now`.
    pub fn update(&mut self, now: f64) -> bool {
        match self {
            Voice::Fm(voice) => voice.update(now),
            Voice::Sample(voice) => voice.update(now),
        }
    }

    pub fn bind_buffer(&mut self, buffer: SampleBuffer) {
        if let Voice::Sample(voice) = self {
            voice.bind_buffer(buffer);
        }
    }

    pub fn destination(&self) -> Bus {
        self.envelope().destination()
    }

    /// Sum this voice into `out`.
    pub fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        match self {
            Voice::Fm(voice) => voice.render_block(out, ctx),
            Voice::Sample(voice) => voice.render_block(out, ctx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preset::SampleParams;

    #[test]
    fn kind_is_fixed_at_construction() {
        assert_eq!(Voice::new(SynthesisKind::Fm).kind(), SynthesisKind::Fm);
        assert_eq!(Voice::new(SynthesisKind::Sample).kind(), SynthesisKind::Sample);
    }

    #[test]
    fn mismatched_parameters_do_not_start() {
        let mut voice = Voice::new(SynthesisKind::Fm);
        let params = Synthesis::Sample(SampleParams::default());
        assert!(!voice.start(440.0, 1.0, Bus::Effects, &params, 0.0));
        assert!(!voice.is_active());
    }

    #[test]
    fn sustained_voice_keeps_sounding() {
        let mut voice = Voice::new(SynthesisKind::Fm);
        voice.start(440.0, 1.0, Bus::Effects, &Synthesis::Fm(vec![]), 0.0);
        voice.stop(true, 0.5);

        assert!(voice.is_active());
        assert!(voice.is_sustained());
        assert!(voice.is_sounding());
        assert!(!voice.update(100.0));
    }

    #[test]
    fn stopping_twice_converges_to_idle() {
        let mut voice = Voice::new(SynthesisKind::Fm);
        voice.start(440.0, 1.0, Bus::Effects, &Synthesis::Fm(vec![]), 0.0);
        voice.stop(false, 0.5);
        voice.stop(false, 0.6);

        voice.update(1.02);
        assert!(!voice.is_sounding());
    }

    #[test]
    fn bind_buffer_ignores_fm_voices() {
        let mut voice = Voice::new(SynthesisKind::Fm);
        voice.bind_buffer(SampleBuffer::silent(0.1, 48_000.0));
        assert_eq!(voice.kind(), SynthesisKind::Fm);
    }
}
