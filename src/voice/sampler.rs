use crate::{
    context::RenderCtx,
    dsp::{buffer::SampleBuffer, buffer_player::BufferPlayer},
    effects::Bus,
    error::DspError,
    preset::SampleParams,
    voice::envelope::VoiceEnvelope,
};

/// Frequency of MIDI note 60, the pitch the shared sample was recorded at.
pub const REFERENCE_FREQUENCY: f32 = 261.63;

/// Looping sample playback, pitched by playback rate.
///
/// The shared buffer is bound once after the engine's resources load; until
/// then `start` does nothing. Each note gets a fresh one-shot player whose
/// stop is scheduled at the end of the release.
#[derive(Debug, Clone)]
pub struct SampleVoice {
    envelope: VoiceEnvelope,
    buffer: Option<SampleBuffer>,
    player: Option<BufferPlayer>,
    release: f32,
}

impl SampleVoice {
    pub fn new() -> Self {
        Self {
            envelope: VoiceEnvelope::new(),
            buffer: None,
            player: None,
            release: SampleParams::default().release,
        }
    }

    pub fn envelope(&self) -> &VoiceEnvelope {
        &self.envelope
    }

    pub fn player(&self) -> Option<&BufferPlayer> {
        self.player.as_ref()
    }

    pub fn bind_buffer(&mut self, buffer: SampleBuffer) {
        self.buffer = Some(buffer);
    }

    pub fn has_buffer(&self) -> bool {
        self.buffer.is_some()
    }

    /// Returns false, leaving the voice idle, when no buffer is bound yet.
    pub fn start(
        &mut self,
        frequency: f32,
        velocity: f32,
        destination: Bus,
        params: &SampleParams,
        now: f64,
    ) -> bool {
        let Some(buffer) = &self.buffer else {
            log::debug!("sample voice started before its buffer was bound");
            return false;
        };

        if let Some(mut previous) = self.player.take() {
            ignore_redundant_stop(previous.stop(now));
        }

        let mut player = BufferPlayer::new(buffer.clone());
        player.set_loop(true);
        player
            .playback_rate_mut()
            .set_value_at_time(frequency / REFERENCE_FREQUENCY, now);
        // A fresh player cannot already be started.
        let _ = player.start(now);
        self.player = Some(player);

        self.release = params.release;
        self.envelope
            .trigger(velocity, params.attack, None, destination, now);
        true
    }

    pub fn stop(&mut self, sustain_active: bool, now: f64) {
        if sustain_active {
            self.envelope.sustain();
            return;
        }

        if let Some(end) = self.envelope.release(self.release, now) {
            if let Some(player) = &mut self.player {
                ignore_redundant_stop(player.stop(end));
            }
        }
    }

    pub fn cut(&mut self, now: f64) {
        self.envelope.cut(now);
        if let Some(mut player) = self.player.take() {
            ignore_redundant_stop(player.stop(now));
        }
    }

    pub fn update(&mut self, now: f64) -> bool {
        let idle = self.envelope.update(now);
        if idle {
            self.player = None;
        }
        idle
    }

    /// Sum this voice into `out`.
    pub fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        if !self.envelope.is_active() {
            return;
        }
        let Some(player) = &mut self.player else {
            return;
        };

        for (i, sample) in out.iter_mut().enumerate() {
            let t = ctx.time_at(i);
            *sample += player.next_sample(t, ctx.sample_rate) * self.envelope.gain().value_at(t);
        }
    }
}

impl Default for SampleVoice {
    fn default() -> Self {
        Self::new()
    }
}

/// Stopping a player twice is a normal race between a steal and a release.
fn ignore_redundant_stop(result: Result<(), DspError>) {
    if let Err(err) = result {
        log::trace!("suppressed buffer player stop: {err}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 48_000.0;

    fn pad() -> SampleParams {
        SampleParams {
            source_buffer_ref: "pad.wav".to_owned(),
            attack: 1.5,
            release: 2.0,
        }
    }

    fn tone() -> SampleBuffer {
        SampleBuffer::new((0..4_800).map(|i| (i as f32 * 0.05).sin()).collect(), SR)
    }

    #[test]
    fn start_without_buffer_is_a_no_op() {
        let mut voice = SampleVoice::new();
        assert!(!voice.start(261.63, 1.0, Bus::Effects, &pad(), 0.0));
        assert!(!voice.envelope().is_active());
        assert!(voice.player().is_none());
    }

    #[test]
    fn playback_rate_tracks_pitch() {
        let mut voice = SampleVoice::new();
        voice.bind_buffer(tone());
        assert!(voice.start(523.26, 1.0, Bus::Effects, &pad(), 0.0));

        let player = voice.player().unwrap();
        assert!(player.is_looping());
        assert!((player.playback_rate().value_at(0.0) - 2.0).abs() < 1e-4);
    }

    #[test]
    fn holds_at_velocity_after_attack() {
        let mut voice = SampleVoice::new();
        voice.bind_buffer(tone());
        voice.start(261.63, 0.6, Bus::Effects, &pad(), 0.0);

        let gain = voice.envelope().gain();
        assert!((gain.value_at(0.75) - 0.3).abs() < 1e-4);
        assert!((gain.value_at(10.0) - 0.6).abs() < 1e-4);
    }

    #[test]
    fn release_schedules_player_stop_at_release_end() {
        let mut voice = SampleVoice::new();
        voice.bind_buffer(tone());
        voice.start(261.63, 1.0, Bus::Effects, &pad(), 0.0);
        voice.stop(false, 3.0);

        let stop = voice.player().unwrap().stop_time().unwrap();
        assert!((stop - 5.01).abs() < 1e-9);

        assert!(!voice.update(5.0));
        assert!(voice.update(5.02));
        assert!(voice.player().is_none());
    }

    #[test]
    fn double_stop_converges_to_inactive() {
        let mut voice = SampleVoice::new();
        voice.bind_buffer(tone());
        voice.start(261.63, 1.0, Bus::Effects, &pad(), 0.0);

        voice.stop(false, 1.0);
        voice.stop(false, 1.5);
        voice.cut(2.0);
        voice.stop(false, 2.5);

        assert!(!voice.envelope().is_active());
        assert!(voice.player().is_none());
    }

    #[test]
    fn renders_buffer_through_envelope() {
        let mut voice = SampleVoice::new();
        voice.bind_buffer(SampleBuffer::new(vec![1.0; 4_800], SR));
        let fast = SampleParams {
            attack: 0.0,
            ..pad()
        };
        voice.start(261.63, 0.5, Bus::Effects, &fast, 0.0);

        let mut out = vec![0.0; 64];
        voice.render_block(&mut out, &RenderCtx::new(SR, 0.0));
        assert!(out[1..].iter().all(|&s| (s - 0.5).abs() < 1e-3));
    }
}
