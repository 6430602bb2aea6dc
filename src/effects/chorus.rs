use crate::{
    context::RenderCtx,
    dsp::{delay::DelayLine, oscillator::Oscillator, param::AudioParam},
    effects::EffectNode,
};

/*
Chorus Stage
============

Chorus thickens a sound by summing the dry signal with a copy whose delay
time is slowly swept by an LFO. As the delay shortens and lengthens the copy
is pitched slightly up and down, so one voice sounds like several.

    x ──┬──────────────────────────┐
        │                          + ──→ out
        └─→ delay(25ms ± 5ms) ─────┘
                  ↑
             sine LFO 0.5Hz

Both paths are at unity: this is a doubling, not a crossfade, so the stage
adds level. The LFO is an ordinary oscillator whose output is scaled by the
depth param (in seconds) and added to the base delay-time param.
*/

pub const BASE_DELAY: f32 = 0.025;
pub const MOD_DEPTH: f32 = 0.005;
pub const MOD_RATE: f32 = 0.5;
pub const MAX_DELAY: f32 = 0.1;

pub struct ChorusStage {
    delay_line: DelayLine,
    delay_time: AudioParam,
    depth: AudioParam,
    lfo: Oscillator,
}

impl ChorusStage {
    pub fn new(sample_rate: f32) -> Self {
        let mut lfo = Oscillator::sine(MOD_RATE);
        // A fresh oscillator cannot already be started.
        let _ = lfo.start();

        Self {
            delay_line: DelayLine::with_max_delay(MAX_DELAY, sample_rate),
            delay_time: AudioParam::new(BASE_DELAY),
            depth: AudioParam::new(MOD_DEPTH),
            lfo,
        }
    }

    /// Base delay time, in seconds.
    pub fn delay_time_mut(&mut self) -> &mut AudioParam {
        &mut self.delay_time
    }

    /// Sweep depth, in seconds.
    pub fn depth_mut(&mut self) -> &mut AudioParam {
        &mut self.depth
    }

    /// LFO rate, in Hz.
    pub fn rate_mut(&mut self) -> &mut AudioParam {
        self.lfo.frequency_mut()
    }
}

impl EffectNode for ChorusStage {
    fn render_block(&mut self, buffer: &mut [f32], ctx: &RenderCtx) {
        let sample_rate = ctx.sample_rate;

        for (i, sample) in buffer.iter_mut().enumerate() {
            let t = ctx.time_at(i);
            let sweep = self.lfo.next_sample(t, sample_rate, 0.0) * self.depth.value_at(t);
            let delay = (self.delay_time.value_at(t) + sweep).clamp(0.0, MAX_DELAY);

            let wet = self.delay_line.next_sample(*sample, delay * sample_rate);
            *sample += wet;
        }
    }

    fn reset(&mut self) {
        self.delay_line.reset();
    }
}
