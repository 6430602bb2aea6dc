use crate::{
    context::RenderCtx,
    dsp::oscillator::Oscillator,
    effects::Bus,
    preset::FmOperator,
    voice::envelope::VoiceEnvelope,
};

/*
FM Voice
========

Three sine operators, of which two form a fixed modulator/carrier pair:

    op0 (modulator) ──× MODULATOR_GAIN──→ op2.frequency
    op2 (carrier)   ──→ envelope gain ──→ destination bus
    op1             tuned, not routed

Operator frequency = fundamental × ratio. The ratios come from the timbre;
missing operators fall back to DEFAULT_RATIOS.

The modulator reaches the carrier's frequency through a unity gain stage, so
the deviation is ±1 Hz. The timbre's per-operator envelope stages are carried
in the descriptor but do not shape the voice: amplitude follows the fixed
envelope below.
*/

pub const ATTACK: f32 = 0.01;
pub const DECAY: f32 = 0.3;
pub const SUSTAIN_RATIO: f32 = 0.7;
pub const RELEASE: f32 = 0.5;

pub const OPERATOR_COUNT: usize = 3;
pub const DEFAULT_RATIOS: [f32; OPERATOR_COUNT] = [1.0, 1.41, 1.0];
pub const MODULATOR_GAIN: f32 = 1.0;

const MODULATOR: usize = 0;
const CARRIER: usize = 2;

#[derive(Debug, Clone)]
pub struct FmVoice {
    envelope: VoiceEnvelope,
    operators: [Oscillator; OPERATOR_COUNT],
}

impl FmVoice {
    pub fn new() -> Self {
        Self {
            envelope: VoiceEnvelope::new(),
            operators: std::array::from_fn(|_| Oscillator::sine(440.0)),
        }
    }

    pub fn envelope(&self) -> &VoiceEnvelope {
        &self.envelope
    }

    pub fn operator(&self, index: usize) -> Option<&Oscillator> {
        self.operators.get(index)
    }

    pub fn start(
        &mut self,
        frequency: f32,
        velocity: f32,
        destination: Bus,
        operators: &[FmOperator],
        now: f64,
    ) {
        for (i, osc) in self.operators.iter_mut().enumerate() {
            let ratio = operators
                .get(i)
                .map(|op| op.ratio)
                .unwrap_or(DEFAULT_RATIOS[i]);
            let param = osc.frequency_mut();
            param.cancel_scheduled_values(now);
            param.set_value_at_time(frequency * ratio, now);

            if !osc.is_started() {
                let _ = osc.start();
            }
        }

        self.envelope.trigger(
            velocity,
            ATTACK,
            Some((velocity * SUSTAIN_RATIO, DECAY)),
            destination,
            now,
        );
    }

    pub fn stop(&mut self, sustain_active: bool, now: f64) {
        if sustain_active {
            self.envelope.sustain();
        } else {
            self.envelope.release(RELEASE, now);
        }
    }

    pub fn cut(&mut self, now: f64) {
        self.envelope.cut(now);
    }

    pub fn update(&mut self, now: f64) -> bool {
        self.envelope.update(now)
    }

    /// Sum this voice into `out`.
    pub fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        if !self.envelope.is_active() {
            return;
        }

        let [modulator, _, carrier] = &mut self.operators;
        for (i, sample) in out.iter_mut().enumerate() {
            let t = ctx.time_at(i);
            let fm = modulator.next_sample(t, ctx.sample_rate, 0.0) * MODULATOR_GAIN;
            let tone = carrier.next_sample(t, ctx.sample_rate, fm);
            *sample += tone * self.envelope.gain().value_at(t);
        }
    }
}

impl Default for FmVoice {
    fn default() -> Self {
        Self::new()
    }
}
