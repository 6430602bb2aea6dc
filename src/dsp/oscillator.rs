#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use std::f32::consts::TAU;

use crate::{dsp::param::AudioParam, error::DspError};

/*
Oscillator
==========

A phase accumulator driving a waveform lookup. The frequency is an
AudioParam, so pitch changes can be scheduled like any other automation, and
an extra per-sample `fm` input is added on top of it: that is how one
oscillator modulates another's frequency in an FM pair.

    phase    0 ────────→ 1 (wraps)
    inc      (frequency + fm) / sample_rate

A source node can be started exactly once in its lifetime. Before `start`
it outputs silence; a second `start` is a usage error. Voices that are
reused across many notes start their oscillators once and keep them
running, retuning through the frequency param.
*/

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Waveform {
    #[default]
    Sine,
    Triangle,
    Square,
    Sawtooth,
}

impl Waveform {
    /// Evaluate the waveform at `phase` in [0, 1).
    #[inline]
    pub fn evaluate(self, phase: f32) -> f32 {
        match self {
            Waveform::Sine => (phase * TAU).sin(),
            Waveform::Triangle => 1.0 - 4.0 * (phase - 0.5).abs(),
            Waveform::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Sawtooth => 2.0 * phase - 1.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Oscillator {
    waveform: Waveform,
    frequency: AudioParam,
    phase: f32,
    started: bool,
}

impl Oscillator {
    pub fn new(waveform: Waveform, frequency: f32) -> Self {
        Self {
            waveform,
            frequency: AudioParam::new(frequency),
            phase: 0.0,
            started: false,
        }
    }

    pub fn sine(frequency: f32) -> Self {
        Self::new(Waveform::Sine, frequency)
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.waveform = waveform;
    }

    pub fn frequency(&self) -> &AudioParam {
        &self.frequency
    }

    pub fn frequency_mut(&mut self) -> &mut AudioParam {
        &mut self.frequency
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn start(&mut self) -> Result<(), DspError> {
        if self.started {
            return Err(DspError::AlreadyStarted);
        }
        self.started = true;
        Ok(())
    }

    /// Next output sample at clock `time`, with `fm` Hz added to the frequency.
    #[inline]
    pub fn next_sample(&mut self, time: f64, sample_rate: f32, fm: f32) -> f32 {
        if !self.started {
            return 0.0;
        }

        let value = self.waveform.evaluate(self.phase);
        let frequency = self.frequency.value_at(time) + fm;
        self.phase = (self.phase + frequency / sample_rate).rem_euclid(1.0);
        value
    }
}
