use crate::{dsp::param::AudioParam, effects::Bus};

/*
Voice Envelope
==============

Every voice, whatever produces its sound, shares the same lifecycle around a
single output gain param. All stage changes are scheduled on the gain at the
audio-clock time of the event; the render domain just samples the curve.

  Gain
  vel ┐     ╱╲
      │    ╱  ╲_____________        FM: decays to 0.7 × velocity
      │   ╱                 ╲       SAMPLE: holds at velocity
  0.0 └──╱───────────────────╲──→ Time
       start              stop   release_end
        │← attack →│       │← release →│+10ms

Lifecycle Flags
---------------

  active      Producing sound or mid-release. Cleared once the clock passes
              `release_end`, or immediately when the voice is cut.

  sustained   Key released while the pedal held the note open. The envelope
              is left untouched; only the flag changes.

  releasing   A release ramp is scheduled (`release_end` is set). A second
              stop is then a no-op, which is what makes stopping twice safe.

Deactivation is a scheduled state transition checked against the clock in
`update`, never a timer, so it is deterministic under test.
*/

/// Extra time after the release ramp before the voice is considered free.
pub const RELEASE_TAIL: f64 = 0.01;

#[derive(Debug, Clone)]
pub struct VoiceEnvelope {
    gain: AudioParam,
    active: bool,
    sustained: bool,
    start_time: f64,
    release_end: Option<f64>,
    destination: Bus,
}

impl VoiceEnvelope {
    pub fn new() -> Self {
        Self {
            gain: AudioParam::new(0.0),
            active: false,
            sustained: false,
            start_time: 0.0,
            release_end: None,
            destination: Bus::Effects,
        }
    }

    pub fn gain(&self) -> &AudioParam {
        &self.gain
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_sustained(&self) -> bool {
        self.sustained
    }

    pub fn is_releasing(&self) -> bool {
        self.release_end.is_some()
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    pub fn release_end(&self) -> Option<f64> {
        self.release_end
    }

    pub fn destination(&self) -> Bus {
        self.destination
    }

    /// Attack to `peak`, then an optional linear decay to `(level, decay)`.
    pub fn trigger(
        &mut self,
        peak: f32,
        attack: f32,
        decay_to: Option<(f32, f32)>,
        destination: Bus,
        now: f64,
    ) {
        self.active = true;
        self.sustained = false;
        self.release_end = None;
        self.start_time = now;
        self.destination = destination;

        let attack_end = now + attack as f64;
        self.gain.cancel_scheduled_values(now);
        self.gain.set_value_at_time(0.0, now);
        self.gain.linear_ramp_to_value_at_time(peak, attack_end);
        if let Some((level, decay)) = decay_to {
            let decay_end = attack_end + decay as f64;
            self.gain.linear_ramp_to_value_at_time(level, decay_end);
        }
    }

    /// Mark held by the pedal. Ignored unless sounding and not releasing.
    pub fn sustain(&mut self) {
        if self.active && !self.is_releasing() {
            self.sustained = true;
        }
    }

    /// Ramp from the current level to silence. Returns the release end, or
    /// `None` when there was nothing to release.
    pub fn release(&mut self, release: f32, now: f64) -> Option<f64> {
        if !self.active || self.is_releasing() {
            return None;
        }

        let level = self.gain.value_at(now);
        self.gain.cancel_scheduled_values(now);
        self.gain.set_value_at_time(level, now);
        self.gain.linear_ramp_to_value_at_time(0.0, now + release as f64);

        let end = now + release as f64 + RELEASE_TAIL;
        self.sustained = false;
        self.release_end = Some(end);
        Some(end)
    }

    /// Immediate silence, no ramp.
    pub fn cut(&mut self, now: f64) {
        self.gain.cancel_scheduled_values(now);
        self.gain.set_value_at_time(0.0, now);
        self.active = false;
        self.sustained = false;
        self.release_end = None;
    }

    /// Apply the release-end transition. Returns true if the voice just went idle.
    pub fn update(&mut self, now: f64) -> bool {
        match self.release_end {
            Some(end) if now >= end => {
                self.active = false;
                self.sustained = false;
                self.release_end = None;
                true
            }
            _ => false,
        }
    }
}

impl Default for VoiceEnvelope {
    fn default() -> Self {
        Self::new()
    }
}
