use crate::context::RenderCtx;

/*
Parameter Automation
====================

An AudioParam is a value that changes over time according to a schedule of
automation events. The control domain writes the schedule; the render domain
only reads it, sampling `value_at(t)` once per frame.

Vocabulary
----------

  event       A point on the timeline: (time, value) plus how the curve
              arrives there.

  set         SetValue jumps to `value` exactly at `time` and holds.

  ramp        LinearRamp arrives at `value` at `time`, interpolating in a
              straight line from the previous event.

  cancel      Removing every event at or after a given time. Whatever was
              scheduled before that time keeps defining the value.


The Shape
---------

  Schedule: Set(0.0 @ t0), Ramp(1.0 @ t1), Ramp(0.7 @ t2)

  Value
    1.0 ┐        ╱╲
        │       ╱  ╲
    0.7 │      ╱    ╲__________  (holds after the last event)
        │     ╱
    0.0 └────╱─────────────────→ Time
            t0  t1  t2

Before the first event the param sits at its default. A ramp with no event
before it starts from (0.0, default).


Releasing From Mid-Ramp
-----------------------

Cancelling a ramp that is in flight makes the value snap back to whatever
the previous event held. To release smoothly from where the curve currently
is, sample the level first, cancel, then pin it:

    let level = param.value_at(now);
    param.cancel_scheduled_values(now);
    param.set_value_at_time(level, now);
    param.linear_ramp_to_value_at_time(0.0, now + release);


Bounded History
---------------

Cancelling also compacts the events that remain before the cancel time down
to the last one. Queries never look further back than `now`, and only the
most recent past event decides the value from there on, so a voice that is
restarted thousands of times keeps a handful of events at most.
*/

/// Typical worst case: one set plus two ramps, with room for a release.
const EVENT_CAPACITY: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Automation {
    SetValue { time: f64, value: f32 },
    LinearRamp { time: f64, value: f32 },
}

impl Automation {
    pub fn time(&self) -> f64 {
        match *self {
            Automation::SetValue { time, .. } | Automation::LinearRamp { time, .. } => time,
        }
    }

    pub fn value(&self) -> f32 {
        match *self {
            Automation::SetValue { value, .. } | Automation::LinearRamp { value, .. } => value,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AudioParam {
    default: f32,
    events: Vec<Automation>,
}

impl AudioParam {
    pub fn new(default: f32) -> Self {
        Self {
            default,
            events: Vec::with_capacity(EVENT_CAPACITY),
        }
    }

    /// Set immediately: replaces the default and drops every scheduled event.
    pub fn set_value(&mut self, value: f32) {
        self.default = value;
        self.events.clear();
    }

    pub fn default_value(&self) -> f32 {
        self.default
    }

    pub fn set_value_at_time(&mut self, value: f32, time: f64) {
        self.insert(Automation::SetValue { time, value });
    }

    pub fn linear_ramp_to_value_at_time(&mut self, value: f32, time: f64) {
        self.insert(Automation::LinearRamp { time, value });
    }

    /// Remove every event scheduled at or after `from`.
    pub fn cancel_scheduled_values(&mut self, from: f64) {
        self.events.retain(|event| event.time() < from);

        if self.events.len() > 1 {
            let keep_from = self.events.len() - 1;
            self.events.drain(..keep_from);
        }
    }

    pub fn scheduled(&self) -> &[Automation] {
        &self.events
    }

    /// Whether any event lies strictly after `time`.
    pub fn has_events_after(&self, time: f64) -> bool {
        self.events.last().is_some_and(|event| event.time() > time)
    }

    pub fn value_at(&self, time: f64) -> f32 {
        let mut prev_time = 0.0;
        let mut prev_value = self.default;

        for event in &self.events {
            if event.time() <= time {
                prev_time = event.time();
                prev_value = event.value();
                continue;
            }

            return match *event {
                Automation::SetValue { .. } => prev_value,
                Automation::LinearRamp { time: end, value } => {
                    let span = end - prev_time;
                    if span <= 0.0 {
                        value
                    } else {
                        let progress = ((time - prev_time) / span) as f32;
                        prev_value + (value - prev_value) * progress
                    }
                }
            };
        }

        prev_value
    }

    /// Render one value per frame of the block.
    pub fn fill_block(&self, out: &mut [f32], ctx: &RenderCtx) {
        if !self.has_events_after(ctx.time) {
            out.fill(self.value_at(ctx.time));
            return;
        }

        for (i, sample) in out.iter_mut().enumerate() {
            *sample = self.value_at(ctx.time_at(i));
        }
    }

    fn insert(&mut self, event: Automation) {
        let index = self
            .events
            .iter()
            .position(|existing| existing.time() > event.time())
            .unwrap_or(self.events.len());
        self.events.insert(index, event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn default_holds_without_events() {
        let param = AudioParam::new(0.25);
        assert!(approx(param.value_at(0.0), 0.25));
        assert!(approx(param.value_at(100.0), 0.25));
    }

    #[test]
    fn set_then_ramps_follow_the_envelope_shape() {
        let mut param = AudioParam::new(1.0);
        param.set_value_at_time(0.0, 1.0);
        param.linear_ramp_to_value_at_time(1.0, 1.01);
        param.linear_ramp_to_value_at_time(0.7, 1.31);

        assert!(approx(param.value_at(0.5), 1.0));
        assert!(approx(param.value_at(1.0), 0.0));
        assert!(approx(param.value_at(1.005), 0.5));
        assert!(approx(param.value_at(1.01), 1.0));
        assert!(approx(param.value_at(1.16), 0.85));
        assert!(approx(param.value_at(5.0), 0.7));
    }

    #[test]
    fn set_value_at_time_holds_until_its_time() {
        let mut param = AudioParam::new(0.5);
        param.set_value_at_time(0.9, 2.0);

        assert!(approx(param.value_at(1.999), 0.5));
        assert!(approx(param.value_at(2.0), 0.9));
    }

    #[test]
    fn ramp_without_previous_event_starts_from_default_at_zero() {
        let mut param = AudioParam::new(1.0);
        param.linear_ramp_to_value_at_time(0.0, 2.0);
        assert!(approx(param.value_at(1.0), 0.5));
    }

    #[test]
    fn cancel_removes_future_events() {
        let mut param = AudioParam::new(0.0);
        param.set_value_at_time(0.0, 0.0);
        param.linear_ramp_to_value_at_time(1.0, 1.0);
        param.cancel_scheduled_values(0.5);

        // The in-flight ramp is gone; the value snaps back to the last set.
        assert!(approx(param.value_at(0.75), 0.0));
        assert_eq!(param.scheduled().len(), 1);
    }

    #[test]
    fn capture_cancel_and_ramp_releases_from_current_level() {
        let mut param = AudioParam::new(0.0);
        param.set_value_at_time(0.0, 0.0);
        param.linear_ramp_to_value_at_time(1.0, 1.0);

        let now = 0.5;
        let level = param.value_at(now);
        param.cancel_scheduled_values(now);
        param.set_value_at_time(level, now);
        param.linear_ramp_to_value_at_time(0.0, now + 0.5);

        assert!(approx(param.value_at(now), 0.5));
        assert!(approx(param.value_at(0.75), 0.25));
        assert!(approx(param.value_at(2.0), 0.0));
    }

    #[test]
    fn cancel_compacts_history_to_last_event() {
        let mut param = AudioParam::new(0.0);
        for i in 0..100 {
            let now = i as f64;
            param.cancel_scheduled_values(now);
            param.set_value_at_time(0.0, now);
            param.linear_ramp_to_value_at_time(1.0, now + 0.01);
            param.linear_ramp_to_value_at_time(0.7, now + 0.31);
        }

        assert!(param.scheduled().len() <= 4);
        assert!(approx(param.value_at(99.5), 0.7));
    }

    #[test]
    fn equal_time_events_keep_insertion_order() {
        let mut param = AudioParam::new(0.0);
        param.set_value_at_time(0.3, 1.0);
        param.set_value_at_time(0.6, 1.0);
        assert!(approx(param.value_at(1.0), 0.6));
    }

    #[test]
    fn set_value_clears_schedule() {
        let mut param = AudioParam::new(0.0);
        param.linear_ramp_to_value_at_time(1.0, 1.0);
        param.set_value(0.3);

        assert!(param.scheduled().is_empty());
        assert!(approx(param.value_at(0.5), 0.3));
    }

    #[test]
    fn fill_block_samples_each_frame() {
        let mut param = AudioParam::new(0.0);
        param.set_value_at_time(0.0, 0.0);
        param.linear_ramp_to_value_at_time(1.0, 0.004);

        let ctx = RenderCtx::new(1_000.0, 0.0);
        let mut out = [0.0f32; 6];
        param.fill_block(&mut out, &ctx);

        assert!(approx(out[0], 0.0));
        assert!(approx(out[2], 0.5));
        assert!(approx(out[4], 1.0));
        assert!(approx(out[5], 1.0));
    }
}
