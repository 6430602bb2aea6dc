use crate::{
    dsp::{buffer::SampleBuffer, param::AudioParam},
    error::DspError,
};

/// One-shot player over a shared [`SampleBuffer`].
///
/// Like every source node it can be started once and stopped once. The stop
/// is scheduled for a clock time; from that time on the player is silent and
/// reports itself finished. A second stop is reported as
/// [`DspError::AlreadyStopped`] so callers can decide whether that matters.
#[derive(Debug, Clone)]
pub struct BufferPlayer {
    buffer: SampleBuffer,
    looping: bool,
    playback_rate: AudioParam,
    position: f64,
    start_time: Option<f64>,
    stop_time: Option<f64>,
}

impl BufferPlayer {
    pub fn new(buffer: SampleBuffer) -> Self {
        Self {
            buffer,
            looping: false,
            playback_rate: AudioParam::new(1.0),
            position: 0.0,
            start_time: None,
            stop_time: None,
        }
    }

    pub fn buffer(&self) -> &SampleBuffer {
        &self.buffer
    }

    pub fn set_loop(&mut self, looping: bool) {
        self.looping = looping;
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn playback_rate(&self) -> &AudioParam {
        &self.playback_rate
    }

    pub fn playback_rate_mut(&mut self) -> &mut AudioParam {
        &mut self.playback_rate
    }

    pub fn start(&mut self, when: f64) -> Result<(), DspError> {
        if self.start_time.is_some() {
            return Err(DspError::AlreadyStarted);
        }
        self.start_time = Some(when);
        Ok(())
    }

    pub fn stop(&mut self, when: f64) -> Result<(), DspError> {
        if self.start_time.is_none() {
            return Err(DspError::NotStarted);
        }
        if self.stop_time.is_some() {
            return Err(DspError::AlreadyStopped);
        }
        self.stop_time = Some(when);
        Ok(())
    }

    pub fn stop_time(&self) -> Option<f64> {
        self.stop_time
    }

    /// Whether playback has ended by clock `time`.
    pub fn is_finished(&self, time: f64) -> bool {
        if self.stop_time.is_some_and(|stop| time >= stop) {
            return true;
        }
        !self.looping && self.position >= self.buffer.len() as f64
    }

    #[inline]
    pub fn next_sample(&mut self, time: f64, sample_rate: f32) -> f32 {
        let Some(start) = self.start_time else {
            return 0.0;
        };
        if time < start || self.is_finished(time) {
            return 0.0;
        }

        let len = self.buffer.len() as f64;
        if self.looping && len > 0.0 && self.position >= len {
            self.position %= len;
        }

        let value = self.buffer.read_interpolated(self.position, self.looping);
        let step = self.playback_rate.value_at(time) as f64 * self.buffer.sample_rate() as f64
            / sample_rate as f64;
        self.position += step;
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp_buffer(len: usize) -> SampleBuffer {
        SampleBuffer::new((0..len).map(|i| i as f32).collect(), 100.0)
    }

    #[test]
    fn silent_before_start() {
        let mut player = BufferPlayer::new(ramp_buffer(4));
        assert_eq!(player.next_sample(0.0, 100.0), 0.0);
    }

    #[test]
    fn plays_at_playback_rate() {
        let mut player = BufferPlayer::new(ramp_buffer(16));
        player.playback_rate_mut().set_value(2.0);
        player.start(0.0).unwrap();

        let out: Vec<f32> = (0..4)
            .map(|i| player.next_sample(i as f64 / 100.0, 100.0))
            .collect();
        assert_eq!(out, vec![0.0, 2.0, 4.0, 6.0]);
    }

    #[test]
    fn loops_when_enabled() {
        let mut player = BufferPlayer::new(ramp_buffer(3));
        player.set_loop(true);
        player.start(0.0).unwrap();

        let out: Vec<f32> = (0..7)
            .map(|i| player.next_sample(i as f64 / 100.0, 100.0))
            .collect();
        assert_eq!(out, vec![0.0, 1.0, 2.0, 0.0, 1.0, 2.0, 0.0]);
    }

    #[test]
    fn one_shot_ends_at_buffer_end() {
        let mut player = BufferPlayer::new(ramp_buffer(2));
        player.start(0.0).unwrap();
        player.next_sample(0.0, 100.0);
        player.next_sample(0.01, 100.0);
        assert!(player.is_finished(0.02));
        assert_eq!(player.next_sample(0.02, 100.0), 0.0);
    }

    #[test]
    fn scheduled_stop_silences() {
        let mut player = BufferPlayer::new(ramp_buffer(100));
        player.set_loop(true);
        player.start(0.0).unwrap();
        player.stop(0.05).unwrap();

        assert!(!player.is_finished(0.04));
        assert!(player.is_finished(0.05));
        assert_eq!(player.next_sample(0.06, 100.0), 0.0);
    }

    #[test]
    fn start_and_stop_are_one_shot() {
        let mut player = BufferPlayer::new(ramp_buffer(4));
        assert_eq!(player.stop(0.0), Err(DspError::NotStarted));

        player.start(0.0).unwrap();
        assert_eq!(player.start(0.0), Err(DspError::AlreadyStarted));

        player.stop(1.0).unwrap();
        assert_eq!(player.stop(2.0), Err(DspError::AlreadyStopped));
        assert_eq!(player.stop_time(), Some(1.0));
    }
}
