/// Fractional delay line over a fixed-capacity ring buffer.
///
/// Reads interpolate linearly between the two nearest stored samples, so the
/// delay time can be swept smoothly (chorus, vibrato) without zipper noise.
#[derive(Debug, Clone)]
pub struct DelayLine {
    buffer: Vec<f32>,
    write_pos: usize,
}

impl DelayLine {
    /// Delay line able to hold up to `max_delay_samples` of history.
    pub fn new(max_delay_samples: usize) -> Self {
        Self {
            buffer: vec![0.0; max_delay_samples.max(1) + 2],
            write_pos: 0,
        }
    }

    /// Sized for `max_delay` seconds at `sample_rate`.
    pub fn with_max_delay(max_delay: f32, sample_rate: f32) -> Self {
        Self::new((max_delay * sample_rate).ceil() as usize)
    }

    /// Longest delay, in samples, a read can reach.
    pub fn capacity(&self) -> usize {
        self.buffer.len() - 2
    }

    pub fn write(&mut self, sample: f32) {
        self.buffer[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
    }

    /// Sample written `delay_samples` writes ago, clamped to `[1, capacity]`.
    pub fn read_interpolated(&self, delay_samples: f32) -> f32 {
        let len = self.buffer.len();
        let delay = delay_samples.clamp(1.0, self.capacity() as f32);

        let whole = delay.floor() as usize;
        let frac = delay - whole as f32;

        let newer = (self.write_pos + len - whole) % len;
        let older = (newer + len - 1) % len;

        self.buffer[newer] * (1.0 - frac) + self.buffer[older] * frac
    }

    /// Read `delay_samples` back, then write `sample`.
    pub fn next_sample(&mut self, sample: f32, delay_samples: f32) -> f32 {
        let delayed = self.read_interpolated(delay_samples);
        self.write(sample);
        delayed
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_delay_returns_past_sample() {
        let mut delay = DelayLine::new(16);
        let mut outputs = Vec::new();
        for i in 0..8 {
            outputs.push(delay.next_sample(i as f32, 3.0));
        }
        // The read happens before the write, so a delay of 3 lags by 3 samples.
        assert_eq!(outputs, vec![0.0, 0.0, 0.0, 0.0, 1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn fractional_delay_interpolates() {
        let mut delay = DelayLine::new(16);
        for i in 0..8 {
            delay.write(i as f32);
        }
        // Last write was 7; one back is 7, two back is 6.
        assert!((delay.read_interpolated(1.0) - 7.0).abs() < 1e-6);
        assert!((delay.read_interpolated(1.5) - 6.5).abs() < 1e-6);
    }

    #[test]
    fn delay_is_clamped_to_capacity() {
        let mut delay = DelayLine::new(4);
        for i in 0..10 {
            delay.write(i as f32);
        }
        assert_eq!(delay.read_interpolated(100.0), delay.read_interpolated(4.0));
        assert_eq!(delay.read_interpolated(0.0), delay.read_interpolated(1.0));
    }

    #[test]
    fn sized_from_seconds() {
        let delay = DelayLine::with_max_delay(0.5, 1_000.0);
        assert_eq!(delay.capacity(), 500);
    }

    #[test]
    fn reset_clears_history() {
        let mut delay = DelayLine::new(8);
        delay.write(1.0);
        delay.reset();
        assert_eq!(delay.read_interpolated(1.0), 0.0);
    }
}
