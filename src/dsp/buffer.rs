use std::sync::Arc;

/// Immutable mono PCM shared between every voice that plays it.
///
/// Cloning is a reference-count bump, so binding one buffer to a whole pool
/// of sample voices costs nothing per voice.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    data: Arc<[f32]>,
    sample_rate: f32,
}

impl SampleBuffer {
    pub fn new(data: Vec<f32>, sample_rate: f32) -> Self {
        Self {
            data: data.into(),
            sample_rate,
        }
    }

    /// Silent buffer of `duration` seconds.
    pub fn silent(duration: f32, sample_rate: f32) -> Self {
        let frames = (duration * sample_rate).round() as usize;
        Self::new(vec![0.0; frames], sample_rate)
    }

    /// Downmix interleaved frames of `channels` channels to mono.
    pub fn from_interleaved(interleaved: &[f32], channels: usize, sample_rate: f32) -> Self {
        let channels = channels.max(1);
        let data = interleaved
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect();
        Self::new(data, sample_rate)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn duration(&self) -> f32 {
        self.data.len() as f32 / self.sample_rate
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// True when every sample is zero (placeholder content).
    pub fn is_silent(&self) -> bool {
        self.data.iter().all(|&s| s == 0.0)
    }

    /// Linearly interpolated read at fractional frame `position`.
    ///
    /// Looped reads wrap the neighbour around to the start of the buffer.
    #[inline]
    pub fn read_interpolated(&self, position: f64, looped: bool) -> f32 {
        let len = self.data.len();
        if len == 0 || position < 0.0 {
            return 0.0;
        }

        let index = position.floor() as usize;
        if index >= len {
            return 0.0;
        }
        let frac = (position - index as f64) as f32;
        let next = if index + 1 < len {
            self.data[index + 1]
        } else if looped {
            self.data[0]
        } else {
            0.0
        };

        self.data[index] * (1.0 - frac) + next * frac
    }
}
