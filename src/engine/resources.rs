//! Loading of the shared sample buffer and reverb impulse response.
//!
//! Loading is the one slow step in the engine's life. It runs once, off the
//! audio thread, and its result is installed with [`Engine::install_resources`].
//!
//! [`Engine::install_resources`]: crate::engine::Engine::install_resources

use std::{
    path::{Path, PathBuf},
    thread::{self, JoinHandle},
};

use crate::{dsp::SampleBuffer, error::ResourceError};

/// Placeholder durations used until real recordings are supplied.
pub const PLACEHOLDER_SAMPLE_SECONDS: f32 = 4.0;
pub const PLACEHOLDER_IMPULSE_SECONDS: f32 = 1.5;

#[derive(Debug, Clone)]
pub struct Resources {
    pub sample: SampleBuffer,
    pub impulse_response: SampleBuffer,
}

pub trait ResourceSource: Send {
    fn load(&self, sample_rate: f32) -> Result<Resources, ResourceError>;
}

impl<T: ResourceSource + ?Sized> ResourceSource for Box<T> {
    fn load(&self, sample_rate: f32) -> Result<Resources, ResourceError> {
        (**self).load(sample_rate)
    }
}

/// Silent buffers. Sample timbres play (inaudibly) and the reverb stays bypassed.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderResources;

impl ResourceSource for PlaceholderResources {
    fn load(&self, sample_rate: f32) -> Result<Resources, ResourceError> {
        Ok(Resources {
            sample: SampleBuffer::silent(PLACEHOLDER_SAMPLE_SECONDS, sample_rate),
            impulse_response: SampleBuffer::silent(PLACEHOLDER_IMPULSE_SECONDS, sample_rate),
        })
    }
}

/// WAV files decoded with `hound`. Either path may be omitted, in which case
/// the placeholder stands in for it.
#[derive(Debug, Clone, Default)]
pub struct WavResources {
    pub sample: Option<PathBuf>,
    pub impulse_response: Option<PathBuf>,
}

impl WavResources {
    pub fn new(sample: Option<PathBuf>, impulse_response: Option<PathBuf>) -> Self {
        Self {
            sample,
            impulse_response,
        }
    }
}

impl ResourceSource for WavResources {
    fn load(&self, sample_rate: f32) -> Result<Resources, ResourceError> {
        let sample = match &self.sample {
            Some(path) => read_wav(path)?,
            None => SampleBuffer::silent(PLACEHOLDER_SAMPLE_SECONDS, sample_rate),
        };
        let impulse_response = match &self.impulse_response {
            Some(path) => read_wav(path)?,
            None => SampleBuffer::silent(PLACEHOLDER_IMPULSE_SECONDS, sample_rate),
        };
        Ok(Resources {
            sample,
            impulse_response,
        })
    }
}

/// Decode a WAV file and downmix it to mono.
pub fn read_wav(path: &Path) -> Result<SampleBuffer, ResourceError> {
    let wav_error = |source| ResourceError::Wav {
        path: path.to_path_buf(),
        source,
    };

    let reader = hound::WavReader::open(path).map_err(|source| match source {
        hound::Error::IoError(source) => ResourceError::Io {
            path: path.to_path_buf(),
            source,
        },
        other => wav_error(other),
    })?;
    let spec = reader.spec();

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(wav_error)?,
        hound::SampleFormat::Int => {
            let scale = 1.0 / (1_i64 << spec.bits_per_sample.saturating_sub(1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|s| s as f32 * scale))
                .collect::<Result<_, _>>()
                .map_err(wav_error)?
        }
    };

    if interleaved.is_empty() {
        return Err(ResourceError::Empty(path.to_path_buf()));
    }

    Ok(SampleBuffer::from_interleaved(
        &interleaved,
        spec.channels as usize,
        spec.sample_rate as f32,
    ))
}

/// Runs a [`ResourceSource`] on a background thread.
pub struct ResourceLoader {
    handle: Option<JoinHandle<Result<Resources, ResourceError>>>,
}

impl ResourceLoader {
    pub fn spawn(source: impl ResourceSource + 'static, sample_rate: f32) -> Self {
        let handle = thread::spawn(move || source.load(sample_rate));
        Self {
            handle: Some(handle),
        }
    }

    /// `None` while loading. Yields the result exactly once.
    pub fn poll(&mut self) -> Option<Result<Resources, ResourceError>> {
        if !self.handle.as_ref()?.is_finished() {
            return None;
        }
        let result = self
            .handle
            .take()?
            .join()
            .unwrap_or(Err(ResourceError::LoaderPanicked));
        if let Err(err) = &result {
            log::warn!("resource load failed: {err}");
        }
        Some(result)
    }

    /// Block until loading finishes.
    pub fn wait(mut self) -> Result<Resources, ResourceError> {
        match self.handle.take() {
            Some(handle) => handle.join().unwrap_or(Err(ResourceError::LoaderPanicked)),
            None => Err(ResourceError::LoaderPanicked),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.handle.is_some()
    }
}
