//! Audio clock and lifecycle.
//!
//! The context owns the monotonic sample clock every scheduling decision is
//! made against. It starts suspended: hosts must resume it explicitly (usually
//! in response to the first user interaction) before any time passes.

use crate::error::ContextError;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    Suspended,
    Running,
    Closed,
}

/// Timing information handed to everything that renders audio.
///
/// - sample_rate: Audio sample rate (e.g., 48000.0)
/// - time: Clock time of the first frame in the block, in seconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderCtx {
    pub sample_rate: f32,
    pub time: f64,
}

impl RenderCtx {
    pub fn new(sample_rate: f32, time: f64) -> Self {
        Self { sample_rate, time }
    }

    /// Clock time of frame `index` within the block.
    #[inline]
    pub fn time_at(&self, index: usize) -> f64 {
        self.time + index as f64 / self.sample_rate as f64
    }
}

#[derive(Debug)]
pub struct AudioContext {
    sample_rate: f32,
    frames: u64,
    state: ContextState,
}

impl AudioContext {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            frames: 0,
            state: ContextState::Suspended,
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Current clock time in seconds.
    pub fn now(&self) -> f64 {
        self.frames as f64 / self.sample_rate as f64
    }

    pub fn state(&self) -> ContextState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == ContextState::Running
    }

    pub fn resume(&mut self) -> Result<(), ContextError> {
        match self.state {
            ContextState::Closed => Err(ContextError::Closed),
            ContextState::Running => Ok(()),
            ContextState::Suspended => {
                log::info!("audio context resumed at {:.3}s", self.now());
                self.state = ContextState::Running;
                Ok(())
            }
        }
    }

    pub fn suspend(&mut self) -> Result<(), ContextError> {
        match self.state {
            ContextState::Closed => Err(ContextError::Closed),
            _ => {
                self.state = ContextState::Suspended;
                Ok(())
            }
        }
    }

    pub fn close(&mut self) {
        self.state = ContextState::Closed;
    }

    /// Context for a block starting at the current clock time.
    pub fn render_ctx(&self) -> RenderCtx {
        RenderCtx::new(self.sample_rate, self.now())
    }

    /// Advance the clock after a rendered block. Frozen unless running.
    pub(crate) fn advance(&mut self, frames: usize) {
        if self.is_running() {
            self.frames += frames as u64;
        }
    }
}
