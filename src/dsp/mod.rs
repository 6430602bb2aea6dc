//! Low-level DSP primitives the voices and effects are built from.
//!
//! Everything here renders sample by sample against an explicit clock so
//! scheduled automation lands on the exact frame it was scheduled for.

/// Immutable mono sample data shared between voices.
pub mod buffer;
/// One-shot sample playback with looping and rate control.
pub mod buffer_player;
/// Partitioned FFT convolution.
pub mod convolver;
/// Fractional delay line.
pub mod delay;
/// Start-once oscillator with a frequency modulation input.
pub mod oscillator;
/// Sample-accurate parameter automation.
pub mod param;

pub use buffer::SampleBuffer;
pub use buffer_player::BufferPlayer;
pub use convolver::Convolver;
pub use delay::DelayLine;
pub use oscillator::{Oscillator, Waveform};
pub use param::{AudioParam, Automation};
