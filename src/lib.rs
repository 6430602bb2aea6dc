pub mod context; // Audio clock and render timing
pub mod dsp;
pub mod effects; // Shared chorus + reverb bus
pub mod engine;
pub mod error;
pub mod io;
pub mod preset; // Timbre catalog
pub mod synth; // Voice allocation and polyphony
pub mod voice;

pub use context::{AudioContext, ContextState, RenderCtx};
pub use effects::Bus;
pub use engine::{Engine, EngineConfig};
pub use error::{ContextError, DspError, EngineError, PresetError, ResourceError, RoutingError};
pub use preset::{PresetBank, TimbreDescriptor, TimbreId};
pub use synth::{PolyphonyManager, SustainPolicy, SynthMessage, VoiceCount};

/// Largest block rendered in one pass; longer requests are chunked.
pub const MAX_BLOCK_SIZE: usize = 2048;
