// Purpose: voice allocation, stealing, sustain pedal
// Sits between note events and the voices in src/voice

pub mod message;
pub mod poly;
pub mod pool;

pub use message::{MessageReceiver, SynthMessage, VoiceCountObserver};
pub use poly::{NoteKey, PolyphonyManager, SustainPolicy, VoiceCount};
pub use pool::{VoiceHandle, VoiceId, VoicePool};
