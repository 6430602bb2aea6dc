//! Error types, one enum per concern.
//!
//! The note path itself never returns errors: unknown timbres, unbound sample
//! buffers, redundant stops and pool exhaustion are absorbed where they occur.

use std::path::PathBuf;

use thiserror::Error;

/// Misuse of a one-shot source node (oscillator or buffer player).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DspError {
    #[error("source node has already been started")]
    AlreadyStarted,
    #[error("source node has not been started")]
    NotStarted,
    #[error("source node stop has already been scheduled")]
    AlreadyStopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContextError {
    #[error("audio context is closed")]
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RoutingError {
    #[error("effect chain output cannot feed its own input")]
    Feedback,
}

/// Invalid timbre configuration.
#[derive(Debug, Error)]
pub enum PresetError {
    #[error("duplicate timbre id `{0}`")]
    DuplicateId(String),
    #[error("timbre `{0}` must have at least one layer")]
    NoLayers(String),
    #[error("timbre `{id}` declares kind {kind} but carries other parameters")]
    KindMismatch { id: String, kind: &'static str },
    #[error("timbre `{id}`: {reason}")]
    InvalidParameter { id: String, reason: String },
    #[cfg(feature = "serde")]
    #[error("malformed preset bank: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to read preset bank: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure while loading the shared sample buffer or impulse response.
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("failed to read `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode `{path}`: {source}")]
    Wav {
        path: PathBuf,
        #[source]
        source: hound::Error,
    },
    #[error("`{0}` contains no audio frames")]
    Empty(PathBuf),
    #[error("resource loader thread panicked")]
    LoaderPanicked,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error(transparent)]
    Resource(#[from] ResourceError),
}
