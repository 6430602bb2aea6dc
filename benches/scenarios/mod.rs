//! Real-world scenario benchmarks.
//!
//! These model actual playing: single voices, dense chords with stealing,
//! and the whole engine with its effect chain.

mod engine;
mod voices;

pub use engine::bench_engine;
pub use voices::bench_voices;
