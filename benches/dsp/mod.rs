//! Benchmarks for low-level DSP primitives.

mod convolver;
mod delay;
mod oscillator;
mod param;

pub use convolver::bench_convolver;
pub use delay::bench_delay;
pub use oscillator::bench_oscillator;
pub use param::bench_param;
