//! Benchmarks for delay line operations.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use polyvoice::dsp::delay::DelayLine;

use crate::BLOCK_SIZES;

pub fn bench_delay(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/delay");

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size).map(|i| (i as f32 * 0.1).sin()).collect();

        // Fixed delay, read then write
        let mut delay = DelayLine::with_max_delay(0.1, 48_000.0);
        let mut buffer = input.clone();
        group.bench_with_input(BenchmarkId::new("fixed_25ms", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                for sample in buffer.iter_mut() {
                    *sample = delay.next_sample(*sample, black_box(1200.0));
                }
            })
        });

        // Modulated delay time, chorus-like
        let mut delay = DelayLine::with_max_delay(0.1, 48_000.0);
        group.bench_with_input(BenchmarkId::new("modulated", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                for (i, sample) in buffer.iter_mut().enumerate() {
                    let delay_time = 1200.0 + (i as f32 * 0.01).sin() * 240.0;
                    *sample = delay.next_sample(*sample, black_box(delay_time));
                }
            })
        });
    }

    group.finish();
}
