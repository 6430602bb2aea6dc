//! Benchmarks for partitioned convolution.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use polyvoice::dsp::convolver::Convolver;

use crate::BLOCK_SIZES;

pub fn bench_convolver(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/convolver");

    // Decaying noise-like tails of increasing length
    let ir_lengths: &[(&str, usize)] = &[("ir_100ms", 4_800), ("ir_1500ms", 72_000)];

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size).map(|i| (i as f32 * 0.05).sin()).collect();
        let mut buffer = input.clone();

        for &(name, length) in ir_lengths {
            let ir: Vec<f32> = (0..length)
                .map(|i| ((i as f32 * 12.9898).sin() * 43758.547).fract() * (-(i as f32) / 9_600.0).exp())
                .collect();
            let mut convolver = Convolver::new();
            convolver.set_impulse_response(&ir);

            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter(|| {
                    buffer.copy_from_slice(&input);
                    convolver.process_block(black_box(&mut buffer));
                })
            });
        }

        // Silent IR short-circuits
        let mut bypassed = Convolver::new();
        bypassed.set_impulse_response(&vec![0.0; 72_000]);
        group.bench_with_input(BenchmarkId::new("silent_ir", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                bypassed.process_block(black_box(&mut buffer));
            })
        });
    }

    group.finish();
}
