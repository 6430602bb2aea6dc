//! Benchmarks for oscillator waveforms and FM input.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use polyvoice::dsp::oscillator::{Oscillator, Waveform};

use crate::BLOCK_SIZES;

pub fn bench_oscillator(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/oscillator");
    let sample_rate = 48_000.0;

    let waveforms = [
        ("sine", Waveform::Sine),
        ("triangle", Waveform::Triangle),
        ("square", Waveform::Square),
        ("sawtooth", Waveform::Sawtooth),
    ];

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        for (name, waveform) in waveforms {
            let mut osc = Oscillator::new(waveform, 440.0);
            let _ = osc.start();
            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter(|| {
                    for (i, out) in buffer.iter_mut().enumerate() {
                        *out = osc.next_sample(i as f64 / sample_rate as f64, sample_rate, 0.0);
                    }
                    black_box(&buffer);
                })
            });
        }

        // Modulator feeding carrier, as in an FM voice
        let mut modulator = Oscillator::sine(440.0 * 1.41);
        let mut carrier = Oscillator::sine(440.0);
        let _ = modulator.start();
        let _ = carrier.start();
        group.bench_with_input(BenchmarkId::new("fm_pair", size), &size, |b, _| {
            b.iter(|| {
                for (i, out) in buffer.iter_mut().enumerate() {
                    let t = i as f64 / sample_rate as f64;
                    let fm = modulator.next_sample(t, sample_rate, 0.0);
                    *out = carrier.next_sample(t, sample_rate, fm);
                }
                black_box(&buffer);
            })
        });
    }

    group.finish();
}
