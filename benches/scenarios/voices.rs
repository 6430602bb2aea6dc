//! Benchmarks for single voices of each synthesis kind.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use polyvoice::{
    dsp::SampleBuffer,
    preset::{SampleParams, Synthesis},
    voice::Voice,
    Bus, RenderCtx,
};

use crate::BLOCK_SIZES;

pub fn bench_voices(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/voices");
    let sample_rate = 48_000.0;
    let ctx = RenderCtx::new(sample_rate, 0.05);

    let fm = Synthesis::Fm(Vec::new());
    let sample = Synthesis::Sample(SampleParams::default());
    let recording: Vec<f32> = (0..sample_rate as usize)
        .map(|i| (i as f32 * 0.03).sin() * 0.5)
        .collect();
    let buffer = SampleBuffer::new(recording, sample_rate);

    for &size in BLOCK_SIZES {
        let mut out = vec![0.0f32; size];

        // Three operators, one modulation path
        let mut fm_voice = Voice::new(fm.kind());
        fm_voice.start(220.0, 1.0, Bus::Effects, &fm, 0.0);
        group.bench_with_input(BenchmarkId::new("fm", size), &size, |b, _| {
            b.iter(|| {
                out.fill(0.0);
                fm_voice.render_block(black_box(&mut out), black_box(&ctx));
            })
        });

        // Looped playback, pitched up a fifth
        let mut sample_voice = Voice::new(sample.kind());
        sample_voice.bind_buffer(buffer.clone());
        sample_voice.start(392.0, 1.0, Bus::Effects, &sample, 0.0);
        group.bench_with_input(BenchmarkId::new("sample", size), &size, |b, _| {
            b.iter(|| {
                out.fill(0.0);
                sample_voice.render_block(black_box(&mut out), black_box(&ctx));
            })
        });
    }

    group.finish();
}
