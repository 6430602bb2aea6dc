//! Benchmarks for parameter automation.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use polyvoice::{dsp::param::AudioParam, RenderCtx};

use crate::BLOCK_SIZES;

pub fn bench_param(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/param");
    let ctx = RenderCtx::new(48_000.0, 0.0);

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // Static value, no events
        let flat = AudioParam::new(0.7);
        group.bench_with_input(BenchmarkId::new("flat", size), &size, |b, _| {
            b.iter(|| flat.fill_block(black_box(&mut buffer), black_box(&ctx)))
        });

        // A voice envelope mid-attack: every frame interpolates
        let mut envelope = AudioParam::new(0.0);
        envelope.set_value_at_time(0.0, 0.0);
        envelope.linear_ramp_to_value_at_time(1.0, 0.01);
        envelope.linear_ramp_to_value_at_time(0.7, 0.31);
        group.bench_with_input(BenchmarkId::new("envelope", size), &size, |b, _| {
            b.iter(|| envelope.fill_block(black_box(&mut buffer), black_box(&ctx)))
        });

        // Release pattern: cancel, set, ramp
        let mut release = AudioParam::new(0.0);
        group.bench_with_input(BenchmarkId::new("reschedule", size), &size, |b, _| {
            b.iter(|| {
                release.cancel_scheduled_values(0.5);
                release.set_value_at_time(0.7, 0.5);
                release.linear_ramp_to_value_at_time(0.0, 1.0);
                release.fill_block(black_box(&mut buffer), black_box(&ctx));
            })
        });
    }

    group.finish();
}
