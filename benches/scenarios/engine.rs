//! Benchmarks for the whole engine under polyphonic load.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use polyvoice::{
    engine::{Resources, PlaceholderResources, ResourceSource},
    dsp::SampleBuffer,
    preset::{DX7_E_PIANO_1, MOTIF_POWER_GRAND},
    Engine, EngineConfig,
};

use crate::BLOCK_SIZES;

fn engine_with_reverb(max_voices: usize) -> Engine {
    let config = EngineConfig {
        max_voices,
        ..EngineConfig::default()
    };
    let mut engine = Engine::with_builtin_bank(config);

    // Audible 1.5s tail so the convolver is not bypassed
    let tail: Vec<f32> = (0..72_000)
        .map(|i| ((i as f32 * 0.7).sin() * 0.1) * (-(i as f32) / 12_000.0).exp())
        .collect();
    let resources = match PlaceholderResources.load(config.sample_rate) {
        Ok(placeholder) => Resources {
            impulse_response: SampleBuffer::new(tail, config.sample_rate),
            ..placeholder
        },
        Err(err) => panic!("placeholder resources failed: {err}"),
    };
    engine.install_resources(resources);
    let _ = engine.resume();
    engine
}

pub fn bench_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/engine");

    for &size in BLOCK_SIZES {
        let mut out = vec![0.0f32; size];

        // Idle: effect chain only
        let mut idle = engine_with_reverb(256);
        group.bench_with_input(BenchmarkId::new("idle", size), &size, |b, _| {
            b.iter(|| idle.render_block(black_box(&mut out)))
        });

        // Ten-note piano chord, 30 FM voices
        let mut chord = engine_with_reverb(256);
        for pitch in (48..).step_by(3).take(10) {
            chord.note_on(pitch, DX7_E_PIANO_1);
        }
        group.bench_with_input(BenchmarkId::new("piano_chord", size), &size, |b, _| {
            b.iter(|| chord.render_block(black_box(&mut out)))
        });

        // Full pools: every sample voice in use
        let mut full = engine_with_reverb(256);
        for pitch in 36..68 {
            full.note_on(pitch, MOTIF_POWER_GRAND);
            full.note_on(pitch + 24, DX7_E_PIANO_1);
        }
        group.bench_with_input(BenchmarkId::new("full_pools", size), &size, |b, _| {
            b.iter(|| full.render_block(black_box(&mut out)))
        });

        // Event handling cost when every note steals
        let mut stealing = engine_with_reverb(16);
        let mut pitch = 40u8;
        group.bench_with_input(BenchmarkId::new("note_on_steal", size), &size, |b, _| {
            b.iter(|| {
                stealing.note_on(black_box(pitch), DX7_E_PIANO_1);
                stealing.note_off(pitch, DX7_E_PIANO_1);
                pitch = if pitch >= 90 { 40 } else { pitch + 1 };
            })
        });
    }

    group.finish();
}
