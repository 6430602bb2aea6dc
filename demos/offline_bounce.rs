/// Renders a short piano and pad phrase to `polyvoice_bounce.wav`.
use std::error::Error;

use polyvoice::{
    engine::PlaceholderResources,
    preset::{DX7_E_PIANO_1, ROLAND_FANTASIA_PAD},
    Engine, EngineConfig,
};

const BLOCK_SIZE: usize = 512;

fn main() -> Result<(), Box<dyn Error>> {
    let config = EngineConfig::default();
    let mut engine = Engine::with_builtin_bank(config);
    engine.initialize(&PlaceholderResources)?;
    engine.resume()?;

    // (time in seconds, pitch, on)
    let events: &[(f64, u8, bool)] = &[
        (0.0, 60, true),
        (0.0, 64, true),
        (0.5, 67, true),
        (1.0, 60, false),
        (1.0, 64, false),
        (1.5, 67, false),
        (1.5, 72, true),
        (2.5, 72, false),
    ];

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: config.sample_rate as u32,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create("polyvoice_bounce.wav", spec)?;

    let total = (4.0 * config.sample_rate) as usize;
    let mut block = vec![0.0f32; BLOCK_SIZE];
    let mut next_event = 0;
    let mut rendered = 0;

    engine.note_on(36, ROLAND_FANTASIA_PAD);

    while rendered < total {
        while let Some(&(time, pitch, on)) = events.get(next_event) {
            if time > engine.now() {
                break;
            }
            if on {
                engine.note_on(pitch, DX7_E_PIANO_1);
            } else {
                engine.note_off(pitch, DX7_E_PIANO_1);
            }
            next_event += 1;
        }

        let frames = BLOCK_SIZE.min(total - rendered);
        engine.render_block(&mut block[..frames]);
        for &sample in &block[..frames] {
            writer.write_sample(sample)?;
        }
        rendered += frames;
    }

    writer.finalize()?;
    println!("Rendered {rendered} samples to polyvoice_bounce.wav");
    Ok(())
}
