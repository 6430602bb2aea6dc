/// Demonstrates voice allocation and stealing without real-time audio.
/// Raw MIDI bytes are parsed and queued on a lock-free ring buffer, the way a
/// MIDI input thread hands events to the audio thread.
use rtrb::{Producer, RingBuffer};
use polyvoice::{
    engine::PlaceholderResources,
    io::{midi_to_synth, MidiEvent},
    preset::{TimbreId, DX7_E_PIANO_1, ROLAND_FANTASIA_PAD},
    Engine, EngineConfig, SynthMessage, VoiceCount,
};

const CHANNEL: u8 = 0;

fn send_midi(tx: &mut Producer<SynthMessage>, bytes: &[u8], timbre: TimbreId) {
    let Some(event) = MidiEvent::from_bytes(bytes) else {
        println!("  (unparsed MIDI {bytes:02X?})");
        return;
    };
    match midi_to_synth(event, CHANNEL, timbre) {
        Some(message) => {
            if tx.push(message).is_err() {
                eprintln!("message queue full, dropped {event:?}");
            }
        }
        None => println!("  (ignored {event:?})"),
    }
}

fn main() {
    println!("=== Polyphony Demo (Offline) ===\n");

    let block_size = 256;
    let config = EngineConfig {
        max_voices: 8,
        ..EngineConfig::default()
    };
    let mut engine = Engine::with_builtin_bank(config);
    if let Err(err) = engine.initialize(&PlaceholderResources) {
        eprintln!("resources unavailable: {err}");
    }

    // Voice counts flow back on their own queue
    let (count_tx, mut count_rx) = RingBuffer::<VoiceCount>::new(64);
    engine.set_observer(Box::new(count_tx));

    let (mut tx, mut rx) = RingBuffer::<SynthMessage>::new(64);
    let Some(piano) = engine.resolve(DX7_E_PIANO_1) else {
        eprintln!("builtin bank has no {DX7_E_PIANO_1}");
        return;
    };

    if let Err(err) = engine.resume() {
        eprintln!("cannot start audio context: {err}");
        return;
    }

    println!("Created engine with {} voices (4 FM, 4 sample)\n", config.max_voices);

    let mut buffer = vec![0.0; block_size];
    let mut render = |engine: &mut Engine, rx: &mut rtrb::Consumer<SynthMessage>| {
        engine.process_messages(rx);
        engine.render_block(&mut buffer);
        buffer.iter().fold(0.0f32, |acc, &x| acc.max(x.abs()))
    };

    // Each piano note takes three FM voices
    println!("Note On: C4 (3 layers)");
    send_midi(&mut tx, &[0x90, 60, 127], piano);
    let peak = render(&mut engine, &mut rx);
    println!("  Peak amplitude: {peak:.3}");

    println!("\nNote On: E4 - the FM pool holds 4, so two C4 layers are stolen");
    send_midi(&mut tx, &[0x90, 64, 127], piano);
    let peak = render(&mut engine, &mut rx);
    println!("  Peak amplitude: {peak:.3}");

    println!("\nSustain down, release E4: it keeps ringing");
    send_midi(&mut tx, &[0xB0, 64, 127], piano);
    // Note-on with zero velocity, as most keyboards send note-off
    send_midi(&mut tx, &[0x90, 64, 0], piano);
    render(&mut engine, &mut rx);

    println!("\nSustain up: held notes release");
    send_midi(&mut tx, &[0xB0, 64, 0], piano);
    for _ in 0..200 {
        render(&mut engine, &mut rx);
    }

    println!("\nPad chord on the sample pool");
    for pitch in [48, 55] {
        engine.note_on(pitch, ROLAND_FANTASIA_PAD);
    }
    render(&mut engine, &mut rx);

    println!("\nPitch bend on channel 1: filtered out");
    send_midi(&mut tx, &[0xE1, 0x00, 0x50], piano);

    println!("\nAll Notes Off (CC123)");
    send_midi(&mut tx, &[0xB0, 123, 0], piano);
    render(&mut engine, &mut rx);

    println!("\n=== Voice count history ===");
    while let Ok(count) = count_rx.pop() {
        println!("  {count}");
    }
    println!("  now: {}", engine.voice_count());
}
