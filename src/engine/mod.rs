//! The assembled engine: audio context, polyphony manager, effect chain and
//! master bus.
//!
//! ```text
//! notes ─→ PolyphonyManager ─→ voices ─┬─→ effects bus ─→ EffectChain ─┐
//!                                      └─→ master bus ←─────────────────┘
//!                                                │
//!                                          × master gain ─→ out
//! ```
//!
//! The context starts suspended and renders silence until [`Engine::resume`]
//! is called from a user gesture. FM timbres play immediately; sample
//! timbres need [`Engine::initialize`] (or [`Engine::install_resources`]
//! with the result of a background [`ResourceLoader`]) first.

pub mod config;
pub mod resources;

use std::sync::Arc;

pub use config::EngineConfig;
pub use resources::{PlaceholderResources, ResourceLoader, ResourceSource, Resources, WavResources};

use crate::{
    context::{AudioContext, ContextState, RenderCtx},
    dsp::param::AudioParam,
    effects::{Bus, EffectChain, EffectNode},
    error::{ContextError, EngineError},
    preset::{PresetBank, TimbreId},
    synth::{MessageReceiver, PolyphonyManager, SynthMessage, VoiceCount, VoiceCountObserver},
    MAX_BLOCK_SIZE,
};

pub struct Engine {
    context: AudioContext,
    config: EngineConfig,
    poly: PolyphonyManager,
    effects: EffectChain,
    master_gain: AudioParam,
    effects_bus: Vec<f32>,
    master_bus: Vec<f32>,
    gain_buffer: Vec<f32>,
    resources_ready: bool,
}

impl Engine {
    pub fn new(config: EngineConfig, bank: Arc<PresetBank>) -> Self {
        let mut effects = EffectChain::new(config.sample_rate);
        // Master is the only bus that is not the chain's own input.
        let _ = effects.connect(Bus::Master);

        Self {
            context: AudioContext::new(config.sample_rate),
            poly: PolyphonyManager::new(bank, config.max_voices, config.sustain_policy),
            effects,
            master_gain: AudioParam::new(config.master_gain),
            effects_bus: vec![0.0; MAX_BLOCK_SIZE],
            master_bus: vec![0.0; MAX_BLOCK_SIZE],
            gain_buffer: vec![0.0; MAX_BLOCK_SIZE],
            resources_ready: false,
            config,
        }
    }

    pub fn with_builtin_bank(config: EngineConfig) -> Self {
        Self::new(config, Arc::new(PresetBank::builtin()))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn context(&self) -> &AudioContext {
        &self.context
    }

    pub fn state(&self) -> ContextState {
        self.context.state()
    }

    pub fn now(&self) -> f64 {
        self.context.now()
    }

    pub fn resume(&mut self) -> Result<(), ContextError> {
        self.context.resume()
    }

    pub fn suspend(&mut self) -> Result<(), ContextError> {
        self.context.suspend()
    }

    pub fn close(&mut self) {
        self.context.close();
    }

    /// Load shared resources synchronously and install them.
    pub fn initialize(&mut self, source: &dyn ResourceSource) -> Result<(), EngineError> {
        let resources = source.load(self.config.sample_rate)?;
        self.install_resources(resources);
        Ok(())
    }

    /// Bind the sample buffer to every sample voice and load the impulse
    /// response into the reverb.
    pub fn install_resources(&mut self, resources: Resources) {
        self.poly.bind_sample_buffer(&resources.sample);
        self.effects.set_impulse_response(&resources.impulse_response);
        self.resources_ready = true;
        log::info!(
            "resources installed: {:.2}s sample, {:.2}s impulse response",
            resources.sample.duration(),
            resources.impulse_response.duration()
        );
    }

    pub fn is_initialized(&self) -> bool {
        self.resources_ready
    }

    pub fn bank(&self) -> &Arc<PresetBank> {
        self.poly.bank()
    }

    pub fn polyphony(&self) -> &PolyphonyManager {
        &self.poly
    }

    pub fn effects_mut(&mut self) -> &mut EffectChain {
        &mut self.effects
    }

    pub fn set_observer(&mut self, observer: Box<dyn VoiceCountObserver>) {
        self.poly.set_observer(observer);
    }

    pub fn set_master_gain(&mut self, gain: f32) {
        self.master_gain.set_value(gain);
    }

    pub fn master_gain(&self) -> f32 {
        self.master_gain.value_at(self.context.now())
    }

    pub fn note_on(&mut self, pitch: u8, timbre: &str) {
        let now = self.context.now();
        self.poly.note_on(pitch, timbre, now);
    }

    pub fn note_on_with_velocity(&mut self, pitch: u8, timbre: &str, velocity: f32) {
        let now = self.context.now();
        self.poly.note_on_with_velocity(pitch, timbre, velocity, now);
    }

    pub fn note_off(&mut self, pitch: u8, timbre: &str) {
        let now = self.context.now();
        self.poly.note_off(pitch, timbre, now);
    }

    pub fn set_sustain(&mut self, on: bool) {
        let now = self.context.now();
        self.poly.set_sustain(on, now);
    }

    pub fn all_notes_off(&mut self) {
        let now = self.context.now();
        self.poly.all_notes_off(now);
    }

    pub fn resolve(&self, timbre: &str) -> Option<TimbreId> {
        self.poly.bank().resolve(timbre)
    }

    pub fn handle_message(&mut self, message: SynthMessage) {
        let now = self.context.now();
        self.poly.handle_message(message, now);
    }

    /// Apply every pending message in arrival order.
    pub fn process_messages(&mut self, rx: &mut impl MessageReceiver) {
        while let Some(message) = rx.pop() {
            self.handle_message(message);
        }
    }

    pub fn voice_count(&mut self) -> VoiceCount {
        self.poly.reap(self.context.now());
        self.poly.voice_count()
    }

    /// Render mono output. Silence, with the clock held, unless running.
    pub fn render_block(&mut self, out: &mut [f32]) {
        if !self.context.is_running() {
            out.fill(0.0);
            return;
        }

        for chunk in out.chunks_mut(MAX_BLOCK_SIZE) {
            self.render_chunk(chunk);
        }
    }

    fn render_chunk(&mut self, out: &mut [f32]) {
        let frames = out.len();
        let ctx: RenderCtx = self.context.render_ctx();
        self.poly.reap(ctx.time);

        let effects_bus = &mut self.effects_bus[..frames];
        let master_bus = &mut self.master_bus[..frames];
        effects_bus.fill(0.0);
        master_bus.fill(0.0);

        self.poly.render_block(effects_bus, master_bus, &ctx);
        self.effects.render_block(effects_bus, &ctx);

        let gain = &mut self.gain_buffer[..frames];
        self.master_gain.fill_block(gain, &ctx);

        for (((o, e), m), g) in out
            .iter_mut()
            .zip(effects_bus.iter())
            .zip(master_bus.iter())
            .zip(gain.iter())
        {
            *o = (e + m) * g;
        }

        self.context.advance(frames);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preset::{DX7_E_PIANO_1, MOTIF_POWER_GRAND, ROLAND_FANTASIA_PAD};

    fn engine() -> Engine {
        Engine::with_builtin_bank(EngineConfig {
            sample_rate: 8_000.0,
            max_voices: 16,
            ..EngineConfig::default()
        })
    }

    fn peak(buffer: &[f32]) -> f32 {
        buffer.iter().fold(0.0_f32, |acc, s| acc.max(s.abs()))
    }

    #[test]
    fn suspended_engine_renders_silence_and_holds_clock() {
        let mut engine = engine();
        engine.note_on(60, DX7_E_PIANO_1);

        let mut out = vec![1.0; 256];
        engine.render_block(&mut out);

        assert!(out.iter().all(|&s| s == 0.0));
        assert_eq!(engine.now(), 0.0);
    }

    #[test]
    fn fm_plays_before_initialize() {
        let mut engine = engine();
        engine.resume().unwrap();
        engine.note_on(69, DX7_E_PIANO_1);

        let mut out = vec![0.0; 800];
        engine.render_block(&mut out);

        assert!(!engine.is_initialized());
        assert!(peak(&out) > 0.01);
        assert!((engine.now() - 0.1).abs() < 1e-9);
    }

    #[test]
    fn sample_notes_need_resources() {
        let mut engine = engine();
        engine.note_on(60, ROLAND_FANTASIA_PAD);
        assert_eq!(engine.voice_count().active, 0);

        engine.initialize(&PlaceholderResources).unwrap();
        engine.note_on(60, ROLAND_FANTASIA_PAD);
        assert_eq!(engine.voice_count().active, 2);
    }

    #[test]
    fn grand_uses_four_layers() {
        let mut engine = engine();
        engine.initialize(&PlaceholderResources).unwrap();
        engine.note_on(60, MOTIF_POWER_GRAND);
        assert_eq!(engine.voice_count().active, 4);
    }

    #[test]
    fn long_blocks_are_chunked() {
        let mut engine = engine();
        engine.resume().unwrap();
        engine.note_on(60, DX7_E_PIANO_1);

        let mut out = vec![0.0; MAX_BLOCK_SIZE * 2 + 100];
        engine.render_block(&mut out);

        assert!((engine.now() - out.len() as f64 / 8_000.0).abs() < 1e-9);
        assert!(out.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn master_gain_scales_output() {
        let mut loud = engine();
        let mut quiet = engine();
        quiet.set_master_gain(0.35);

        let mut a = vec![0.0; 400];
        let mut b = vec![0.0; 400];
        for (engine, out) in [(&mut loud, &mut a), (&mut quiet, &mut b)] {
            engine.resume().unwrap();
            engine.note_on(69, DX7_E_PIANO_1);
            engine.render_block(out);
        }

        for (x, y) in a.iter().zip(&b) {
            assert!((x * 0.5 - y).abs() < 1e-5);
        }
    }

    #[test]
    fn released_notes_free_their_voices() {
        let mut engine = engine();
        engine.resume().unwrap();
        engine.note_on(60, DX7_E_PIANO_1);
        assert_eq!(engine.voice_count().active, 3);

        engine.note_off(60, DX7_E_PIANO_1);
        let mut out = vec![0.0; 8_000];
        engine.render_block(&mut out);

        assert_eq!(engine.voice_count().active, 0);
    }

    #[cfg(feature = "rtrb")]
    #[test]
    fn processes_queued_messages() {
        let mut engine = engine();
        let timbre = engine.resolve(DX7_E_PIANO_1).unwrap();
        let (mut tx, mut rx) = rtrb::RingBuffer::new(8);
        tx.push(SynthMessage::NoteOn {
            pitch: 60,
            timbre,
            velocity: 0.8,
        })
        .unwrap();
        tx.push(SynthMessage::Sustain { on: true }).unwrap();

        engine.process_messages(&mut rx);

        assert_eq!(engine.voice_count().active, 3);
        assert!(engine.polyphony().is_sustain_on());
    }

    #[test]
    fn closed_engine_cannot_resume() {
        let mut engine = engine();
        engine.close();
        assert!(matches!(engine.resume(), Err(ContextError::Closed)));
    }
}
