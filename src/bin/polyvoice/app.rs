//! polyvoice - audio setup and the shared engine

use std::sync::{Arc, Mutex};

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossterm::{
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute,
    terminal::supports_keyboard_enhancement,
};
use rtrb::RingBuffer;

use polyvoice::{
    engine::{PlaceholderResources, ResourceLoader, ResourceSource},
    Engine, EngineConfig, PresetBank, VoiceCount, MAX_BLOCK_SIZE,
};

use super::ui::{UiApp, SCOPE_BUFFER_SIZE};

/// Main application builder
pub struct Polyvoice {
    config: EngineConfig,
    bank: Arc<PresetBank>,
    timbre: String,
    resources: Box<dyn ResourceSource>,
}

impl Polyvoice {
    pub fn new(config: EngineConfig, bank: Arc<PresetBank>) -> Self {
        Self {
            config,
            bank,
            timbre: polyvoice::preset::DX7_E_PIANO_1.to_owned(),
            resources: Box::new(PlaceholderResources),
        }
    }

    pub fn timbre(mut self, timbre: &str) -> Self {
        self.timbre = timbre.to_owned();
        self
    }

    pub fn resources(mut self, source: impl ResourceSource + 'static) -> Self {
        self.resources = Box::new(source);
        self
    }

    /// Open the output device, start loading resources and hand the
    /// terminal to the UI until it quits.
    pub fn run(self) -> EyreResult<()> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| eyre!("no default output device available"))?;
        let stream_config = device
            .default_output_config()
            .wrap_err("failed to fetch default output config")?;

        let sample_rate = stream_config.sample_rate().0 as f32;
        let channels = stream_config.channels() as usize;
        log::info!("output: {sample_rate} Hz, {channels} channels");

        let config = EngineConfig {
            sample_rate,
            ..self.config
        };
        let mut engine = Engine::new(config, Arc::clone(&self.bank));

        let (count_tx, count_rx) = RingBuffer::<VoiceCount>::new(64);
        engine.set_observer(Box::new(count_tx));
        let initial_count = engine.voice_count();

        let (mut scope_tx, scope_rx) = RingBuffer::<f32>::new(SCOPE_BUFFER_SIZE * 4);
        let loader = ResourceLoader::spawn(self.resources, sample_rate);

        // Wrap in Arc<Mutex> for sharing with audio thread
        let engine = Arc::new(Mutex::new(engine));
        let engine_audio = Arc::clone(&engine);
        let mut render_buf = vec![0.0f32; MAX_BLOCK_SIZE];

        let stream = device.build_output_stream(
            &stream_config.into(),
            move |data: &mut [f32], _| {
                let Ok(mut engine) = engine_audio.lock() else {
                    data.fill(0.0);
                    return;
                };

                let total_frames = data.len() / channels;
                let mut frames_written = 0;

                while frames_written < total_frames {
                    let frames = (total_frames - frames_written).min(MAX_BLOCK_SIZE);
                    let block = &mut render_buf[..frames];
                    engine.render_block(block);

                    // Mono to all channels
                    let out_off = frames_written * channels;
                    for (i, &s) in block.iter().enumerate() {
                        for ch in 0..channels {
                            data[out_off + i * channels + ch] = s;
                        }
                        let _ = scope_tx.push(s);
                    }

                    frames_written += frames;
                }
            },
            |err| log::error!("audio stream error: {err}"),
            None,
        )?;

        stream.play()?;

        let enhanced = supports_keyboard_enhancement().unwrap_or(false);
        let mut terminal = ratatui::init();
        if enhanced {
            execute!(
                std::io::stdout(),
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
        }

        let mut ui = UiApp::new(engine, self.bank, &self.timbre, loader, count_rx, scope_rx, enhanced);
        ui.set_voice_count(initial_count);
        let result = ui.run(&mut terminal);

        if enhanced {
            execute!(std::io::stdout(), PopKeyboardEnhancementFlags)?;
        }
        ratatui::restore();
        result
    }
}
