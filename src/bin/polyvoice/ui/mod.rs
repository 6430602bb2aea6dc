//! TUI module for polyvoice
//!
//! Turns key presses into note events and shows what the engine is doing.

mod status;
mod waveform;

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use color_eyre::eyre::{eyre, Result as EyreResult};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::Paragraph,
    DefaultTerminal, Frame,
};
use rtrb::Consumer;

use polyvoice::{engine::ResourceLoader, Engine, PresetBank, VoiceCount};

use super::keyboard::KeyboardMap;
use status::{render_status, StatusView};
use waveform::render_waveform;

/// Audio visualization buffer size
pub const SCOPE_BUFFER_SIZE: usize = 1024;

/// Terminals without key release events only repeat presses; a key that
/// has not repeated for this long counts as released.
const AUTO_RELEASE: Duration = Duration::from_millis(600);

#[derive(Debug, Clone)]
struct HeldKey {
    pitch: u8,
    timbre: String,
    last_seen: Instant,
}

pub struct UiApp {
    engine: Arc<Mutex<Engine>>,
    timbres: Vec<String>,
    selected: usize,
    keyboard: KeyboardMap,
    held: HashMap<char, HeldKey>,
    sustain: bool,
    loader: Option<ResourceLoader>,
    resource_status: String,
    count_rx: Consumer<VoiceCount>,
    voice_count: VoiceCount,
    scope_rx: Consumer<f32>,
    scope: Vec<f32>,
    release_events: bool,
    should_quit: bool,
}

impl UiApp {
    pub fn new(
        engine: Arc<Mutex<Engine>>,
        bank: Arc<PresetBank>,
        timbre: &str,
        loader: ResourceLoader,
        count_rx: Consumer<VoiceCount>,
        scope_rx: Consumer<f32>,
        release_events: bool,
    ) -> Self {
        let timbres: Vec<String> = bank.iter().map(|(_, t)| t.id.clone()).collect();
        let selected = timbres.iter().position(|t| t == timbre).unwrap_or(0);

        Self {
            engine,
            timbres,
            selected,
            keyboard: KeyboardMap::new(),
            held: HashMap::new(),
            sustain: false,
            loader: Some(loader),
            resource_status: "loading".to_owned(),
            count_rx,
            voice_count: VoiceCount::default(),
            scope_rx,
            scope: vec![0.0; SCOPE_BUFFER_SIZE],
            release_events,
            should_quit: false,
        }
    }

    pub fn set_voice_count(&mut self, count: VoiceCount) {
        self.voice_count = count;
    }

    /// Run the UI event loop
    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            self.poll_loader()?;
            self.poll_counts();
            self.poll_scope();
            if !self.release_events {
                self.auto_release()?;
            }

            terminal.draw(|frame| self.render(frame))?;

            // ~60fps
            if event::poll(Duration::from_millis(16))? {
                if let Event::Key(key) = event::read()? {
                    self.handle_key(key)?;
                }
            }
        }

        self.with_engine(|engine| engine.all_notes_off())
    }

    fn with_engine<R>(&self, f: impl FnOnce(&mut Engine) -> R) -> EyreResult<R> {
        let mut engine = self
            .engine
            .lock()
            .map_err(|_| eyre!("audio thread panicked while holding the engine"))?;
        Ok(f(&mut engine))
    }

    fn poll_loader(&mut self) -> EyreResult<()> {
        let Some(result) = self.loader.as_mut().and_then(ResourceLoader::poll) else {
            return Ok(());
        };
        self.loader = None;

        match result {
            Ok(resources) => {
                self.resource_status = "ready".to_owned();
                self.with_engine(|engine| engine.install_resources(resources))?;
            }
            // FM timbres keep working without resources.
            Err(err) => self.resource_status = format!("failed: {err}"),
        }
        Ok(())
    }

    fn poll_counts(&mut self) {
        while let Ok(count) = self.count_rx.pop() {
            self.voice_count = count;
        }
    }

    fn poll_scope(&mut self) {
        let mut fresh = 0;
        while let Ok(sample) = self.scope_rx.pop() {
            self.scope.push(sample);
            fresh += 1;
        }
        if fresh > 0 && self.scope.len() > SCOPE_BUFFER_SIZE {
            let excess = self.scope.len() - SCOPE_BUFFER_SIZE;
            self.scope.drain(0..excess);
        }
    }

    fn auto_release(&mut self) -> EyreResult<()> {
        let now = Instant::now();
        let expired: Vec<char> = self
            .held
            .iter()
            .filter(|(_, key)| now.duration_since(key.last_seen) > AUTO_RELEASE)
            .map(|(&c, _)| c)
            .collect();
        for c in expired {
            self.release_key(c)?;
        }
        Ok(())
    }

    fn current_timbre(&self) -> &str {
        self.timbres
            .get(self.selected)
            .map(String::as_str)
            .unwrap_or_default()
    }

    fn handle_key(&mut self, key: KeyEvent) -> EyreResult<()> {
        if key.kind == KeyEventKind::Release {
            if let KeyCode::Char(c) = key.code {
                self.release_key(c.to_ascii_lowercase())?;
            }
            return Ok(());
        }

        match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => self.should_quit = true,
            KeyCode::Char(' ') if key.kind == KeyEventKind::Press => {
                self.sustain = !self.sustain;
                let on = self.sustain;
                self.with_engine(|engine| engine.set_sustain(on))?;
            }
            KeyCode::Tab if key.kind == KeyEventKind::Press => {
                self.release_all_keys()?;
                if !self.timbres.is_empty() {
                    self.selected = (self.selected + 1) % self.timbres.len();
                }
            }
            KeyCode::Char('z') => self.keyboard.octave_down(),
            KeyCode::Char('x') => self.keyboard.octave_up(),
            KeyCode::Backspace => {
                self.held.clear();
                self.with_engine(|engine| engine.all_notes_off())?;
            }
            KeyCode::Char(c) => self.press_key(c.to_ascii_lowercase())?,
            _ => {}
        }
        Ok(())
    }

    fn press_key(&mut self, c: char) -> EyreResult<()> {
        let now = Instant::now();
        if let Some(held) = self.held.get_mut(&c) {
            held.last_seen = now;
            return Ok(());
        }
        let Some(pitch) = self.keyboard.pitch(c) else {
            return Ok(());
        };

        let timbre = self.current_timbre().to_owned();
        self.with_engine(|engine| {
            // The first key is the user gesture that starts audio.
            if engine.state() == polyvoice::ContextState::Suspended {
                if let Err(err) = engine.resume() {
                    log::warn!("cannot resume audio: {err}");
                }
            }
            engine.note_on(pitch, &timbre);
        })?;
        self.held.insert(
            c,
            HeldKey {
                pitch,
                timbre,
                last_seen: now,
            },
        );
        Ok(())
    }

    fn release_key(&mut self, c: char) -> EyreResult<()> {
        if let Some(held) = self.held.remove(&c) {
            self.with_engine(|engine| engine.note_off(held.pitch, &held.timbre))?;
        }
        Ok(())
    }

    fn release_all_keys(&mut self) -> EyreResult<()> {
        let keys: Vec<char> = self.held.keys().copied().collect();
        for c in keys {
            self.release_key(c)?;
        }
        Ok(())
    }

    fn render(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(6), // Status
                Constraint::Min(6),    // Waveform
                Constraint::Length(1), // Help bar
            ])
            .split(frame.area());

        let view = StatusView {
            timbre: self.current_timbre(),
            octave: self.keyboard.octave(),
            sustain: self.sustain,
            resources: &self.resource_status,
            voice_count: self.voice_count,
        };
        render_status(frame, chunks[0], &view);

        render_waveform(frame, chunks[1], &self.scope);

        let help = Paragraph::new(
            " [A-;] Play  [Space] Sustain  [Tab] Timbre  [Z/X] Octave  [Bksp] Panic  [Esc] Quit",
        )
        .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(help, chunks[2]);
    }
}
