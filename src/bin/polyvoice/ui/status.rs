//! Status panel - timbre, pedal, resources and the polyphony gauge

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame,
};

use polyvoice::VoiceCount;

pub struct StatusView<'a> {
    pub timbre: &'a str,
    pub octave: i8,
    pub sustain: bool,
    pub resources: &'a str,
    pub voice_count: VoiceCount,
}

pub fn render_status(frame: &mut Frame, area: Rect, view: &StatusView) {
    let block = Block::default().title(" polyvoice ").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1), Constraint::Length(2)])
        .split(inner);

    let line = Line::from(vec![
        Span::styled(
            format!(" {}  ", view.timbre),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(
            format!("Octave {}  ", view.octave),
            Style::default().fg(Color::White),
        ),
        Span::styled(
            if view.sustain { "SUSTAIN ON  " } else { "sustain off  " },
            Style::default().fg(if view.sustain {
                Color::Green
            } else {
                Color::DarkGray
            }),
        ),
    ]);
    frame.render_widget(Paragraph::new(line), rows[0]);

    let resources = Paragraph::new(format!(" samples: {}", view.resources))
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(resources, rows[1]);

    let count = view.voice_count;
    let ratio = if count.capacity == 0 {
        0.0
    } else {
        (count.active as f64 / count.capacity as f64).min(1.0)
    };
    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(if ratio > 0.9 { Color::Red } else { Color::Green }))
        .ratio(ratio)
        .label(count.to_string());
    frame.render_widget(gauge, rows[2]);
}
