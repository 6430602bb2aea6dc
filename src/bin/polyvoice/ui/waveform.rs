//! Output oscilloscope with a clip indicator

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};

/// Magnitude at which the output device will clip.
const CLIP_LEVEL: f32 = 1.0;

/// Peak magnitude and the positions of clipped samples, scaled to `0..1`.
fn clip_points(scope: &[f32]) -> (f32, Vec<(f64, f64)>) {
    let len = scope.len().max(1) as f64;
    let peak = scope.iter().fold(0.0_f32, |acc, s| acc.max(s.abs()));
    let clipped = scope
        .iter()
        .enumerate()
        .filter(|(_, s)| s.abs() >= CLIP_LEVEL)
        .map(|(i, s)| (i as f64 / len, s.clamp(-CLIP_LEVEL, CLIP_LEVEL) as f64))
        .collect();
    (peak, clipped)
}

fn title(peak: f32, clipping: bool) -> Line<'static> {
    let mut spans = vec![Span::raw(format!(" Output  peak {peak:.2} "))];
    if clipping {
        spans.push(Span::styled(
            "CLIP ",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ));
    }
    Line::from(spans)
}

pub fn render_waveform(frame: &mut Frame, area: Rect, scope: &[f32]) {
    let len = scope.len().max(1) as f64;
    let data: Vec<(f64, f64)> = scope
        .iter()
        .enumerate()
        .map(|(i, &sample)| (i as f64 / len, sample as f64))
        .collect();
    let (peak, clipped) = clip_points(scope);

    let mut datasets = vec![Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Cyan))
        .data(&data)];
    if !clipped.is_empty() {
        datasets.push(
            Dataset::default()
                .marker(symbols::Marker::Dot)
                .graph_type(GraphType::Scatter)
                .style(Style::default().fg(Color::Red))
                .data(&clipped),
        );
    }

    let block = Block::default()
        .title(title(peak, !clipped.is_empty()))
        .borders(Borders::ALL);

    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .bounds([0.0, 1.0])
                .style(Style::default().fg(Color::DarkGray)),
        )
        .y_axis(
            Axis::default()
                .bounds([-1.0, 1.0])
                .style(Style::default().fg(Color::DarkGray)),
        );

    frame.render_widget(chart, area);
}
