//! Scope panels: the rendered output next to previews of what the next tone
//! will sound like, one cycle of the selected waveform and its envelope.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    symbols,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};

use mulberry::{dsp::EnvelopeParams, engine::ToneParams, Envelope, Waveform};

/// Points per preview curve
const PREVIEW_POINTS: usize = 128;

pub fn render_scope(
    frame: &mut Frame,
    area: Rect,
    output: &[f32],
    params: &ToneParams,
    tone_hold: f64,
) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(50),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
        ])
        .split(area);

    let len = output.len().max(1) as f64;
    let scope: Vec<(f64, f64)> = output
        .iter()
        .enumerate()
        .map(|(i, &s)| (i as f64 / len, s as f64))
        .collect();
    frame.render_widget(
        line_chart(" Output ", &scope, [0.0, 1.0], [-1.0, 1.0], Color::Cyan),
        columns[0],
    );

    let cycle = cycle_points(params.waveform, PREVIEW_POINTS);
    let title = format!(" {} ", params.waveform);
    frame.render_widget(
        line_chart(&title, &cycle, [0.0, 1.0], [-1.0, 1.0], Color::Green),
        columns[1],
    );

    let env = envelope_points(&params.envelope, tone_hold, PREVIEW_POINTS);
    let length = env.last().map_or(1.0, |&(t, _)| t.max(f64::EPSILON));
    frame.render_widget(
        line_chart(" Envelope ", &env, [0.0, length], [0.0, 1.0], Color::Yellow),
        columns[2],
    );
}

fn line_chart<'a>(
    title: &'a str,
    data: &'a [(f64, f64)],
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
    color: Color,
) -> Chart<'a> {
    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(color))
        .data(data);

    Chart::new(vec![dataset])
        .block(Block::default().title(title).borders(Borders::ALL))
        .x_axis(
            Axis::default()
                .bounds(x_bounds)
                .style(Style::default().fg(Color::DarkGray)),
        )
        .y_axis(
            Axis::default()
                .bounds(y_bounds)
                .style(Style::default().fg(Color::DarkGray)),
        )
}

/// One period of `waveform`, phase on x.
fn cycle_points(waveform: Waveform, points: usize) -> Vec<(f64, f64)> {
    (0..points)
        .map(|i| {
            let phase = i as f32 / points as f32;
            (phase as f64, waveform.sample(phase) as f64)
        })
        .collect()
}

/// Gain of a tone from note-on to the end of its release, seconds on x.
///
/// The note-off falls where `Controller::play_tone` puts it.
fn envelope_points(params: &EnvelopeParams, tone_hold: f64, points: usize) -> Vec<(f64, f64)> {
    let Ok(mut envelope) = Envelope::new(*params, 0.0) else {
        return Vec::new();
    };
    envelope.note_off(params.attack + params.decay + tone_hold);
    let end = envelope.finish_time().unwrap_or(0.0);

    (0..=points)
        .map(|i| {
            let t = end * i as f64 / points as f64;
            (t, envelope.gain_at(t) as f64)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_preview_spans_the_whole_tone() {
        let params = EnvelopeParams::new(0.1, 0.2, 0.5, 0.3).unwrap();
        let points = envelope_points(&params, 0.5, 110);

        assert_eq!(points.len(), 111);
        assert_eq!(points[0], (0.0, 0.0));
        let (end, last) = points[110];
        assert!((end - 1.1).abs() < 1e-9);
        assert!(last.abs() < 1e-6);
        // attack peak, then sustain during the hold
        assert!((points[10].1 - 1.0).abs() < 1e-3);
        assert!((points[50].1 - 0.5).abs() < 1e-3);
    }

    #[test]
    fn cycle_preview_covers_one_period() {
        let points = cycle_points(Waveform::Square, 8);
        assert_eq!(points.len(), 8);
        assert!(points[..4].iter().all(|&(_, y)| y == 1.0));
        assert!(points[4..].iter().all(|&(_, y)| y == -1.0));
    }
}
