//! Status widget: tone parameters, the note playing, live voices and output level

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use mulberry::{engine::ToneParams, sequencing::NoteName};

/// Output level of the scope window
pub struct AudioStats {
    pub peak: f32,
    pub rms: f32,
}

impl AudioStats {
    pub fn from_buffer(buffer: &[f32]) -> Self {
        if buffer.is_empty() {
            return Self { peak: 0.0, rms: 0.0 };
        }
        let peak = buffer.iter().fold(0.0f32, |acc, &x| acc.max(x.abs()));
        let rms = (buffer.iter().map(|&x| x * x).sum::<f32>() / buffer.len() as f32).sqrt();
        Self { peak, rms }
    }
}

pub fn render_status(
    frame: &mut Frame,
    area: Rect,
    params: &ToneParams,
    now_playing: Option<f32>,
    live_voices: usize,
    stats: &AudioStats,
    message: Option<&str>,
) {
    let block = Block::default().title(" mulberry ").borders(Borders::ALL);

    let note = NoteName::from_freq(params.frequency)
        .map(|n| format!(" ({n})"))
        .unwrap_or_default();
    let env = &params.envelope;

    let tone = Line::from(vec![
        Span::styled(
            format!(" {:.1} Hz{note}  ", params.frequency),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(
            format!("{}  ", params.waveform),
            Style::default().fg(Color::Green),
        ),
        Span::styled(
            format!(
                "A {:.2}s  D {:.2}s  S {:.2}  R {:.2}s",
                env.attack, env.decay, env.sustain, env.release
            ),
            Style::default().fg(Color::White),
        ),
    ]);

    let playing = match now_playing {
        Some(hz) => match NoteName::from_freq(hz) {
            Some(name) => format!(" Playing {name} ({hz:.2} Hz)  "),
            None => format!(" Playing {hz:.2} Hz  "),
        },
        None => " Idle  ".to_string(),
    };

    let mut levels = vec![
        Span::styled(
            playing,
            Style::default().fg(if now_playing.is_some() {
                Color::Yellow
            } else {
                Color::DarkGray
            }),
        ),
        Span::styled(
            format!("Voices: {live_voices}  "),
            Style::default().fg(if live_voices > 0 {
                Color::Green
            } else {
                Color::DarkGray
            }),
        ),
        Span::styled(
            format!("Peak: {:.2}  RMS: {:.2}", stats.peak, stats.rms),
            Style::default().fg(Color::Magenta),
        ),
    ];
    if let Some(message) = message {
        levels.push(Span::styled(
            format!("  {message}"),
            Style::default().fg(Color::Red),
        ));
    }

    let paragraph = Paragraph::new(vec![tone, Line::from(levels)]).block(block);
    frame.render_widget(paragraph, area);
}
