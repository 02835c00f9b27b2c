//! Interactive terminal front end
//!
//! Shows the current tone parameters, the note being played, the number of
//! live voices and a scope of the rendered output. All synthesis happens in
//! the audio callback; this loop only reads keys and pushes requests through
//! the [`Controller`].

mod scope;
mod status;

use std::time::Duration;

use color_eyre::eyre::Result as EyreResult;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::Paragraph,
    DefaultTerminal, Frame,
};
use rtrb::{Consumer, RingBuffer};

use mulberry::{
    config::{ATTACK_RANGE, DECAY_RANGE, FREQUENCY_RANGE, RELEASE_RANGE, SUSTAIN_RANGE},
    Controller, EnvelopeParams, SynthConfig, SynthError,
};

use super::audio;
use scope::render_scope;
use status::{render_status, AudioStats};

/// Samples shown by the scope
const VIS_BUFFER_SIZE: usize = 1024;
/// Capacity in scope windows for the audio→UI ring
const AUDIO_RING_BLOCKS: usize = 16;
/// Frequency change per arrow key press, in Hz
const FREQUENCY_STEP: f32 = 10.0;
const FREQUENCY_STEP_FINE: f32 = 1.0;
/// Attack, decay and release change per key press, in seconds
const STAGE_STEP: f64 = 0.01;
const SUSTAIN_STEP: f32 = 0.05;

pub fn run(config: &SynthConfig) -> EyreResult<()> {
    let (audio_tx, audio_rx) = RingBuffer::<f32>::new(VIS_BUFFER_SIZE * AUDIO_RING_BLOCKS);
    let (controller, _stream) = audio::start(config, Some(audio_tx))?;

    let mut terminal = ratatui::init();
    let res = UiApp::new(controller, audio_rx, config.tone_hold).run(&mut terminal);
    ratatui::restore();
    res
}

/// UI application state
struct UiApp {
    controller: Controller,
    /// Ring buffer receiver for rendered samples
    audio_rx: Consumer<f32>,
    /// Hold used by tones, for the envelope preview
    tone_hold: f64,
    /// Latest samples for the scope
    audio_buffer: Vec<f32>,
    /// Last rejected request, shown until the next key press
    message: Option<String>,
    should_quit: bool,
}

impl UiApp {
    fn new(controller: Controller, audio_rx: Consumer<f32>, tone_hold: f64) -> Self {
        Self {
            controller,
            audio_rx,
            tone_hold,
            audio_buffer: vec![0.0; VIS_BUFFER_SIZE],
            message: None,
            should_quit: false,
        }
    }

    fn run(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            self.poll_audio();
            self.controller.poll();

            terminal.draw(|frame| self.render(frame))?;

            // ~60fps
            if event::poll(Duration::from_millis(16))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code);
                    }
                }
            }
        }

        self.controller.stop_all()?;
        Ok(())
    }

    /// Keep only the last VIS_BUFFER_SIZE samples
    fn poll_audio(&mut self) {
        while let Ok(sample) = self.audio_rx.pop() {
            self.audio_buffer.push(sample);
        }
        if self.audio_buffer.len() > VIS_BUFFER_SIZE {
            let excess = self.audio_buffer.len() - VIS_BUFFER_SIZE;
            self.audio_buffer.drain(0..excess);
        }
    }

    fn handle_key(&mut self, key: KeyCode) {
        self.message = None;
        let result = match key {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.should_quit = true;
                Ok(())
            }
            KeyCode::Up => self.nudge_frequency(FREQUENCY_STEP),
            KeyCode::Down => self.nudge_frequency(-FREQUENCY_STEP),
            KeyCode::Right => self.nudge_frequency(FREQUENCY_STEP_FINE),
            KeyCode::Left => self.nudge_frequency(-FREQUENCY_STEP_FINE),
            KeyCode::Char('w') => {
                let next = self.controller.snapshot().waveform.next();
                self.controller.set_waveform(next);
                Ok(())
            }
            KeyCode::Char(c @ ('a' | 'A' | 'd' | 'D' | 'u' | 'U' | 'r' | 'R')) => {
                let envelope = step_envelope(self.controller.snapshot().envelope, c);
                self.controller.set_envelope(envelope)
            }
            KeyCode::Char('t') => self.controller.play_tone().map(|_| ()),
            KeyCode::Char('s') => self.controller.play_scale().map(|_| ()),
            KeyCode::Char(' ') => self.controller.stop_all(),
            _ => Ok(()),
        };

        if let Err(err) = result {
            tracing::warn!(%err, "request rejected");
            self.message = Some(err.to_string());
        }
    }

    /// Move the frequency, stopping at the edges of the allowed range.
    fn nudge_frequency(&mut self, delta: f32) -> Result<(), SynthError> {
        let current = self.controller.snapshot().frequency;
        let (low, high) = (*FREQUENCY_RANGE.start(), *FREQUENCY_RANGE.end());
        self.controller
            .set_frequency((current + delta).clamp(low, high))
    }

    fn render(&mut self, frame: &mut Frame) {
        let params = self.controller.snapshot();

        let area = frame.area();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4), // Status
                Constraint::Min(8),    // Scopes
                Constraint::Length(1), // Help bar
            ])
            .split(area);

        let stats = AudioStats::from_buffer(&self.audio_buffer);
        let live = self.controller.live_voices();
        render_status(
            frame,
            chunks[0],
            &params,
            self.controller.now_playing(),
            live,
            &stats,
            self.message.as_deref(),
        );

        render_scope(frame, chunks[1], &self.audio_buffer, &params, self.tone_hold);

        let help = Paragraph::new(
            " [↑/↓] ±10 Hz  [←/→] ±1 Hz  [W] Wave  [a/A d/D u/U r/R] ADSR -/+  \
             [T] Tone  [S] Scale  [Space] Stop  [Q] Quit",
        )
        .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(help, chunks[2]);
    }
}

/// Step one envelope stage down (lowercase key) or up (uppercase), clamped to
/// the range the controller accepts.
fn step_envelope(mut env: EnvelopeParams, key: char) -> EnvelopeParams {
    let sign = if key.is_ascii_uppercase() { 1.0 } else { -1.0 };
    let stage = |value: f64, range: &std::ops::RangeInclusive<f64>| {
        (value + sign * STAGE_STEP).clamp(*range.start(), *range.end())
    };
    match key.to_ascii_lowercase() {
        'a' => env.attack = stage(env.attack, &ATTACK_RANGE),
        'd' => env.decay = stage(env.decay, &DECAY_RANGE),
        'r' => env.release = stage(env.release, &RELEASE_RANGE),
        'u' => {
            env.sustain = (env.sustain + sign as f32 * SUSTAIN_STEP)
                .clamp(*SUSTAIN_RANGE.start(), *SUSTAIN_RANGE.end())
        }
        _ => {}
    }
    env
}
