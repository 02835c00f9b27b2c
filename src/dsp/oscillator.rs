use std::{f32::consts::TAU, fmt, str::FromStr};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::SynthError;

/*
Waveform Generator
==================

A waveform maps a phase in [0, 1) to an amplitude in [-1, 1]. The phase is
"how far through one cycle" we are; the oscillator advances it by
frequency / sample_rate every sample and wraps it back into [0, 1).

    phase   0.0        0.25        0.5        0.75        1.0
            │           │           │           │           │
  sine      0 ───╱‾‾‾‾‾‾1‾‾‾‾‾‾╲──── 0 ────╲___-1___╱────── 0
  square    1 ━━━━━━━━━━━━━━━━━━━━━┓ -1 ━━━━━━━━━━━━━━━━━━━━
  sawtooth -1 ──────────────────── 0 ──────────────────── 1
  triangle  1 ╲__________________ -1 __________________╱  1

Definitions:

  sine:      sin(2π·phase)
  square:    +1 if phase < 0.5, else -1
  sawtooth:  2·phase - 1
  triangle:  4·|phase - 0.5| - 1

All four are naive (non band-limited). At the 200-800 Hz range the control
surface allows, aliasing from square and sawtooth is audible only as a
slight brightness.

The waveform functions are pure. All state lives in `Oscillator`, which owns
exactly one phase accumulator per voice.
*/

/// One of the four supported oscillator shapes.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Waveform {
    #[default]
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

impl Waveform {
    pub const ALL: [Waveform; 4] = [
        Waveform::Sine,
        Waveform::Square,
        Waveform::Sawtooth,
        Waveform::Triangle,
    ];

    /// Evaluate the waveform at `phase`. Any finite phase is wrapped into
    /// [0, 1) first, so the result is periodic with period 1.
    #[inline]
    pub fn sample(self, phase: f32) -> f32 {
        let phase = wrap_phase(phase);
        match self {
            Waveform::Sine => (TAU * phase).sin(),
            Waveform::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Sawtooth => 2.0 * phase - 1.0,
            Waveform::Triangle => 4.0 * (phase - 0.5).abs() - 1.0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Waveform::Sine => "sine",
            Waveform::Square => "square",
            Waveform::Sawtooth => "sawtooth",
            Waveform::Triangle => "triangle",
        }
    }

    /// The next shape in `ALL`, wrapping around. Used by the terminal UI.
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|w| *w == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for Waveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Waveform {
    type Err = SynthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|w| w.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                SynthError::invalid(
                    "waveform",
                    format!("unknown waveform '{s}', expected sine|square|sawtooth|triangle"),
                )
            })
    }
}

#[inline]
fn wrap_phase(phase: f32) -> f32 {
    let wrapped = phase - phase.floor();
    // floor() can round a tiny negative phase up to exactly 1.0
    if wrapped >= 1.0 {
        0.0
    } else {
        wrapped
    }
}

/// Phase accumulator driving a single waveform.
#[derive(Debug, Clone)]
pub struct Oscillator {
    waveform: Waveform,
    phase: f32,
}

impl Oscillator {
    pub fn new(waveform: Waveform) -> Self {
        Self {
            waveform,
            phase: 0.0,
        }
    }

    pub fn sine() -> Self {
        Self::new(Waveform::Sine)
    }

    pub fn square() -> Self {
        Self::new(Waveform::Square)
    }

    pub fn sawtooth() -> Self {
        Self::new(Waveform::Sawtooth)
    }

    pub fn triangle() -> Self {
        Self::new(Waveform::Triangle)
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Output the current sample, then advance by `frequency / sample_rate`.
    #[inline]
    pub fn next_sample(&mut self, frequency: f32, sample_rate: f32) -> f32 {
        let out = self.waveform.sample(self.phase);
        self.phase = wrap_phase(self.phase + frequency / sample_rate);
        out
    }

    /// Fill `out` with consecutive samples.
    pub fn render(&mut self, out: &mut [f32], frequency: f32, sample_rate: f32) {
        for sample in out.iter_mut() {
            *sample = self.next_sample(frequency, sample_rate);
        }
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }
}
