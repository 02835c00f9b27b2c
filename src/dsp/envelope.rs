#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Result, SynthError};

/*
ADSR Gain Envelope
==================

The envelope is the gain stage of every voice: it multiplies the oscillator
output by a level in [0, 1] that rises, settles and falls over the life of a
note.

Vocabulary
----------

  note-on    Absolute time (seconds on the shared clock) the note starts.
  note-off   Absolute time the key is released. May be scheduled ahead of
             time, and may be moved EARLIER later on (stop-all), never later.
             A note-off at or before note-on cancels the note outright.
  held curve The gain the note would have if it were never released:
             attack, then decay, then sustain forever.
  stage      Which segment of the curve a given instant falls in.


The Shape
---------

  Gain
    1.0 ┐     ╱╲
        │    ╱  ╲___________
    S   │   ╱               ╲
        │  ╱                 ╲
    0.0 └─╱───────────────────╲──→ Time
         on                  off  off+R
        Attack Decay  Sustain  Release

Every segment is a straight line:

    gain = start + (end - start) * clamp(elapsed / duration, 0, 1)


Timeline Evaluation
-------------------

Rather than stepping a level forward sample by sample, the envelope is a
function of time. `stage_at(t)` resolves which stage `t` falls into, carrying
the elapsed time inside that stage, and the gain is read off the stage:

    t < on                        Idle
    on <= t, no note-off yet      held curve:  Attack → Decay → Sustain
    off <= t < off + R            Release, starting from held(off)
    off + R <= t                  Finished

    off <= on (cancelled):  Idle before off, Finished from off onwards

Release starts from the held curve evaluated AT the note-off instant. A key
released half way up the attack ramp therefore fades from 0.5, not from the
peak or the sustain level. That keeps the curve continuous at every
transition, which is what keeps releases click-free.

Zero-length stages are skipped: attack = 0 starts the note in Decay at full
level, decay = 0 drops straight to sustain, release = 0 finishes the note at
note-off.

Because gain is a pure function of (params, on, off, t), rendering the same
instant twice returns the same value, and a duplicate note-off changes
nothing.


Boundary Tolerance
------------------

Note times usually come from decimal arithmetic (0.5 + 0.2, 7 * 0.45), which
is not exact in binary floating point. A stage is considered complete once
`elapsed + TIME_EPSILON >= duration`, and a note counts as started once
`t + TIME_EPSILON >= on`. One nanosecond is far below one sample
period at any audio rate, so this never shifts a transition by a sample.
*/

/// Slack applied when testing whether a stage has run its full duration.
pub const TIME_EPSILON: f64 = 1e-9;

/// Attack/decay/release times in seconds plus the sustain level.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeParams {
    pub attack: f64,
    pub decay: f64,
    pub sustain: f32,
    pub release: f64,
}

impl Default for EnvelopeParams {
    fn default() -> Self {
        Self {
            attack: 0.1,
            decay: 0.2,
            sustain: 0.5,
            release: 0.3,
        }
    }
}

impl EnvelopeParams {
    /// Build validated params. Durations must be finite and non-negative;
    /// a finite sustain is clamped into [0, 1].
    pub fn new(attack: f64, decay: f64, sustain: f32, release: f64) -> Result<Self> {
        Self {
            attack,
            decay,
            sustain,
            release,
        }
        .validated()
    }

    /// Check the durations and return a copy with sustain clamped.
    pub fn validated(self) -> Result<Self> {
        check_duration("attack", self.attack)?;
        check_duration("decay", self.decay)?;
        check_duration("release", self.release)?;
        if !self.sustain.is_finite() {
            return Err(SynthError::invalid(
                "sustain",
                format!("must be finite, got {}", self.sustain),
            ));
        }

        Ok(Self {
            sustain: self.sustain.clamp(0.0, 1.0),
            ..self
        })
    }
}

fn check_duration(param: &'static str, seconds: f64) -> Result<()> {
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(SynthError::invalid(
            param,
            format!("duration must be finite and >= 0, got {seconds}"),
        ));
    }
    Ok(())
}

/// Where on the curve a given instant falls, with the timing data needed to
/// evaluate the gain there.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EnvelopeStage {
    /// Before note-on.
    Idle,
    /// Ramping 0 → 1; `elapsed` seconds since note-on.
    Attack { elapsed: f64 },
    /// Ramping 1 → sustain; `elapsed` seconds since decay began.
    Decay { elapsed: f64 },
    /// Holding the sustain level.
    Sustain,
    /// Ramping `from` → 0; `elapsed` seconds since note-off.
    Release { elapsed: f64, from: f32 },
    /// Terminal.
    Finished,
}

impl EnvelopeStage {
    pub fn name(&self) -> &'static str {
        match self {
            EnvelopeStage::Idle => "idle",
            EnvelopeStage::Attack { .. } => "attack",
            EnvelopeStage::Decay { .. } => "decay",
            EnvelopeStage::Sustain => "sustain",
            EnvelopeStage::Release { .. } => "release",
            EnvelopeStage::Finished => "finished",
        }
    }
}

/// Linear ramp from `start` to `end` over `duration` seconds.
#[inline]
fn ramp(start: f32, end: f32, elapsed: f64, duration: f64) -> f32 {
    if duration <= 0.0 {
        return end;
    }
    let progress = (elapsed / duration).clamp(0.0, 1.0) as f32;
    start + (end - start) * progress
}

#[inline]
fn reached(elapsed: f64, duration: f64) -> bool {
    elapsed + TIME_EPSILON >= duration
}

/// ADSR gain scheduler for one note.
#[derive(Debug, Clone)]
pub struct Envelope {
    params: EnvelopeParams,
    note_on: f64,
    note_off: Option<f64>,
}

impl Envelope {
    /// Envelope for a note starting at `note_on`.
    ///
    /// `params` go through [`EnvelopeParams::validated`], so raw values
    /// straight from the public fields are checked and sustain is clamped.
    pub fn new(params: EnvelopeParams, note_on: f64) -> Result<Self> {
        if !note_on.is_finite() {
            return Err(SynthError::invalid(
                "note_on",
                format!("must be finite, got {note_on}"),
            ));
        }
        Ok(Self {
            params: params.validated()?,
            note_on,
            note_off: None,
        })
    }

    /// Schedule the release at `time`.
    ///
    /// A note-off at or after an already scheduled one is ignored; an earlier
    /// one replaces it. A note-off at or before note-on cancels the note.
    /// Returns whether the schedule changed.
    pub fn note_off(&mut self, time: f64) -> bool {
        match self.note_off {
            Some(scheduled) if scheduled <= time => false,
            _ => {
                self.note_off = Some(time);
                true
            }
        }
    }

    pub fn params(&self) -> &EnvelopeParams {
        &self.params
    }

    pub fn note_on_time(&self) -> f64 {
        self.note_on
    }

    pub fn note_off_time(&self) -> Option<f64> {
        self.note_off
    }

    /// Time at which the envelope reaches Finished, once a note-off exists.
    pub fn finish_time(&self) -> Option<f64> {
        self.note_off.map(|off| {
            if self.is_cancelled(off) {
                off
            } else {
                off + self.params.release
            }
        })
    }

    #[inline]
    fn is_cancelled(&self, off: f64) -> bool {
        off <= self.note_on
    }

    /// Stage of the held curve `elapsed` seconds after note-on.
    fn held_stage(&self, elapsed: f64) -> EnvelopeStage {
        let p = &self.params;
        if !reached(elapsed, p.attack) {
            return EnvelopeStage::Attack {
                elapsed: elapsed.max(0.0),
            };
        }

        let decay_elapsed = elapsed - p.attack;
        if !reached(decay_elapsed, p.decay) {
            return EnvelopeStage::Decay {
                elapsed: decay_elapsed.max(0.0),
            };
        }

        EnvelopeStage::Sustain
    }

    /// Resolve the stage at absolute time `time`.
    pub fn stage_at(&self, time: f64) -> EnvelopeStage {
        if let Some(off) = self.note_off.filter(|&off| self.is_cancelled(off)) {
            return if reached(time - off, 0.0) {
                EnvelopeStage::Finished
            } else {
                EnvelopeStage::Idle
            };
        }

        let elapsed = time - self.note_on;
        if !reached(elapsed, 0.0) {
            return EnvelopeStage::Idle;
        }

        match self.note_off {
            Some(off) if reached(time - off, 0.0) => {
                let release_elapsed = (time - off).max(0.0);
                if reached(release_elapsed, self.params.release) {
                    EnvelopeStage::Finished
                } else {
                    let from = self.level(self.held_stage(off - self.note_on));
                    EnvelopeStage::Release {
                        elapsed: release_elapsed,
                        from,
                    }
                }
            }
            _ => self.held_stage(elapsed),
        }
    }

    /// Gain for a stage returned by [`Envelope::stage_at`].
    pub fn level(&self, stage: EnvelopeStage) -> f32 {
        let p = &self.params;
        match stage {
            EnvelopeStage::Idle | EnvelopeStage::Finished => 0.0,
            EnvelopeStage::Attack { elapsed } => ramp(0.0, 1.0, elapsed, p.attack),
            EnvelopeStage::Decay { elapsed } => ramp(1.0, p.sustain, elapsed, p.decay),
            EnvelopeStage::Sustain => p.sustain,
            EnvelopeStage::Release { elapsed, from } => ramp(from, 0.0, elapsed, p.release),
        }
    }

    /// Gain multiplier in [0, 1] at absolute time `time`.
    #[inline]
    pub fn gain_at(&self, time: f64) -> f32 {
        let gain = self.level(self.stage_at(time));
        debug_assert!((0.0..=1.0).contains(&gain));
        gain
    }

    pub fn is_finished(&self, time: f64) -> bool {
        matches!(self.stage_at(time), EnvelopeStage::Finished)
    }

    /// Fill `out` with gains for consecutive samples starting at `start_time`.
    pub fn render(&self, out: &mut [f32], start_time: f64, sample_rate: f32) {
        let dt = 1.0 / sample_rate as f64;
        for (n, gain) in out.iter_mut().enumerate() {
            *gain = self.gain_at(start_time + n as f64 * dt);
        }
    }
}
