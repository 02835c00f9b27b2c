use crate::{
    dsp::{Envelope, EnvelopeParams, EnvelopeStage, Oscillator, Waveform},
    error::Result,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    Scheduled, // Start time not reached yet
    Active,    // Attack, decay or sustain
    Releasing, // Note-off passed, envelope in release
    Finished,  // Release complete, ready to retire
}

/// One note: an oscillator feeding a gain envelope.
///
/// The voice owns its phase accumulator and envelope outright; nothing else
/// holds a reference into it.
#[derive(Debug, Clone)]
pub struct Voice {
    frequency: f32,
    sample_rate: f32,
    oscillator: Oscillator,
    envelope: Envelope,
    /// Latest time this voice has rendered. Note-offs never land before it,
    /// so an already-rendered stretch of the curve is never rewritten.
    rendered_until: f64,
}

impl Voice {
    /// Build a voice. The frequency must already be checked; the envelope
    /// params and start time are checked here.
    pub(crate) fn new(
        frequency: f32,
        waveform: Waveform,
        params: EnvelopeParams,
        start_time: f64,
        sample_rate: f32,
    ) -> Result<Self> {
        Ok(Self {
            frequency,
            sample_rate,
            oscillator: Oscillator::new(waveform),
            envelope: Envelope::new(params, start_time)?,
            rendered_until: f64::NEG_INFINITY,
        })
    }

    /// Schedule the release. Returns whether the schedule changed.
    pub fn release(&mut self, time: f64) -> bool {
        self.envelope.note_off(time.max(self.rendered_until))
    }

    /// Render the sample at `time` and advance the phase accumulator.
    ///
    /// The accumulator only moves once the note has started, so every voice
    /// begins its waveform at phase zero.
    #[inline]
    pub fn render_sample(&mut self, time: f64) -> f32 {
        if time > self.rendered_until {
            self.rendered_until = time;
        }

        let stage = self.envelope.stage_at(time);
        if matches!(stage, EnvelopeStage::Idle | EnvelopeStage::Finished) {
            return 0.0;
        }

        let gain = self.envelope.level(stage);
        self.oscillator.next_sample(self.frequency, self.sample_rate) * gain
    }

    pub fn is_finished(&self, time: f64) -> bool {
        self.envelope.is_finished(time)
    }

    pub fn state(&self, time: f64) -> VoiceState {
        match self.envelope.stage_at(time) {
            EnvelopeStage::Idle => VoiceState::Scheduled,
            EnvelopeStage::Attack { .. } | EnvelopeStage::Decay { .. } | EnvelopeStage::Sustain => {
                VoiceState::Active
            }
            EnvelopeStage::Release { .. } => VoiceState::Releasing,
            EnvelopeStage::Finished => VoiceState::Finished,
        }
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn waveform(&self) -> Waveform {
        self.oscillator.waveform()
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }
}
