use crate::{
    dsp::{EnvelopeParams, Waveform},
    error::{Result, SynthError},
    sequencing::notes::C_MAJOR_SCALE,
    synth::pipeline::validate_frequency,
};

/// A single note in a sequence
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledNote {
    /// Pitch in Hz
    pub frequency: f32,
    /// Seconds from sequence start to note-on
    pub offset: f64,
    /// Seconds from note-on to note-off
    pub hold: f64,
}

/// An ordered list of notes sharing one waveform and envelope
#[derive(Debug, Clone, PartialEq)]
pub struct Sequence {
    notes: Vec<ScheduledNote>,
    waveform: Waveform,
    envelope: EnvelopeParams,
}

impl Sequence {
    /// Create a new sequence builder
    pub fn builder(waveform: Waveform, envelope: EnvelopeParams) -> SequenceBuilder {
        SequenceBuilder::new(waveform, envelope)
    }

    /// One note per frequency, `spacing` seconds apart, each held for `hold`.
    pub fn evenly_spaced(
        frequencies: &[f32],
        spacing: f64,
        hold: f64,
        waveform: Waveform,
        envelope: EnvelopeParams,
    ) -> Result<Self> {
        frequencies
            .iter()
            .fold(
                Self::builder(waveform, envelope).spacing(spacing).hold(hold),
                |builder, &freq| builder.note(freq),
            )
            .build()
    }

    /// The eight-note C-major scale, C4 to C5.
    pub fn c_major_scale(
        spacing: f64,
        hold: f64,
        waveform: Waveform,
        envelope: EnvelopeParams,
    ) -> Result<Self> {
        Self::evenly_spaced(&C_MAJOR_SCALE, spacing, hold, waveform, envelope)
    }

    pub fn notes(&self) -> &[ScheduledNote] {
        &self.notes
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    pub fn envelope(&self) -> &EnvelopeParams {
        &self.envelope
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Seconds from sequence start until the last release has completed.
    pub fn duration(&self) -> f64 {
        self.notes
            .iter()
            .map(|n| n.offset + n.hold + self.envelope.release)
            .fold(0.0, f64::max)
    }
}

/// Builder for constructing sequences with a fluent API
pub struct SequenceBuilder {
    waveform: Waveform,
    envelope: EnvelopeParams,
    notes: Vec<ScheduledNote>,
    cursor: f64, // Offset of the next appended note
    spacing: f64,
    hold: f64,
}

impl SequenceBuilder {
    fn new(waveform: Waveform, envelope: EnvelopeParams) -> Self {
        Self {
            waveform,
            envelope,
            notes: Vec::new(),
            cursor: 0.0,
            spacing: 0.5,
            hold: 0.5,
        }
    }

    /// Seconds between consecutive appended notes (default: 0.5)
    pub fn spacing(mut self, spacing: f64) -> Self {
        self.spacing = spacing;
        self
    }

    /// Hold for subsequently appended notes (default: 0.5)
    pub fn hold(mut self, hold: f64) -> Self {
        self.hold = hold;
        self
    }

    /// Append a note at the cursor and advance by one spacing
    pub fn note(mut self, frequency: f32) -> Self {
        let offset = self.cursor();
        self.notes.push(ScheduledNote {
            frequency,
            offset,
            hold: self.hold,
        });
        self.cursor += 1.0;
        self
    }

    /// Skip one spacing without adding a note
    pub fn rest(mut self) -> Self {
        self.cursor += 1.0;
        self
    }

    /// Add a note at an explicit offset; the cursor is unaffected
    pub fn note_at(mut self, offset: f64, frequency: f32, hold: f64) -> Self {
        self.notes.push(ScheduledNote {
            frequency,
            offset,
            hold,
        });
        self
    }

    // The cursor counts slots so offsets are `index * spacing` rather than
    // an accumulated sum, which would drift with repeated addition.
    fn cursor(&self) -> f64 {
        self.cursor * self.spacing
    }

    /// Validate and build. Notes are ordered by offset.
    pub fn build(mut self) -> Result<Sequence> {
        check_time("spacing", self.spacing)?;
        let envelope = self.envelope.validated()?;

        for note in &self.notes {
            validate_frequency(note.frequency)?;
            check_time("offset", note.offset)?;
            check_time("hold", note.hold)?;
        }

        self.notes.sort_by(|a, b| a.offset.total_cmp(&b.offset));

        Ok(Sequence {
            notes: self.notes,
            waveform: self.waveform,
            envelope,
        })
    }
}

fn check_time(param: &'static str, seconds: f64) -> Result<()> {
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(SynthError::invalid(
            param,
            format!("must be finite and >= 0, got {seconds}"),
        ));
    }
    Ok(())
}
