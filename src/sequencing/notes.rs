use std::fmt;

/*
Note Frequencies
================

Equal temperament: each semitone multiplies the frequency by 2^(1/12), with
A4 fixed at 440 Hz (MIDI note 69).

    f(n) = 440 * 2^((n - 69) / 12)

The C-major scale from middle C (C4, MIDI 60) up one octave uses only the
white keys: C D E F G A B C. Frequencies are rounded to two decimals.

  C4 261.63   D4 293.66   E4 329.63   F4 349.23
  G4 392.00   A4 440.00   B4 493.88   C5 523.25
*/

pub const C4: f32 = 261.63;
pub const D4: f32 = 293.66;
pub const E4: f32 = 329.63;
pub const F4: f32 = 349.23;
pub const G4: f32 = 392.00;
pub const A4: f32 = 440.00; // tuning reference
pub const B4: f32 = 493.88;
pub const C5: f32 = 523.25;

/// C4 up to C5.
pub const C_MAJOR_SCALE: [f32; 8] = [C4, D4, E4, F4, G4, A4, B4, C5];

const PITCH_CLASSES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Convert MIDI note number to frequency in Hz.
#[inline]
pub fn midi_note_to_freq(note: u8) -> f32 {
    440.0 * 2.0_f32.powf((note as f32 - 69.0) / 12.0)
}

/// Nearest MIDI note to `frequency`, or `None` outside the MIDI range.
pub fn freq_to_midi_note(frequency: f32) -> Option<u8> {
    if !frequency.is_finite() || frequency <= 0.0 {
        return None;
    }
    let note = (69.0 + 12.0 * (frequency / 440.0).log2()).round();
    (0.0..=127.0).contains(&note).then_some(note as u8)
}

/// Display name of the nearest equal-tempered note, e.g. `C4` or `F#5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteName {
    pitch_class: &'static str,
    octave: i8,
}

impl NoteName {
    pub fn from_midi(note: u8) -> Self {
        Self {
            pitch_class: PITCH_CLASSES[(note % 12) as usize],
            octave: (note / 12) as i8 - 1,
        }
    }

    pub fn from_freq(frequency: f32) -> Option<Self> {
        freq_to_midi_note(frequency).map(Self::from_midi)
    }
}

impl fmt::Display for NoteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.pitch_class, self.octave)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_names() {
        let names: Vec<String> = C_MAJOR_SCALE
            .iter()
            .map(|&f| NoteName::from_freq(f).unwrap().to_string())
            .collect();
        assert_eq!(names, ["C4", "D4", "E4", "F4", "G4", "A4", "B4", "C5"]);
    }

    #[test]
    fn scale_matches_equal_temperament() {
        for (&freq, midi) in C_MAJOR_SCALE.iter().zip([60, 62, 64, 65, 67, 69, 71, 72]) {
            assert!((midi_note_to_freq(midi) - freq).abs() < 0.01);
        }
    }

    #[test]
    fn sharps_and_out_of_range() {
        assert_eq!(NoteName::from_midi(66).to_string(), "F#4");
        assert_eq!(NoteName::from_freq(0.0), None);
        assert_eq!(NoteName::from_freq(-1.0), None);
        assert_eq!(NoteName::from_freq(100_000.0), None);
    }
}
