pub mod clock; // Shared sample-counting time reference
pub mod config;
pub mod dsp; // Oscillators and envelopes
pub mod engine; // Control/render thread split
pub mod error;
pub mod sequencing; // Notes, sequences and playback
pub mod synth; // Voices and the voice pipeline

pub use clock::SampleClock;
pub use config::SynthConfig;
pub use dsp::{Envelope, EnvelopeParams, Oscillator, Waveform};
pub use engine::{Controller, Engine};
pub use error::{Result, SynthError};
pub use sequencing::{Sequence, SequencePlayer};
pub use synth::{VoiceHandle, VoicePipeline};

/// Largest block the audio callback renders in one call.
pub const MAX_BLOCK_SIZE: usize = 2048;
