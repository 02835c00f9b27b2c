//! Low-level DSP primitives used by the voice pipeline.
//!
//! These components are allocation-free and realtime-safe, making them safe to
//! embed directly inside voice structs. They stay focused on the
//! signal-processing math so the synth layer can handle lifecycle and
//! scheduling.

/// Attack/decay/sustain/release gain envelope.
pub mod envelope;
/// Waveform shapes and the per-voice phase accumulator.
pub mod oscillator;

pub use envelope::{Envelope, EnvelopeParams, EnvelopeStage};
pub use oscillator::{Oscillator, Waveform};
