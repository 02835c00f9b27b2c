use crate::{
    dsp::{EnvelopeParams, Waveform},
    error::SynthError,
    sequencing::Sequence,
    synth::handle::{HandleRange, VoiceHandle},
};

/// Requests sent from the control thread to the render thread.
///
/// Every request carries a time on the shared clock; the render thread
/// applies it at the first block boundary after it is pushed.
#[derive(Debug)]
pub enum Command {
    Start {
        handle: VoiceHandle,
        frequency: f32,
        waveform: Waveform,
        envelope: EnvelopeParams,
        start_time: f64,
        /// Seconds after the actual start at which to release, if known
        release_after: Option<f64>,
    },
    Stop {
        handle: VoiceHandle,
        time: f64,
    },
    PlaySequence {
        sequence: Box<Sequence>,
        handles: HandleRange,
        base_time: f64,
    },
    StopAll {
        time: f64,
    },
}

/// Notifications sent back from the render thread.
#[derive(Debug)]
pub enum Notice {
    /// The voice finished its release and its handle is no longer valid.
    Retired(VoiceHandle),
    /// A sequence has fully played out. Returned so it is dropped off the
    /// render thread.
    SequenceDone(Box<Sequence>),
    /// A command failed on the render thread. `handles` never started
    /// (empty when the command named no new voices).
    Rejected {
        handles: HandleRange,
        error: SynthError,
    },
}
