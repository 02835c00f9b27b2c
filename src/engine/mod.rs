//! Thread split between control and rendering.
//!
//! [`build`] returns a [`Controller`] for the thread that handles user
//! input and an [`Engine`] to move into the audio callback. They share
//! nothing but the clock, the handle counter and two rtrb rings.
//!
//! ```ignore
//! let (mut controller, mut engine) = mulberry::engine::build(48_000.0, &SynthConfig::default())?;
//! let _stream = device.build_output_stream(&config, move |data: &mut [f32], _| {
//!     engine.process_block(data);
//! }, |err| tracing::error!(%err), None)?;
//! controller.play_scale()?;
//! ```

mod controller;
mod renderer;

use rtrb::RingBuffer;

pub use controller::{Controller, ToneParams};
pub use renderer::Engine;

use renderer::NoticeOutbox;

use crate::{
    clock::SampleClock,
    config::SynthConfig,
    error::{Result, SynthError},
    sequencing::SequencePlayer,
    synth::{HandleSource, VoicePipeline},
};

/// Concurrent sequences the player reserves room for.
const SEQUENCE_SLOTS: usize = 8;

/// Create a connected controller/engine pair running at `sample_rate`.
pub fn build(sample_rate: f32, config: &SynthConfig) -> Result<(Controller, Engine)> {
    if !sample_rate.is_finite() || sample_rate <= 0.0 {
        return Err(SynthError::invalid(
            "sample_rate",
            format!("must be positive, got {sample_rate}"),
        ));
    }
    config.validate()?;

    let clock = SampleClock::new(sample_rate);
    let handles = HandleSource::new();

    let (command_tx, command_rx) = RingBuffer::new(config.queue_capacity);
    // One retirement per voice plus finished sequences; a slower reader
    // spills into the outbox backlog instead
    let notice_slots = config.queue_capacity + 2 * config.max_voices.max(1);
    let (notice_tx, notice_rx) = RingBuffer::new(notice_slots);
    let notices = NoticeOutbox::new(notice_tx, notice_slots);

    let pipeline = VoicePipeline::with_capacity(sample_rate, config.max_voices, handles.clone());
    let player = SequencePlayer::with_capacity(SEQUENCE_SLOTS, config.max_voices);

    tracing::debug!(
        sample_rate,
        queue_capacity = config.queue_capacity,
        max_voices = config.max_voices,
        "engine built"
    );

    let controller = Controller::new(clock.clone(), handles, command_tx, notice_rx, config);
    let engine = Engine::new(clock, pipeline, player, command_rx, notices);
    Ok((controller, engine))
}
