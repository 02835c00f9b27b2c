//! SequencePlayer - chains voices to play a sequence
//!
//! Every note is started up front with its absolute start and stop times on
//! the shared clock, so timing is sample-accurate no matter how large the
//! audio blocks are. The player keeps the handles of in-flight notes and
//! drops them once the pipeline has retired the voice.

use crate::{
    error::{Result, SynthError},
    sequencing::{NoteName, Sequence},
    synth::{HandleRange, VoiceHandle, VoicePipeline},
};

/// Playback state for one sequence
struct Playback {
    sequence: Box<Sequence>,
    handles: HandleRange,
}

pub struct SequencePlayer {
    playing: Vec<Playback>,
    /// Handles of notes whose voices are still in the pipeline
    in_flight: Vec<VoiceHandle>,
}

impl SequencePlayer {
    pub fn new() -> Self {
        Self::with_capacity(4, 64)
    }

    /// Reserve room for `sequences` concurrent sequences and `voices` notes.
    pub fn with_capacity(sequences: usize, voices: usize) -> Self {
        Self {
            playing: Vec::with_capacity(sequences),
            in_flight: Vec::with_capacity(voices),
        }
    }

    /// Start every note of `sequence` relative to `base_time`.
    pub fn play(
        &mut self,
        pipeline: &mut VoicePipeline,
        sequence: Sequence,
        base_time: f64,
    ) -> Result<HandleRange> {
        let handles = pipeline.handle_source().reserve(sequence.len());
        self.play_reserved(pipeline, Box::new(sequence), handles, base_time)?;
        if let Some(playback) = self.playing.last() {
            Self::log_schedule(&playback.sequence, base_time);
        }
        Ok(handles)
    }

    /// Log each note of `sequence` with its name, e.g. `C4`, and start time.
    ///
    /// Kept out of [`Self::play_reserved`] so the render thread never
    /// formats log lines; the controller calls this before queueing.
    pub fn log_schedule(sequence: &Sequence, base_time: f64) {
        for note in sequence.notes() {
            let start = base_time + note.offset;
            match NoteName::from_freq(note.frequency) {
                Some(name) => tracing::debug!(
                    note = %name,
                    frequency = note.frequency,
                    start,
                    hold = note.hold,
                    "scheduling note"
                ),
                None => tracing::debug!(
                    frequency = note.frequency,
                    start,
                    hold = note.hold,
                    "scheduling note"
                ),
            }
        }
    }

    /// Like [`Self::play`], with handles reserved by the caller beforehand.
    ///
    /// Note `i` of the sequence is started under `handles.get(i)`.
    pub fn play_reserved(
        &mut self,
        pipeline: &mut VoicePipeline,
        sequence: Box<Sequence>,
        handles: HandleRange,
        base_time: f64,
    ) -> Result<()> {
        if !base_time.is_finite() {
            return Err(SynthError::invalid(
                "base_time",
                format!("must be finite, got {base_time}"),
            ));
        }
        if handles.len() != sequence.len() {
            return Err(SynthError::invalid(
                "handles",
                format!(
                    "reserved {} handles for {} notes",
                    handles.len(),
                    sequence.len()
                ),
            ));
        }

        let waveform = sequence.waveform();
        let envelope = *sequence.envelope();

        for (note, handle) in sequence.notes().iter().zip(handles.iter()) {
            let start = base_time + note.offset;
            pipeline.start_with_handle(handle, note.frequency, waveform, envelope, start)?;
            pipeline.stop(handle, start + note.hold)?;
            self.in_flight.push(handle);
        }

        self.playing.push(Playback { sequence, handles });
        Ok(())
    }

    /// Stop every in-flight note at `time`. Calling it again changes nothing.
    pub fn stop_all(&mut self, pipeline: &mut VoicePipeline, time: f64) {
        for &handle in &self.in_flight {
            // A voice retired since the last prune is simply gone
            let _ = pipeline.stop(handle, time);
        }
    }

    /// Forget voices the pipeline has retired; finished sequences are dropped.
    pub fn prune(&mut self, pipeline: &VoicePipeline) {
        self.prune_with(pipeline, drop);
    }

    /// Forget retired voices and hand each fully played sequence to `on_done`.
    pub fn prune_with(&mut self, pipeline: &VoicePipeline, mut on_done: impl FnMut(Box<Sequence>)) {
        self.in_flight.retain(|&h| pipeline.contains(h));

        let mut i = 0;
        while i < self.playing.len() {
            let handles = self.playing[i].handles;
            if self.in_flight.iter().any(|&h| handles.contains(h)) {
                i += 1;
            } else {
                on_done(self.playing.swap_remove(i).sequence);
            }
        }
    }

    pub fn in_flight(&self) -> &[VoiceHandle] {
        &self.in_flight
    }

    pub fn is_idle(&self) -> bool {
        self.playing.is_empty()
    }
}

impl Default for SequencePlayer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dsp::{EnvelopeParams, Waveform},
        sequencing::notes::C5,
        synth::VoiceState,
    };

    const SAMPLE_RATE: f32 = 1_000.0;

    fn scale() -> Sequence {
        let env = EnvelopeParams::new(0.01, 0.05, 0.6, 0.05).unwrap();
        Sequence::c_major_scale(0.45, 0.4, Waveform::Sine, env).unwrap()
    }

    #[derive(Clone, Default)]
    struct Capture(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Capture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn schedule_is_logged_with_note_names() {
        let capture = Capture::default();
        let writer = capture.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let mut pipeline = VoicePipeline::new(SAMPLE_RATE);
            SequencePlayer::new()
                .play(&mut pipeline, scale(), 1.0)
                .unwrap();
        });

        let text = String::from_utf8(capture.0.lock().unwrap().clone()).unwrap();
        assert_eq!(text.matches("scheduling note").count(), 8);
        assert!(text.contains("note=C4"));
        assert!(text.contains("note=F4"));
        assert!(text.contains("note=C5"));
    }

    #[test]
    fn eighth_note_starts_at_three_fifteen() {
        let mut pipeline = VoicePipeline::new(SAMPLE_RATE);
        let mut player = SequencePlayer::new();
        let handles = player.play(&mut pipeline, scale(), 0.0).unwrap();

        let last = handles.get(7).unwrap();
        assert_eq!(pipeline.state(last, 3.149).unwrap(), VoiceState::Scheduled);
        assert_eq!(pipeline.state(last, 3.151).unwrap(), VoiceState::Active);
        assert_eq!(scale().notes()[7].frequency, C5);
        assert_eq!(player.in_flight().len(), 8);
    }

    #[test]
    fn notes_release_after_hold() {
        let mut pipeline = VoicePipeline::new(SAMPLE_RATE);
        let mut player = SequencePlayer::new();
        let handles = player.play(&mut pipeline, scale(), 1.0).unwrap();

        let first = handles.get(0).unwrap();
        assert_eq!(pipeline.state(first, 1.39).unwrap(), VoiceState::Active);
        assert_eq!(pipeline.state(first, 1.41).unwrap(), VoiceState::Releasing);
        assert_eq!(pipeline.state(first, 1.46).unwrap(), VoiceState::Finished);
    }

    #[test]
    fn prune_drops_sequence_after_last_voice() {
        let mut pipeline = VoicePipeline::new(SAMPLE_RATE);
        let mut player = SequencePlayer::new();
        player.play(&mut pipeline, scale(), 0.0).unwrap();

        let mut done = 0;
        let mut n = 0u64;
        while !player.is_idle() {
            let t = n as f64 / SAMPLE_RATE as f64;
            pipeline.render_mix(t, |_| {});
            player.prune_with(&pipeline, |_| done += 1);
            n += 1;
            assert!(n < 10_000, "sequence never finished");
        }

        assert_eq!(done, 1);
        assert!(pipeline.is_empty());
        assert!(player.in_flight().is_empty());
        // last note: 3.15 + 0.4 hold + 0.05 release
        let end = n as f64 / SAMPLE_RATE as f64;
        assert!((end - 3.6).abs() < 0.01, "ended at {end}");
    }

    #[test]
    fn stop_all_cuts_pending_and_sounding_notes() {
        let mut pipeline = VoicePipeline::new(SAMPLE_RATE);
        let mut player = SequencePlayer::new();
        let handles = player.play(&mut pipeline, scale(), 0.0).unwrap();

        player.stop_all(&mut pipeline, 0.2);
        player.stop_all(&mut pipeline, 0.2);

        for h in handles.iter() {
            assert!(pipeline.is_finished(h, 4.0).unwrap());
        }
        // First note releases at 0.2 instead of 0.4
        let first = handles.get(0).unwrap();
        assert_eq!(pipeline.state(first, 0.21).unwrap(), VoiceState::Releasing);
        // Second note never sounds
        let second = handles.get(1).unwrap();
        assert_eq!(pipeline.state(second, 0.5).unwrap(), VoiceState::Finished);
    }

    #[test]
    fn mismatched_reservation_is_rejected() {
        let mut pipeline = VoicePipeline::new(SAMPLE_RATE);
        let mut player = SequencePlayer::new();
        let handles = pipeline.handle_source().reserve(3);
        let err = player.play_reserved(&mut pipeline, Box::new(scale()), handles, 0.0);
        assert!(err.is_err());
        assert!(pipeline.is_empty());
        assert!(player.is_idle());
    }
}
