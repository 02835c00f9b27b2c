use std::collections::VecDeque;

use rtrb::{Consumer, Producer, PushError};

use crate::{
    clock::SampleClock,
    error::SynthError,
    sequencing::SequencePlayer,
    synth::{Command, HandleRange, Notice, VoicePipeline},
};

/// Render-side end of the notice ring.
///
/// Notices that do not fit wait in `pending` and go out, oldest first, at
/// the start of the next block, so a slow reader never loses a retirement.
/// `pending` is reserved up front and only grows if the reader falls
/// further behind than that.
pub(crate) struct NoticeOutbox {
    ring: Producer<Notice>,
    pending: VecDeque<Notice>,
}

impl NoticeOutbox {
    pub(crate) fn new(ring: Producer<Notice>, reserve: usize) -> Self {
        Self {
            ring,
            pending: VecDeque::with_capacity(reserve),
        }
    }

    fn send(&mut self, notice: Notice) {
        if !self.pending.is_empty() {
            self.pending.push_back(notice);
            return;
        }
        if let Err(PushError::Full(notice)) = self.ring.push(notice) {
            self.pending.push_back(notice);
        }
    }

    fn flush(&mut self) {
        while let Some(notice) = self.pending.pop_front() {
            if let Err(PushError::Full(notice)) = self.ring.push(notice) {
                self.pending.push_front(notice);
                break;
            }
        }
    }

    fn backlog(&self) -> usize {
        self.pending.len()
    }
}

/// Render-thread half of the synth.
///
/// Owns the voice pipeline and sequence player outright. Control requests
/// arrive on the command ring and are applied at the start of each block;
/// retirements and failures go back through the notice outbox. Nothing on
/// this path logs: failures are reported to the controller, which logs them.
pub struct Engine {
    clock: SampleClock,
    pipeline: VoicePipeline,
    player: SequencePlayer,
    commands: Consumer<Command>,
    notices: NoticeOutbox,
}

impl Engine {
    pub(crate) fn new(
        clock: SampleClock,
        pipeline: VoicePipeline,
        player: SequencePlayer,
        commands: Consumer<Command>,
        notices: NoticeOutbox,
    ) -> Self {
        Self {
            clock,
            pipeline,
            player,
            commands,
            notices,
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.clock.sample_rate()
    }

    pub fn clock(&self) -> &SampleClock {
        &self.clock
    }

    pub fn active_voices(&self) -> usize {
        self.pipeline.active_count()
    }

    /// Notices waiting for room in the ring.
    pub fn undelivered_notices(&self) -> usize {
        self.notices.backlog()
    }

    /// Render `out.len()` mono samples: the clipped sum of every live voice.
    pub fn process_block(&mut self, out: &mut [f32]) {
        self.notices.flush();
        self.drain_commands();

        let first_frame = self.clock.frames();
        for (n, sample) in out.iter_mut().enumerate() {
            let time = self.clock.frames_to_seconds(first_frame + n as u64);
            let notices = &mut self.notices;
            let mix = self
                .pipeline
                .render_mix(time, |handle| notices.send(Notice::Retired(handle)));
            *sample = mix.clamp(-1.0, 1.0);
        }
        self.clock.advance(out.len() as u64);

        let notices = &mut self.notices;
        self.player.prune_with(&self.pipeline, |sequence| {
            notices.send(Notice::SequenceDone(sequence));
        });
    }

    fn drain_commands(&mut self) {
        let now = self.clock.now();
        while let Ok(command) = self.commands.pop() {
            self.apply(command, now);
        }
    }

    fn apply(&mut self, command: Command, now: f64) {
        let (handles, result) = match command {
            Command::Start {
                handle,
                frequency,
                waveform,
                envelope,
                start_time,
                release_after,
            } => {
                let start = start_time.max(now);
                let result = self
                    .pipeline
                    .start_with_handle(handle, frequency, waveform, envelope, start)
                    .and_then(|()| match release_after {
                        Some(hold) => self.pipeline.stop(handle, start + hold),
                        None => Ok(()),
                    });
                (HandleRange::from(handle), result)
            }
            Command::Stop { handle, time } => (
                HandleRange::default(),
                self.pipeline.stop(handle, time.max(now)),
            ),
            Command::PlaySequence {
                sequence,
                handles,
                base_time,
            } => (
                handles,
                self.player
                    .play_reserved(&mut self.pipeline, sequence, handles, base_time.max(now)),
            ),
            Command::StopAll { time } => {
                let time = time.max(now);
                self.player.stop_all(&mut self.pipeline, time);
                (HandleRange::default(), self.pipeline.stop_all(time))
            }
        };

        match result {
            Ok(()) => {}
            // A stop raced with the voice's retirement; nothing to do
            Err(SynthError::InvalidHandle(_)) if handles.is_empty() => {}
            Err(error) => self.notices.send(Notice::Rejected { handles, error }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dsp::{EnvelopeParams, Waveform},
        synth::HandleSource,
    };
    use rtrb::RingBuffer;

    fn engine() -> (Producer<Command>, Consumer<Notice>, Engine, HandleSource) {
        let handles = HandleSource::new();
        let (command_tx, command_rx) = RingBuffer::new(8);
        let (notice_tx, notice_rx) = RingBuffer::new(8);
        let engine = Engine::new(
            SampleClock::new(1_000.0),
            VoicePipeline::with_capacity(1_000.0, 4, handles.clone()),
            SequencePlayer::new(),
            command_rx,
            NoticeOutbox::new(notice_tx, 8),
        );
        (command_tx, notice_rx, engine, handles)
    }

    #[test]
    fn failed_start_comes_back_as_rejected() {
        let (mut commands, mut notices, mut engine, handles) = engine();
        let handle = handles.next();
        commands
            .push(Command::Start {
                handle,
                frequency: -5.0,
                waveform: Waveform::Sine,
                envelope: EnvelopeParams::default(),
                start_time: 0.0,
                release_after: Some(0.5),
            })
            .unwrap();
        engine.process_block(&mut [0.0; 16]);

        assert_eq!(engine.active_voices(), 0);
        match notices.pop() {
            Ok(Notice::Rejected { handles, error }) => {
                assert!(handles.contains(handle));
                assert_eq!(handles.len(), 1);
                assert!(matches!(
                    error,
                    SynthError::InvalidParameter {
                        param: "frequency",
                        ..
                    }
                ));
            }
            other => panic!("expected a rejection, got {other:?}"),
        }
    }

    #[test]
    fn stop_of_retired_voice_is_silent() {
        let (mut commands, mut notices, mut engine, handles) = engine();
        commands
            .push(Command::Stop {
                handle: handles.next(),
                time: 0.0,
            })
            .unwrap();
        engine.process_block(&mut [0.0; 16]);
        assert!(notices.pop().is_err());
    }
}
