use std::collections::HashSet;

use rtrb::{Consumer, Producer};

use crate::{
    clock::SampleClock,
    config::{check_envelope, check_frequency, ScaleConfig, SynthConfig},
    dsp::{EnvelopeParams, Waveform},
    error::{Result, SynthError},
    sequencing::{ScheduledNote, Sequence, SequencePlayer},
    synth::{Command, HandleRange, HandleSource, Notice, VoiceHandle},
};

/// Current tone parameters, as shown by a front end.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneParams {
    pub frequency: f32,
    pub waveform: Waveform,
    pub envelope: EnvelopeParams,
}

/// Control-thread half of the synth.
///
/// Validates every request synchronously, then hands it to the render
/// thread over the command ring. Never blocks: a full ring is reported as
/// [`SynthError::QueueFull`].
pub struct Controller {
    clock: SampleClock,
    handles: HandleSource,
    commands: Producer<Command>,
    notices: Consumer<Notice>,
    /// Handles issued here whose retirement has not been reported yet
    live: HashSet<VoiceHandle>,
    params: ToneParams,
    tone_hold: f64,
    scale: ScaleConfig,
    /// Notes of the latest tone or sequence, offset from `schedule_base`
    schedule: Vec<ScheduledNote>,
    schedule_base: f64,
}

impl Controller {
    pub(crate) fn new(
        clock: SampleClock,
        handles: HandleSource,
        commands: Producer<Command>,
        notices: Consumer<Notice>,
        config: &SynthConfig,
    ) -> Self {
        Self {
            clock,
            handles,
            commands,
            notices,
            live: HashSet::with_capacity(config.max_voices),
            params: ToneParams {
                frequency: config.frequency,
                waveform: config.waveform,
                envelope: config.envelope,
            },
            tone_hold: config.tone_hold,
            scale: config.scale.clone(),
            schedule: Vec::new(),
            schedule_base: 0.0,
        }
    }

    pub fn clock(&self) -> &SampleClock {
        &self.clock
    }

    pub fn snapshot(&self) -> ToneParams {
        self.params
    }

    /// Set the tone frequency; must lie in 200..=800 Hz.
    pub fn set_frequency(&mut self, hz: f32) -> Result<()> {
        check_frequency(hz)?;
        self.params.frequency = hz;
        Ok(())
    }

    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.params.waveform = waveform;
    }

    /// Set the envelope; each stage must lie in its surface range.
    pub fn set_envelope(&mut self, envelope: EnvelopeParams) -> Result<()> {
        check_envelope(&envelope)?;
        self.params.envelope = envelope.validated()?;
        Ok(())
    }

    /// Play one tone with the current parameters.
    ///
    /// The release is scheduled once attack and decay have run plus the
    /// configured hold. Overlapping calls layer independent voices.
    pub fn play_tone(&mut self) -> Result<VoiceHandle> {
        let ToneParams {
            frequency,
            waveform,
            envelope,
        } = self.params;
        let hold = envelope.attack + envelope.decay + self.tone_hold;
        let handle = self.handles.next();
        let start_time = self.clock.now();

        self.send(Command::Start {
            handle,
            frequency,
            waveform,
            envelope,
            start_time,
            release_after: Some(hold),
        })?;
        self.live.insert(handle);
        self.schedule.clear();
        self.schedule.push(ScheduledNote {
            frequency,
            offset: 0.0,
            hold,
        });
        self.schedule_base = start_time;

        tracing::info!(%handle, frequency, %waveform, "playing tone");
        Ok(handle)
    }

    /// Play the C-major scale with the configured hold and spacing.
    pub fn play_scale(&mut self) -> Result<HandleRange> {
        let envelope = self.scale.envelope.unwrap_or(self.params.envelope);
        let sequence = Sequence::c_major_scale(
            self.scale.spacing,
            self.scale.hold,
            self.params.waveform,
            envelope,
        )?;
        self.play_sequence(sequence)
    }

    /// Play an arbitrary sequence starting now.
    pub fn play_sequence(&mut self, sequence: Sequence) -> Result<HandleRange> {
        let base_time = self.clock.now();
        let notes = sequence.len();
        let schedule = sequence.notes().to_vec();
        SequencePlayer::log_schedule(&sequence, base_time);

        let handles = self.handles.reserve(notes);
        self.send(Command::PlaySequence {
            sequence: Box::new(sequence),
            handles,
            base_time,
        })?;
        self.live.extend(handles.iter());
        self.schedule = schedule;
        self.schedule_base = base_time;

        tracing::info!(notes, "playing sequence");
        Ok(handles)
    }

    /// Release one voice at the next processed tick.
    pub fn stop(&mut self, handle: VoiceHandle) -> Result<()> {
        self.poll();
        if !self.live.contains(&handle) {
            return Err(SynthError::InvalidHandle(handle));
        }
        self.send(Command::Stop {
            handle,
            time: self.clock.now(),
        })
    }

    /// Release every voice at the next processed tick.
    pub fn stop_all(&mut self) -> Result<()> {
        self.send(Command::StopAll {
            time: self.clock.now(),
        })?;
        self.schedule.clear();
        tracing::info!("stopping all voices");
        Ok(())
    }

    /// Frequency of the note from the latest tone or sequence that is
    /// between its note-on and note-off right now.
    pub fn now_playing(&self) -> Option<f32> {
        let elapsed = self.clock.now() - self.schedule_base;
        self.schedule
            .iter()
            .rev()
            .find(|note| (note.offset..note.offset + note.hold).contains(&elapsed))
            .map(|note| note.frequency)
    }

    /// Apply notices from the render thread.
    pub fn poll(&mut self) {
        while let Ok(notice) = self.notices.pop() {
            match notice {
                Notice::Retired(handle) => {
                    self.live.remove(&handle);
                    tracing::debug!(%handle, "voice retired");
                }
                Notice::SequenceDone(sequence) => {
                    tracing::debug!(notes = sequence.len(), "sequence finished");
                }
                Notice::Rejected { handles, error } => {
                    for handle in handles.iter() {
                        self.live.remove(&handle);
                    }
                    tracing::warn!(
                        %error,
                        voices = handles.len(),
                        "render thread rejected a command"
                    );
                }
            }
        }
    }

    /// Whether `handle` still refers to a voice on the render thread.
    pub fn is_live(&mut self, handle: VoiceHandle) -> bool {
        self.poll();
        self.live.contains(&handle)
    }

    /// Number of voices not yet retired, including ones queued to start.
    pub fn live_voices(&mut self) -> usize {
        self.poll();
        self.live.len()
    }

    fn send(&mut self, command: Command) -> Result<()> {
        self.commands.push(command).map_err(|_| {
            tracing::warn!("control queue full, command dropped");
            SynthError::QueueFull
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtrb::RingBuffer;

    #[test]
    fn rejected_notice_releases_its_handles() {
        let config = SynthConfig::default();
        let handles = HandleSource::new();
        let (command_tx, _command_rx) = RingBuffer::new(config.queue_capacity);
        let (mut notice_tx, notice_rx) = RingBuffer::new(8);
        let mut controller = Controller::new(
            SampleClock::new(1_000.0),
            handles,
            command_tx,
            notice_rx,
            &config,
        );

        let tone = controller.play_tone().unwrap();
        let scale = controller.play_scale().unwrap();
        assert_eq!(controller.live_voices(), 9);

        notice_tx
            .push(Notice::Rejected {
                handles: scale,
                error: SynthError::invalid("frequency", "must be positive"),
            })
            .unwrap();
        assert_eq!(controller.live_voices(), 1);
        assert!(controller.is_live(tone));
        assert!(!controller.is_live(scale.get(0).unwrap()));

        notice_tx
            .push(Notice::Rejected {
                handles: HandleRange::default(),
                error: SynthError::QueueFull,
            })
            .unwrap();
        assert_eq!(controller.live_voices(), 1);
    }
}
