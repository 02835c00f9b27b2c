use crate::{
    dsp::{EnvelopeParams, Waveform},
    error::{Result, SynthError},
    synth::{
        handle::{HandleSource, VoiceHandle},
        voice::{Voice, VoiceState},
    },
};

/// Default number of voice slots reserved up front.
pub const DEFAULT_VOICE_CAPACITY: usize = 64;

/// Owns every live voice and addresses them by handle.
///
/// All methods run on the render thread (or in a single-threaded offline
/// render). `render_sample` and `render_mix` never allocate; `start` only
/// allocates if more voices are alive than the reserved capacity.
pub struct VoicePipeline {
    sample_rate: f32,
    voices: Vec<(VoiceHandle, Voice)>,
    handles: HandleSource,
}

impl VoicePipeline {
    pub fn new(sample_rate: f32) -> Self {
        Self::with_capacity(sample_rate, DEFAULT_VOICE_CAPACITY, HandleSource::new())
    }

    pub fn with_capacity(sample_rate: f32, capacity: usize, handles: HandleSource) -> Self {
        Self {
            sample_rate,
            voices: Vec::with_capacity(capacity),
            handles,
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// The counter this pipeline issues handles from.
    pub fn handle_source(&self) -> &HandleSource {
        &self.handles
    }

    /// Start a voice whose attack begins at `start_time`.
    pub fn start(
        &mut self,
        frequency: f32,
        waveform: Waveform,
        envelope: EnvelopeParams,
        start_time: f64,
    ) -> Result<VoiceHandle> {
        let voice = self.build_voice(frequency, waveform, envelope, start_time)?;
        let handle = self.handles.next();
        self.insert(handle, voice);
        Ok(handle)
    }

    /// Start a voice under a handle reserved earlier from [`Self::handle_source`].
    pub fn start_with_handle(
        &mut self,
        handle: VoiceHandle,
        frequency: f32,
        waveform: Waveform,
        envelope: EnvelopeParams,
        start_time: f64,
    ) -> Result<()> {
        if self.contains(handle) {
            return Err(SynthError::InvalidHandle(handle));
        }
        let voice = self.build_voice(frequency, waveform, envelope, start_time)?;
        self.insert(handle, voice);
        Ok(())
    }

    fn build_voice(
        &self,
        frequency: f32,
        waveform: Waveform,
        envelope: EnvelopeParams,
        start_time: f64,
    ) -> Result<Voice> {
        validate_frequency(frequency)?;
        check_time("start_time", start_time)?;
        Voice::new(frequency, waveform, envelope, start_time, self.sample_rate)
    }

    fn insert(&mut self, handle: VoiceHandle, voice: Voice) {
        self.voices.push((handle, voice));
    }

    /// Schedule note-off for `handle` at `stop_time`.
    ///
    /// Stopping a voice that is already stopped or finished is a no-op.
    pub fn stop(&mut self, handle: VoiceHandle, stop_time: f64) -> Result<()> {
        check_time("stop_time", stop_time)?;
        self.voice_mut(handle)?.release(stop_time);
        Ok(())
    }

    /// Render one sample of a single voice.
    ///
    /// Returns 0.0 and retires the voice once its envelope has finished;
    /// the handle is invalid afterwards.
    pub fn render_sample(&mut self, handle: VoiceHandle, time: f64) -> Result<f32> {
        let idx = self.index_of(handle)?;
        if self.voices[idx].1.is_finished(time) {
            self.voices.swap_remove(idx);
            return Ok(0.0);
        }
        Ok(self.voices[idx].1.render_sample(time))
    }

    pub fn is_finished(&self, handle: VoiceHandle, time: f64) -> Result<bool> {
        Ok(self.voice(handle)?.is_finished(time))
    }

    pub fn state(&self, handle: VoiceHandle, time: f64) -> Result<VoiceState> {
        Ok(self.voice(handle)?.state(time))
    }

    /// Sum every live voice at `time`, retiring those that have finished.
    ///
    /// `on_retire` is called once per retired handle. This is the per-sample
    /// hot path: no allocation, no locking.
    #[inline]
    pub fn render_mix(&mut self, time: f64, mut on_retire: impl FnMut(VoiceHandle)) -> f32 {
        let mut sum = 0.0;
        let mut i = 0;
        while i < self.voices.len() {
            let (handle, voice) = &mut self.voices[i];
            if voice.is_finished(time) {
                let handle = *handle;
                self.voices.swap_remove(i);
                on_retire(handle);
                continue;
            }
            sum += voice.render_sample(time);
            i += 1;
        }
        sum
    }

    /// Retire every voice that has finished by `time` without rendering.
    pub fn retire_finished(&mut self, time: f64, mut on_retire: impl FnMut(VoiceHandle)) {
        self.voices.retain(|(handle, voice)| {
            let keep = !voice.is_finished(time);
            if !keep {
                on_retire(*handle);
            }
            keep
        });
    }

    /// Schedule note-off for every live voice.
    pub fn stop_all(&mut self, stop_time: f64) -> Result<()> {
        check_time("stop_time", stop_time)?;
        for (_, voice) in &mut self.voices {
            voice.release(stop_time);
        }
        Ok(())
    }

    pub fn contains(&self, handle: VoiceHandle) -> bool {
        self.voices.iter().any(|(h, _)| *h == handle)
    }

    pub fn active_count(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    pub fn handles(&self) -> impl Iterator<Item = VoiceHandle> + '_ {
        self.voices.iter().map(|(h, _)| *h)
    }

    fn index_of(&self, handle: VoiceHandle) -> Result<usize> {
        self.voices
            .iter()
            .position(|(h, _)| *h == handle)
            .ok_or(SynthError::InvalidHandle(handle))
    }

    fn voice(&self, handle: VoiceHandle) -> Result<&Voice> {
        let idx = self.index_of(handle)?;
        Ok(&self.voices[idx].1)
    }

    fn voice_mut(&mut self, handle: VoiceHandle) -> Result<&mut Voice> {
        let idx = self.index_of(handle)?;
        Ok(&mut self.voices[idx].1)
    }
}

fn check_time(param: &'static str, time: f64) -> Result<()> {
    if !time.is_finite() {
        return Err(SynthError::invalid(
            param,
            format!("must be finite, got {time}"),
        ));
    }
    Ok(())
}

pub(crate) fn validate_frequency(frequency: f32) -> Result<()> {
    if !frequency.is_finite() || frequency <= 0.0 {
        return Err(SynthError::invalid(
            "frequency",
            format!("must be a positive number of Hz, got {frequency}"),
        ));
    }
    Ok(())
}
