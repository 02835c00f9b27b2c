//! Sample-counting clock shared by the control and render threads.
//!
//! The render thread is the only writer: it advances the frame counter after
//! every rendered sample. Any number of readers (the controller, a UI) can
//! clone the clock and read the current time without locking.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

/// Monotonic time reference measured in rendered sample frames.
#[derive(Debug, Clone)]
pub struct SampleClock {
    sample_rate: f32,
    frames: Arc<AtomicU64>,
}

impl SampleClock {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            frames: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Frames rendered since the clock was created.
    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::Acquire)
    }

    /// Current time in seconds.
    pub fn now(&self) -> f64 {
        self.frames_to_seconds(self.frames())
    }

    /// Convert a frame position into seconds on this clock.
    #[inline]
    pub fn frames_to_seconds(&self, frames: u64) -> f64 {
        frames as f64 / self.sample_rate as f64
    }

    /// Advance by `frames`. Only the render thread should call this.
    #[inline]
    pub(crate) fn advance(&self, frames: u64) {
        self.frames.fetch_add(frames, Ordering::AcqRel);
    }
}
