//! Control-surface defaults and the ranges the surface enforces.
//!
//! With the `serde` feature the config can be loaded from TOML. Every field
//! is optional; missing ones keep their defaults.
//!
//! ```toml
//! frequency = 330.0
//! waveform = "triangle"
//! tone_hold = 0.5
//!
//! [envelope]
//! attack = 0.05
//! decay = 0.2
//! sustain = 0.6
//! release = 0.4
//!
//! [scale]
//! hold = 0.4
//! spacing = 0.45
//! ```

use std::ops::RangeInclusive;
#[cfg(feature = "serde")]
use std::path::Path;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    dsp::{EnvelopeParams, Waveform},
    error::{Result, SynthError},
};

pub const FREQUENCY_RANGE: RangeInclusive<f32> = 200.0..=800.0;
pub const ATTACK_RANGE: RangeInclusive<f64> = 0.01..=2.0;
pub const DECAY_RANGE: RangeInclusive<f64> = 0.01..=2.0;
pub const SUSTAIN_RANGE: RangeInclusive<f32> = 0.0..=1.0;
pub const RELEASE_RANGE: RangeInclusive<f64> = 0.01..=3.0;

/// Reject frequencies outside the surface's 200-800 Hz range.
pub fn check_frequency(hz: f32) -> Result<()> {
    if !FREQUENCY_RANGE.contains(&hz) {
        return Err(SynthError::invalid(
            "frequency",
            format!(
                "{hz} Hz is outside {}..={} Hz",
                FREQUENCY_RANGE.start(),
                FREQUENCY_RANGE.end()
            ),
        ));
    }
    Ok(())
}

/// Reject envelopes outside the surface ranges. Unlike
/// [`EnvelopeParams::validated`], an out-of-range sustain is an error here
/// rather than being clamped.
pub fn check_envelope(env: &EnvelopeParams) -> Result<()> {
    check_range("attack", env.attack, &ATTACK_RANGE)?;
    check_range("decay", env.decay, &DECAY_RANGE)?;
    check_range("sustain", env.sustain, &SUSTAIN_RANGE)?;
    check_range("release", env.release, &RELEASE_RANGE)?;
    Ok(())
}

fn check_range<T>(param: &'static str, value: T, range: &RangeInclusive<T>) -> Result<()>
where
    T: PartialOrd + std::fmt::Display,
{
    if !range.contains(&value) {
        return Err(SynthError::invalid(
            param,
            format!("{value} is outside {}..={}", range.start(), range.end()),
        ));
    }
    Ok(())
}

/// Scale playback settings.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleConfig {
    /// Seconds each note is held before release
    pub hold: f64,
    /// Seconds between note starts
    pub spacing: f64,
    /// Envelope for scale notes; the tone envelope is used when absent
    pub envelope: Option<EnvelopeParams>,
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self {
            hold: 0.4,
            spacing: 0.45,
            envelope: None,
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct SynthConfig {
    pub frequency: f32,
    pub waveform: Waveform,
    pub envelope: EnvelopeParams,
    /// Seconds a tone sustains after attack and decay before its release
    pub tone_hold: f64,
    pub scale: ScaleConfig,
    /// Capacity of the control → render command queue
    pub queue_capacity: usize,
    /// Voice slots reserved up front
    pub max_voices: usize,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            frequency: 440.0,
            waveform: Waveform::Sine,
            envelope: EnvelopeParams::default(),
            tone_hold: 0.5,
            scale: ScaleConfig::default(),
            queue_capacity: 256,
            max_voices: 64,
        }
    }
}

impl SynthConfig {
    pub fn validate(&self) -> Result<()> {
        check_frequency(self.frequency)?;
        check_envelope(&self.envelope)?;
        check_seconds("tone_hold", self.tone_hold)?;
        check_seconds("scale.hold", self.scale.hold)?;
        check_seconds("scale.spacing", self.scale.spacing)?;
        if let Some(env) = self.scale.envelope {
            env.validated()?;
        }
        if self.queue_capacity == 0 {
            return Err(SynthError::invalid("queue_capacity", "must be at least 1"));
        }
        Ok(())
    }

    /// Parse and validate a TOML document.
    #[cfg(feature = "serde")]
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    #[cfg(feature = "serde")]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        tracing::info!(path = %path.display(), "loaded config");
        Ok(config)
    }
}

fn check_seconds(param: &'static str, seconds: f64) -> Result<()> {
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(SynthError::invalid(
            param,
            format!("must be finite and >= 0, got {seconds}"),
        ));
    }
    Ok(())
}
