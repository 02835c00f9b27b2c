//! Error types shared by the pipeline, the controller and config loading.

use thiserror::Error;

use crate::synth::VoiceHandle;

/// Errors reported synchronously to callers of the control API.
///
/// The render path never produces these: every sample is a total function of
/// already-validated state.
#[derive(Debug, Error)]
pub enum SynthError {
    /// A parameter was rejected before any voice was created.
    #[error("invalid parameter '{param}': {reason}")]
    InvalidParameter {
        /// Name of the offending parameter.
        param: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// The handle was never issued, or its voice has already been retired.
    #[error("invalid voice handle {0}")]
    InvalidHandle(VoiceHandle),

    /// The control queue to the render thread is full.
    #[error("control queue is full")]
    QueueFull,

    /// Failed to parse a TOML config.
    #[cfg(feature = "serde")]
    #[error("failed to parse config: {0}")]
    Config(#[from] toml::de::Error),

    /// Failed to read a config file.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl SynthError {
    pub(crate) fn invalid(param: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            param,
            reason: reason.into(),
        }
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, SynthError>;
