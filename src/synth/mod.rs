// Purpose: voice lifecycle, handles and the render-side voice pool
// This layer sits above the dsp primitives and below the engine

pub mod handle;
pub mod message;
pub mod pipeline;
pub mod voice;

pub use handle::{HandleRange, HandleSource, VoiceHandle};
pub use message::{Command, Notice};
pub use pipeline::VoicePipeline;
pub use voice::{Voice, VoiceState};
