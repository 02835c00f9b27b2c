//! Real-world scenario benchmarks.
//!
//! These model what the front end actually triggers: single tones, layered
//! tones and the scale, rendered through the voice pipeline and the engine.

mod voices;

pub use voices::bench_voices;
