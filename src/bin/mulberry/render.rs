//! Offline rendering to WAV

use std::path::Path;

use color_eyre::eyre::{bail, Result as EyreResult, WrapErr};
use hound::{SampleFormat, WavSpec, WavWriter};

use mulberry::{engine, SynthConfig, MAX_BLOCK_SIZE};

/// Upper bound on an offline render, in seconds.
const MAX_RENDER_SECONDS: u32 = 60;

/// Render a tone, or the scale, until every voice has retired and write the
/// result as mono 32-bit float WAV.
pub fn render_to_wav(
    config: &SynthConfig,
    out: &Path,
    sample_rate: u32,
    scale: bool,
) -> EyreResult<()> {
    let (mut controller, mut engine) = engine::build(sample_rate as f32, config)?;
    if scale {
        controller.play_scale()?;
    } else {
        controller.play_tone()?;
    }

    let max_frames = (sample_rate * MAX_RENDER_SECONDS) as usize;
    let mut samples = Vec::new();
    let mut block = vec![0.0f32; MAX_BLOCK_SIZE];
    while controller.live_voices() > 0 {
        if samples.len() >= max_frames {
            bail!("render did not finish within {MAX_RENDER_SECONDS} s");
        }
        engine.process_block(&mut block);
        samples.extend_from_slice(&block);
    }

    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(out, spec)
        .wrap_err_with(|| format!("failed to create {}", out.display()))?;
    for &sample in &samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;

    tracing::info!(
        path = %out.display(),
        frames = samples.len(),
        seconds = samples.len() as f64 / sample_rate as f64,
        "rendered"
    );
    Ok(())
}
