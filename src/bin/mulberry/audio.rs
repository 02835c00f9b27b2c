//! Output device plumbing

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use rtrb::Producer;

use mulberry::{engine, Controller, SynthConfig, MAX_BLOCK_SIZE};

/// Start the default output device with a fresh engine in its callback.
///
/// The returned stream must be kept alive for as long as audio should play.
/// When `scope` is given, every rendered mono sample is also pushed to it;
/// samples that do not fit are dropped.
pub fn start(
    config: &SynthConfig,
    mut scope: Option<Producer<f32>>,
) -> EyreResult<(Controller, cpal::Stream)> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| eyre!("no default output device available"))?;
    let output_config = device
        .default_output_config()
        .wrap_err("failed to fetch default output config")?;

    let sample_rate = output_config.sample_rate().0 as f32;
    let channels = output_config.channels() as usize;
    tracing::info!(
        device = %device.name().unwrap_or_else(|_| "unknown".into()),
        sample_rate,
        channels,
        "opening output device"
    );

    let (controller, mut engine) = engine::build(sample_rate, config)?;
    let mut render_buf = vec![0.0f32; MAX_BLOCK_SIZE];

    let stream = device.build_output_stream(
        &output_config.into(),
        move |data: &mut [f32], _| {
            let total_frames = data.len() / channels;
            let mut frames_written = 0;

            while frames_written < total_frames {
                let frames_to_render = (total_frames - frames_written).min(MAX_BLOCK_SIZE);
                let block = &mut render_buf[..frames_to_render];
                engine.process_block(block);

                if let Some(scope) = scope.as_mut() {
                    for &s in block.iter() {
                        if scope.push(s).is_err() {
                            break;
                        }
                    }
                }

                // Copy to output (mono to all channels)
                let out_off = frames_written * channels;
                for (i, &s) in block.iter().enumerate() {
                    let frame = out_off + i * channels;
                    data[frame..frame + channels].fill(s);
                }

                frames_written += frames_to_render;
            }
        },
        |err| tracing::error!(%err, "audio stream error"),
        None,
    )?;

    stream.play()?;
    Ok((controller, stream))
}
