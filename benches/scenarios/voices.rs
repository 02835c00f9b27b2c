//! Benchmarks for voices mixed through the pipeline.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use mulberry::{
    dsp::{EnvelopeParams, Waveform},
    engine,
    sequencing::{Sequence, SequencePlayer},
    SynthConfig, VoicePipeline,
};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

/// Mix `pipeline` into `buffer` starting at `time`, returning the next time.
fn render(pipeline: &mut VoicePipeline, buffer: &mut [f32], time: f64) -> f64 {
    let dt = 1.0 / SAMPLE_RATE as f64;
    for (n, sample) in buffer.iter_mut().enumerate() {
        *sample = pipeline.render_mix(time + n as f64 * dt, |_| {});
    }
    time + buffer.len() as f64 * dt
}

pub fn bench_voices(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/voices");
    let params = EnvelopeParams::default();

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // === SINGLE TONE ===
        // Held in sustain, never released
        let mut pipeline = VoicePipeline::new(SAMPLE_RATE);
        pipeline
            .start(440.0, Waveform::Sine, params, 0.0)
            .expect("valid tone");
        let mut time = 0.0;
        group.bench_with_input(BenchmarkId::new("tone", size), &size, |b, _| {
            b.iter(|| {
                time = render(&mut pipeline, black_box(&mut buffer), time);
            })
        });

        // === LAYERED TONES ===
        // Eight overlapping sawtooth voices
        let mut pipeline = VoicePipeline::new(SAMPLE_RATE);
        for i in 0..8 {
            pipeline
                .start(220.0 + 55.0 * i as f32, Waveform::Sawtooth, params, 0.0)
                .expect("valid tone");
        }
        let mut time = 0.0;
        group.bench_with_input(BenchmarkId::new("layered_8", size), &size, |b, _| {
            b.iter(|| {
                time = render(&mut pipeline, black_box(&mut buffer), time);
            })
        });

        // === SCALE ===
        // All eight notes scheduled up front; most are pending at any time
        let mut pipeline = VoicePipeline::new(SAMPLE_RATE);
        let mut player = SequencePlayer::new();
        let scale = Sequence::c_major_scale(0.45, 0.4, Waveform::Triangle, params)
            .expect("valid scale");
        player
            .play(&mut pipeline, scale, 0.0)
            .expect("scale fits the pipeline");
        let mut time = 0.0;
        group.bench_with_input(BenchmarkId::new("scale", size), &size, |b, _| {
            b.iter(|| {
                time = render(&mut pipeline, black_box(&mut buffer), time);
            })
        });

        // === ENGINE BLOCK ===
        // Command drain, mix, clock advance and pruning
        let (mut controller, mut engine) =
            engine::build(SAMPLE_RATE, &SynthConfig::default()).expect("default config");
        controller.play_tone().expect("queue has room");
        group.bench_with_input(BenchmarkId::new("engine_tone", size), &size, |b, _| {
            b.iter(|| {
                engine.process_block(black_box(&mut buffer));
            })
        });
    }

    group.finish();
}
