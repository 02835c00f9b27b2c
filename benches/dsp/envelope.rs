//! Benchmarks for ADSR envelope evaluation.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use mulberry::dsp::{Envelope, EnvelopeParams};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/envelope");
    let params = EnvelopeParams {
        attack: 0.1,
        decay: 0.1,
        sustain: 0.7,
        release: 0.3,
    };

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // Attack phase (ramping up)
        let env = Envelope::new(params, 0.0).expect("valid envelope");
        group.bench_with_input(BenchmarkId::new("attack", size), &size, |b, _| {
            b.iter(|| {
                env.render(black_box(&mut buffer), black_box(0.01), SAMPLE_RATE);
            })
        });

        // Sustain phase (holding steady)
        group.bench_with_input(BenchmarkId::new("sustain", size), &size, |b, _| {
            b.iter(|| {
                env.render(black_box(&mut buffer), black_box(1.0), SAMPLE_RATE);
            })
        });

        // Release phase, including the held-curve lookup at note-off
        let mut released = Envelope::new(params, 0.0).expect("valid envelope");
        released.note_off(0.05);
        group.bench_with_input(BenchmarkId::new("release", size), &size, |b, _| {
            b.iter(|| {
                released.render(black_box(&mut buffer), black_box(0.1), SAMPLE_RATE);
            })
        });
    }

    group.finish();
}
