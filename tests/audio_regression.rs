//! End-to-end checks through the public API: known envelope values, scale
//! timing and the mixed output of the engine.

use mulberry::{
    dsp::{Envelope, EnvelopeParams, EnvelopeStage, Waveform},
    engine,
    sequencing::{Sequence, SequencePlayer, C_MAJOR_SCALE},
    synth::VoiceState,
    SynthConfig, SynthError, VoicePipeline,
};

const SAMPLE_RATE: f32 = 8_000.0;

fn close(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-5
}

#[test]
fn reference_envelope_values() {
    let params = EnvelopeParams::new(0.1, 0.1, 0.7, 0.2).unwrap();
    let mut env = Envelope::new(params, 0.0).unwrap();
    env.note_off(0.5);

    assert!(close(env.gain_at(0.0), 0.0));
    assert!(close(env.gain_at(0.1), 1.0));
    assert!(close(env.gain_at(0.2), 0.7));
    assert!(close(env.gain_at(0.5), 0.7));
    assert!(close(env.gain_at(0.7), 0.0));
    assert_eq!(env.stage_at(0.7), EnvelopeStage::Finished);
}

#[test]
fn early_release_fades_from_current_level() {
    let params = EnvelopeParams::new(0.1, 0.1, 0.7, 0.2).unwrap();
    let mut env = Envelope::new(params, 0.0).unwrap();
    env.note_off(0.05);

    assert!(close(env.gain_at(0.05), 0.5));
    assert!(close(env.gain_at(0.15), 0.25));
    assert!(env.is_finished(0.25));
}

#[test]
fn eighth_scale_note_starts_at_3_15() {
    let scale =
        Sequence::c_major_scale(0.45, 0.4, Waveform::Sine, EnvelopeParams::default()).unwrap();
    let last = scale.notes()[7];
    assert_eq!(last.frequency, C_MAJOR_SCALE[7]);
    assert!((last.frequency - 523.25).abs() < 0.01);
    assert!((last.offset - 3.15).abs() < 1e-9);

    let mut pipeline = VoicePipeline::new(SAMPLE_RATE);
    let mut player = SequencePlayer::new();
    let handles = player.play(&mut pipeline, scale, 0.0).unwrap();
    let h = handles.get(7).unwrap();

    let onset = (3.15 * SAMPLE_RATE as f64).round() as u64;
    for n in 0..onset {
        let t = n as f64 / SAMPLE_RATE as f64;
        assert_eq!(pipeline.render_sample(h, t).unwrap(), 0.0);
    }
    assert_eq!(
        pipeline.state(h, onset as f64 / SAMPLE_RATE as f64).unwrap(),
        VoiceState::Active
    );
}

#[test]
fn non_positive_frequency_is_rejected() {
    let mut pipeline = VoicePipeline::new(SAMPLE_RATE);
    for freq in [0.0, -1.0] {
        assert!(matches!(
            pipeline.start(freq, Waveform::Square, EnvelopeParams::default(), 0.0),
            Err(SynthError::InvalidParameter { .. })
        ));
    }
}

#[test]
fn offline_scale_render_is_clipped_and_finishes() {
    let (mut controller, mut engine) = engine::build(SAMPLE_RATE, &SynthConfig::default()).unwrap();
    controller.set_waveform(Waveform::Square);
    controller.play_scale().unwrap();

    let mut block = [0.0f32; 256];
    let mut samples = Vec::new();
    while controller.live_voices() > 0 {
        engine.process_block(&mut block);
        samples.extend_from_slice(&block);
        assert!(samples.len() < 10 * SAMPLE_RATE as usize, "scale never finished");
    }

    assert!(samples.iter().all(|s| (-1.0..=1.0).contains(s)));
    assert!(samples.iter().any(|s| s.abs() > 0.4));

    // Last note: 3.15 start + 0.4 hold + 0.3 release
    let seconds = samples.len() as f64 / SAMPLE_RATE as f64;
    assert!((3.85..3.85 + 0.1).contains(&seconds), "ended after {seconds}");
}

#[test]
fn overlapping_tones_layer() {
    let (mut controller, mut engine) = engine::build(SAMPLE_RATE, &SynthConfig::default()).unwrap();
    let a = controller.play_tone().unwrap();
    let b = controller.play_tone().unwrap();
    assert_ne!(a, b);

    let mut block = [0.0f32; 64];
    engine.process_block(&mut block);
    assert_eq!(engine.active_voices(), 2);

    controller.stop(a).unwrap();
    for _ in 0..100 {
        engine.process_block(&mut block);
    }
    assert!(!controller.is_live(a));
    assert!(controller.is_live(b));
}
