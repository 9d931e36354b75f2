use crate::audio::output_cpal::{render_f32, render_i16};

fn pcm(samples: &[i16]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_ne_bytes()).collect()
}

#[test]
fn test_render_i16_applies_gain() {
    let mut out = [1i16; 3];
    render_i16(&pcm(&[1000, -1000, 32767]), &mut out, 0.5);
    assert_eq!(out, [500, -500, 16383]);
}

#[test]
fn test_render_f32_normalises_samples() {
    let mut out = [1.0f32; 4];
    render_f32(&pcm(&[16384, -32768, 0, 8192]), &mut out, 1.0);
    assert!((out[0] - 0.5).abs() < f32::EPSILON);
    assert!((out[1] + 1.0).abs() < f32::EPSILON);
    assert!(out[2].abs() < f32::EPSILON);
    assert!((out[3] - 0.25).abs() < f32::EPSILON);
}

#[test]
fn test_render_f32_applies_gain() {
    let mut out = [0.0f32; 1];
    render_f32(&pcm(&[16384]), &mut out, 0.5);
    assert!((out[0] - 0.25).abs() < f32::EPSILON);
}

#[test]
fn test_short_input_pads_with_silence() {
    let mut ints = [7i16; 4];
    render_i16(&pcm(&[100]), &mut ints, 1.0);
    assert_eq!(ints, [100, 0, 0, 0]);

    // A trailing odd byte is not a sample
    let mut floats = [7.0f32; 2];
    let mut bytes = pcm(&[16384]);
    bytes.push(0x7f);
    render_f32(&bytes, &mut floats, 1.0);
    assert!((floats[0] - 0.5).abs() < f32::EPSILON);
    assert!(floats[1].abs() < f32::EPSILON);
}
