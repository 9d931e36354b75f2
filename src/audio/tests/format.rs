use crate::audio::format::{AudioCodec, AudioFormat, SinkFormat};
use std::time::Duration;

#[test]
fn test_codec_classification() {
    assert_eq!(AudioCodec::from_name("L16"), AudioCodec::Pcm);
    assert_eq!(AudioCodec::from_name("AppleLossless"), AudioCodec::Alac);
    assert_eq!(AudioCodec::from_name("mpeg4-generic"), AudioCodec::Aac);
    assert_eq!(AudioCodec::from_name("MPEG4-GENERIC"), AudioCodec::Aac);
    assert_eq!(AudioCodec::from_name("PCMU"), AudioCodec::Unknown);
}

#[test]
fn test_format_display() {
    assert_eq!(AudioFormat::new("L16", 48000).to_string(), "L16/48000");
}

#[test]
fn test_sink_format_defaults() {
    let format = SinkFormat::default();
    assert_eq!(format.sample_rate, 44100);
    assert_eq!(format.channels, 2);
    assert_eq!(format.frame_bytes(), 4);
}

#[test]
fn test_sink_format_uses_announced_rate() {
    let announced = AudioFormat::new("L16", 48000);
    assert_eq!(SinkFormat::for_stream(Some(&announced)).sample_rate, 48000);

    let zero = AudioFormat::new("L16", 0);
    assert_eq!(SinkFormat::for_stream(Some(&zero)).sample_rate, 44100);
}

#[test]
fn test_bytes_for_period() {
    let format = SinkFormat::default();
    // 100 ms at 44.1 kHz stereo 16-bit
    assert_eq!(format.bytes_for(Duration::from_millis(100)), 4410 * 4);
}
