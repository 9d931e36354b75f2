use crate::audio::decoder::{DecodeError, decoder_for};
use crate::audio::format::AudioFormat;

#[test]
fn test_pcm_swaps_to_native_order() {
    let format = AudioFormat::new("L16", 44100);
    let mut decoder = decoder_for(Some(&format));
    assert_eq!(decoder.name(), "pcm");

    let out = decoder.decode(&[0x01, 0x02, 0xFF, 0xFE]).unwrap();
    let samples: Vec<i16> = out
        .chunks_exact(2)
        .map(|b| i16::from_ne_bytes([b[0], b[1]]))
        .collect();
    assert_eq!(samples, vec![0x0102, -2]);
}

#[test]
fn test_pcm_rejects_odd_length() {
    let format = AudioFormat::new("L16", 44100);
    let mut decoder = decoder_for(Some(&format));
    assert!(matches!(
        decoder.decode(&[1, 2, 3]),
        Err(DecodeError::Truncated { len: 3, frame: 2 })
    ));
}

#[test]
fn test_compressed_codecs_unsupported() {
    for codec in ["AppleLossless", "mpeg4-generic", "opus"] {
        let format = AudioFormat::new(codec, 44100);
        let mut decoder = decoder_for(Some(&format));
        assert_eq!(decoder.name(), "unsupported");
        match decoder.decode(&[0; 8]) {
            Err(DecodeError::Unsupported(name)) => assert_eq!(name, codec),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}

#[test]
fn test_no_format_passes_through() {
    let mut decoder = decoder_for(None);
    assert_eq!(decoder.name(), "passthrough");
    assert_eq!(decoder.decode(b"raw").unwrap(), b"raw");
}
