use proptest::prelude::*;

use crate::protocol::rtp::{PayloadType, RtpDecodeError, RtpHeader, RtpPacket};

#[test]
fn test_header_encode_layout() {
    let header = RtpHeader::new_audio(0x0102, 0x0304_0506, 0x0708_090A);
    let bytes = header.encode();

    assert_eq!(bytes[0], 0x80);
    assert_eq!(bytes[1], 0x60);
    assert_eq!(&bytes[2..4], &[0x01, 0x02]);
    assert_eq!(&bytes[4..8], &[0x03, 0x04, 0x05, 0x06]);
    assert_eq!(&bytes[8..12], &[0x07, 0x08, 0x09, 0x0A]);
}

#[test]
fn test_decode_marker_and_buffered_type() {
    let mut bytes = RtpHeader::new_audio(7, 1000, 42).encode();
    bytes[1] = 0x80 | 0x61;

    let header = RtpHeader::decode(&bytes).unwrap();
    assert!(header.marker);
    assert_eq!(header.payload_type, PayloadType::AudioBuffered);
    assert_eq!(header.sequence, 7);
    assert_eq!(header.timestamp, 1000);
    assert_eq!(header.ssrc, 42);
}

#[test]
fn test_decode_too_small() {
    let result = RtpHeader::decode(&[0x80, 0x60, 0x00]);
    assert!(matches!(
        result,
        Err(RtpDecodeError::BufferTooSmall { needed: 12, have: 3 })
    ));
}

#[test]
fn test_decode_wrong_version() {
    let mut bytes = RtpHeader::new_audio(1, 1, 1).encode();
    bytes[0] = 0x40;
    assert!(matches!(
        RtpHeader::decode(&bytes),
        Err(RtpDecodeError::InvalidVersion(1))
    ));
}

#[test]
fn test_decode_control_payload_type_rejected() {
    let mut bytes = RtpHeader::new_audio(1, 1, 1).encode();
    bytes[1] = 0xD4; // timing request with marker
    assert!(matches!(
        RtpHeader::decode(&bytes),
        Err(RtpDecodeError::UnknownPayloadType(0x54))
    ));
}

#[test]
fn test_packet_skips_csrc_list() {
    let mut bytes = RtpHeader::new_audio(1, 2, 3).encode().to_vec();
    bytes[0] |= 0x01;
    bytes.extend_from_slice(&[0xAA; 4]);
    bytes.extend_from_slice(b"pcm");

    let packet = RtpPacket::decode(&bytes).unwrap();
    assert_eq!(packet.payload, b"pcm");
}

#[test]
fn test_packet_skips_header_extension() {
    let mut bytes = RtpHeader::new_audio(1, 2, 3).encode().to_vec();
    bytes[0] |= 0x10;
    bytes.extend_from_slice(&[0xBE, 0xDE, 0x00, 0x01]);
    bytes.extend_from_slice(&[0x11; 4]);
    bytes.extend_from_slice(b"pcm");

    let packet = RtpPacket::decode(&bytes).unwrap();
    assert_eq!(packet.payload, b"pcm");
}

#[test]
fn test_packet_strips_padding() {
    let mut bytes = RtpHeader::new_audio(1, 2, 3).encode().to_vec();
    bytes[0] |= 0x20;
    bytes.extend_from_slice(b"pcm");
    bytes.extend_from_slice(&[0, 0, 3]);

    let packet = RtpPacket::decode(&bytes).unwrap();
    assert_eq!(packet.payload, b"pcm");
}

#[test]
fn test_packet_rejects_oversized_padding() {
    let mut bytes = RtpHeader::new_audio(1, 2, 3).encode().to_vec();
    bytes[0] |= 0x20;
    bytes.extend_from_slice(&[9]);

    assert!(matches!(
        RtpPacket::decode(&bytes),
        Err(RtpDecodeError::InvalidPadding { padding: 9, available: 1 })
    ));
}

#[test]
fn test_packet_truncated_csrc_list() {
    let mut bytes = RtpHeader::new_audio(1, 2, 3).encode().to_vec();
    bytes[0] |= 0x02;
    bytes.extend_from_slice(&[0xAA; 4]);

    assert!(RtpPacket::decode(&bytes).is_err());
}

proptest! {
    #[test]
    fn test_packet_round_trip(
        seq in any::<u16>(),
        ts in any::<u32>(),
        ssrc in any::<u32>(),
        payload in proptest::collection::vec(any::<u8>(), 0..512),
    ) {
        let packet = RtpPacket::audio(seq, ts, ssrc, payload.clone());
        let decoded = RtpPacket::decode(&packet.encode()).unwrap();

        prop_assert_eq!(decoded.header, packet.header);
        prop_assert_eq!(decoded.payload, payload);
    }

    #[test]
    fn test_decode_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..64)) {
        let _ = RtpPacket::decode(&bytes);
    }
}
