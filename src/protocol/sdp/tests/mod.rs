use proptest::prelude::*;

use crate::protocol::sdp::RtpMap;

#[test]
fn test_find_alac_rtpmap() {
    let sdp_text = r"v=0
o=iTunes 3413821438 1 IN IP4 fe80::217:f2ff:fe0f:e0f6
s=iTunes
c=IN IP4 fe80::5a55:caff:fe1a:e288
t=0 0
m=audio 0 RTP/AVP 96
a=rtpmap:96 AppleLossless/44100
a=fmtp:96 352 0 16 40 10 14 2 255 0 0 44100
";

    let map = RtpMap::find(sdp_text).unwrap();
    assert_eq!(map.payload_type, 96);
    assert_eq!(map.codec, "AppleLossless");
    assert_eq!(map.sample_rate, 44100);
}

#[test]
fn test_channel_suffix_ignored() {
    let map = RtpMap::find("a=rtpmap:96 L16/44100/2\r\n").unwrap();
    assert_eq!(map.codec, "L16");
    assert_eq!(map.sample_rate, 44100);
}

#[test]
fn test_hyphenated_codec() {
    let map = RtpMap::find("m=audio 0 RTP/AVP 96\na=rtpmap:96 mpeg4-generic/48000/2\n").unwrap();
    assert_eq!(map.codec, "mpeg4-generic");
    assert_eq!(map.sample_rate, 48000);
}

#[test]
fn test_first_match_wins() {
    let body = "a=rtpmap:96 L16/44100\na=rtpmap:97 AppleLossless/48000\n";
    let map = RtpMap::find(body).unwrap();
    assert_eq!(map.payload_type, 96);
    assert_eq!(map.codec, "L16");
}

#[test]
fn test_rtpmap_without_rate_is_skipped() {
    // The classic iTunes form has no rate; a later complete line still matches
    let body = "a=rtpmap:96 AppleLossless\na=rtpmap:97 L16/22050\n";
    let map = RtpMap::find(body).unwrap();
    assert_eq!(map.payload_type, 97);
    assert_eq!(map.sample_rate, 22050);
}

#[test]
fn test_no_rtpmap() {
    assert!(RtpMap::find("v=0\ns=none\n").is_none());
    assert!(RtpMap::find("").is_none());
    assert!(RtpMap::find("a=rtpmap:").is_none());
    assert!(RtpMap::find("a=rtpmap:x L16/44100").is_none());
}

#[test]
fn test_match_need_not_start_line() {
    let map = RtpMap::find("junk a=rtpmap:0 PCMU/8000").unwrap();
    assert_eq!(map.payload_type, 0);
    assert_eq!(map.codec, "PCMU");
    assert_eq!(map.sample_rate, 8000);
}

#[test]
fn test_oversized_rate_skipped() {
    assert!(RtpMap::find("a=rtpmap:96 L16/99999999999").is_none());
}

proptest! {
    #[test]
    fn test_first_generated_rtpmap_is_extracted(
        pt in 0u32..128,
        codec in "[A-Za-z0-9_-]{1,16}",
        rate in 1u32..200_000,
        other_codec in "[A-Za-z0-9_-]{1,16}",
        preamble in "[a-z=0-9 \n]{0,64}",
    ) {
        let body = format!(
            "{preamble}\na=rtpmap:{pt} {codec}/{rate}\na=rtpmap:{} {other_codec}/8000\n",
            pt + 1
        );
        let map = RtpMap::find(&body).unwrap();
        prop_assert_eq!(map.payload_type, pt);
        prop_assert_eq!(map.codec, codec);
        prop_assert_eq!(map.sample_rate, rate);
    }

    #[test]
    fn test_find_never_panics(s in "\\PC{0,256}") {
        let _ = RtpMap::find(&s);
    }
}
