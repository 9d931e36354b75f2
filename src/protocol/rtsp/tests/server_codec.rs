use crate::protocol::rtsp::server_codec::{ParseError, ResponseBuilder, RtspServerCodec, encode_response};
use crate::protocol::rtsp::{Method, StatusCode};

#[test]
fn test_parse_options_request() {
    let mut codec = RtspServerCodec::new();
    codec.feed(b"OPTIONS * RTSP/1.0\r\nCSeq: 1\r\n\r\n");

    let request = codec.decode().unwrap().unwrap();
    assert_eq!(request.method, Method::Options);
    assert_eq!(request.uri, "*");
    assert_eq!(request.version, "RTSP/1.0");
    assert_eq!(request.headers.cseq(), Some("1"));
}

#[test]
fn test_parse_announce_with_sdp() {
    let sdp = "v=0\r\no=- 0 0 IN IP4 192.168.1.100\r\ns=AirTunes\r\na=rtpmap:96 L16/44100/2\r\n";
    let request_str = format!(
        "ANNOUNCE rtsp://192.168.1.1/1234 RTSP/1.0\r\n\
         CSeq: 2\r\n\
         Content-Type: application/sdp\r\n\
         Content-Length: {}\r\n\
         \r\n\
         {}",
        sdp.len(),
        sdp
    );

    let mut codec = RtspServerCodec::new();
    codec.feed(request_str.as_bytes());

    let request = codec.decode().unwrap().unwrap();
    assert_eq!(request.method, Method::Announce);
    assert_eq!(request.headers.get("Content-Type"), Some("application/sdp"));
    assert_eq!(String::from_utf8_lossy(&request.body), sdp);
    assert_eq!(codec.buffer_len(), 0);
}

#[test]
fn test_parse_incomplete_request() {
    let mut codec = RtspServerCodec::new();
    codec.feed(b"OPTIONS * RTSP/1.0\r\n");

    assert!(codec.decode().unwrap().is_none());
    assert!(codec.has_partial_request());

    codec.feed(b"CSeq: 1\r\n\r\n");

    let request = codec.decode().unwrap().unwrap();
    assert_eq!(request.method, Method::Options);
    assert!(!codec.has_partial_request());
}

#[test]
fn test_parse_incomplete_body() {
    let mut codec = RtspServerCodec::new();
    codec.feed(
        b"SET_PARAMETER rtsp://192.168.1.1/1234 RTSP/1.0\r\n\
          CSeq: 5\r\n\
          Content-Type: text/parameters\r\n\
          Content-Length: 13\r\n\
          \r\n\
          volume:",
    );

    assert!(codec.decode().unwrap().is_none());

    codec.feed(b" -15.0");
    let request = codec.decode().unwrap().unwrap();
    assert_eq!(request.body, b"volume: -15.0");
}

#[test]
fn test_byte_at_a_time() {
    let raw = b"SETUP rtsp://10.0.0.1/1 RTSP/1.0\r\nCSeq: 3\r\nTransport: RTP/AVP/UDP;unicast\r\n\r\n";
    let mut codec = RtspServerCodec::new();

    let mut parsed = None;
    for byte in raw {
        codec.feed(std::slice::from_ref(byte));
        if let Some(request) = codec.decode().unwrap() {
            parsed = Some(request);
        }
    }

    let request = parsed.unwrap();
    assert_eq!(request.method, Method::Setup);
    assert_eq!(request.headers.get("Transport"), Some("RTP/AVP/UDP;unicast"));
}

#[test]
fn test_malformed_request_line_is_skipped() {
    let mut codec = RtspServerCodec::new();
    codec.feed(b"GARBAGE\r\nOPTIONS * RTSP/1.0\r\nCSeq: 7\r\n\r\n");

    let request = codec.decode().unwrap().unwrap();
    assert_eq!(request.method, Method::Options);
    assert_eq!(request.headers.cseq(), Some("7"));
    assert_eq!(codec.discarded_lines(), 1);
}

#[test]
fn test_two_token_line_is_skipped() {
    let mut codec = RtspServerCodec::new();
    codec.feed(b"OPTIONS *\r\n");
    assert!(codec.decode().unwrap().is_none());
    assert_eq!(codec.discarded_lines(), 1);
    assert!(!codec.has_partial_request());
}

#[test]
fn test_request_line_keeps_version_remainder() {
    let mut codec = RtspServerCodec::new();
    codec.feed(b"OPTIONS * RTSP/1.0 extra\r\n\r\n");

    let request = codec.decode().unwrap().unwrap();
    assert_eq!(request.version, "RTSP/1.0 extra");
}

#[test]
fn test_header_without_colon_ignored() {
    let mut codec = RtspServerCodec::new();
    codec.feed(b"OPTIONS * RTSP/1.0\r\nNoColonHere\r\nCSeq: 4\r\n\r\n");

    let request = codec.decode().unwrap().unwrap();
    assert_eq!(request.headers.len(), 1);
    assert_eq!(request.headers.cseq(), Some("4"));
}

#[test]
fn test_header_names_are_case_sensitive() {
    let mut codec = RtspServerCodec::new();
    codec.feed(b"OPTIONS * RTSP/1.0\r\ncseq: 9\r\n\r\n");

    let request = codec.decode().unwrap().unwrap();
    assert_eq!(request.headers.cseq(), None);
    assert_eq!(request.headers.get("cseq"), Some("9"));
}

#[test]
fn test_duplicate_header_last_wins() {
    let mut codec = RtspServerCodec::new();
    codec.feed(b"OPTIONS * RTSP/1.0\r\nCSeq: 1\r\nCSeq: 2\r\n\r\n");

    let request = codec.decode().unwrap().unwrap();
    assert_eq!(request.headers.cseq(), Some("2"));
    assert_eq!(request.headers.len(), 1);
}

#[test]
fn test_bare_newlines_accepted() {
    let mut codec = RtspServerCodec::new();
    codec.feed(b"GET_PARAMETER rtsp://x/1 RTSP/1.0\nCSeq: 11\n\n");

    let request = codec.decode().unwrap().unwrap();
    assert_eq!(request.method, Method::GetParameter);
    assert_eq!(request.headers.cseq(), Some("11"));
}

#[test]
fn test_unknown_method_preserved() {
    let mut codec = RtspServerCodec::new();
    codec.feed(b"FOO * RTSP/1.0\r\nCSeq: 3\r\n\r\n");

    let request = codec.decode().unwrap().unwrap();
    assert_eq!(request.method, Method::Other("FOO".to_string()));
}

#[test]
fn test_lowercase_method_is_not_recognized() {
    let mut codec = RtspServerCodec::new();
    codec.feed(b"options * RTSP/1.0\r\n\r\n");

    let request = codec.decode().unwrap().unwrap();
    assert_eq!(request.method, Method::Other("options".to_string()));
}

#[test]
fn test_pipelined_requests_decode_in_order() {
    let mut codec = RtspServerCodec::new();
    codec.feed(
        b"OPTIONS * RTSP/1.0\r\nCSeq: 1\r\n\r\n\
          GET_PARAMETER rtsp://x/1 RTSP/1.0\r\nCSeq: 2\r\n\r\n",
    );

    let first = codec.decode().unwrap().unwrap();
    let second = codec.decode().unwrap().unwrap();
    assert_eq!(first.headers.cseq(), Some("1"));
    assert_eq!(second.headers.cseq(), Some("2"));
    assert!(codec.decode().unwrap().is_none());
}

#[test]
fn test_invalid_content_length_reads_as_zero() {
    let mut codec = RtspServerCodec::new();
    codec.feed(b"ANNOUNCE rtsp://x/1 RTSP/1.0\r\nContent-Length: -5\r\n\r\nOPTIONS * RTSP/1.0\r\n\r\n");

    let announce = codec.decode().unwrap().unwrap();
    assert!(announce.body.is_empty());
    let options = codec.decode().unwrap().unwrap();
    assert_eq!(options.method, Method::Options);
}

#[test]
fn test_body_too_large() {
    let mut codec = RtspServerCodec::new();
    codec.feed(b"ANNOUNCE rtsp://x/1 RTSP/1.0\r\nContent-Length: 999999999\r\n\r\n");

    assert!(matches!(
        codec.decode(),
        Err(ParseError::BodyTooLarge { .. })
    ));
}

#[test]
fn test_line_too_long() {
    let mut codec = RtspServerCodec::new();
    codec.feed(&vec![b'A'; 70 * 1024]);

    assert!(matches!(codec.decode(), Err(ParseError::LineTooLong { .. })));
}

#[test]
fn test_clear_resets_state() {
    let mut codec = RtspServerCodec::new();
    codec.feed(b"OPTIONS * RTSP/1.0\r\nCSeq: 1\r\n");
    assert!(codec.decode().unwrap().is_none());

    codec.clear();
    assert_eq!(codec.buffer_len(), 0);
    assert!(!codec.has_partial_request());
}

#[test]
fn test_response_builder_header_order() {
    let response = ResponseBuilder::ok()
        .header("Transport", "RTP/AVP/UDP;server_port=6000")
        .session("ABCDEF")
        .server("AirHome/1.0")
        .cseq(Some("42"))
        .build();

    let names: Vec<&str> = response.headers.iter().map(|(k, _)| k).collect();
    assert_eq!(names, vec!["CSeq", "Server", "Transport", "Session"]);
    assert_eq!(response.cseq(), Some("42"));
}

#[test]
fn test_response_builder_defaults_cseq() {
    let response = ResponseBuilder::error(StatusCode::NOT_IMPLEMENTED).build();
    assert_eq!(response.cseq(), Some("1"));
    assert_eq!(response.status, StatusCode::NOT_IMPLEMENTED);
    assert_eq!(response.reason, "Not Implemented");
}

#[test]
fn test_encode_response_wire_format() {
    let encoded = ResponseBuilder::ok()
        .cseq(Some("3"))
        .server("AirHome/1.0")
        .audio_latency(0)
        .encode();

    assert_eq!(
        String::from_utf8(encoded).unwrap(),
        "RTSP/1.0 200 OK\r\nCSeq: 3\r\nServer: AirHome/1.0\r\nAudio-Latency: 0\r\n\r\n"
    );
}

#[test]
fn test_encode_response_keeps_body() {
    let mut response = ResponseBuilder::ok().cseq(Some("9")).build();
    response.body = b"x".to_vec();

    let text = String::from_utf8(encode_response(&response)).unwrap();
    assert_eq!(text, "RTSP/1.0 200 OK\r\nCSeq: 9\r\n\r\nx");
}
