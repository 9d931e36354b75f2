use crate::protocol::rtsp::Headers;
use crate::protocol::rtsp::headers::names;

#[test]
fn test_insert_and_get() {
    let mut headers = Headers::new();
    headers.insert("CSeq", "1");
    headers.insert("Transport", "RTP/AVP/UDP");

    assert_eq!(headers.get("CSeq"), Some("1"));
    assert_eq!(headers.get(names::TRANSPORT), Some("RTP/AVP/UDP"));
    assert!(headers.contains("Transport"));
    assert!(!headers.contains("transport"));
}

#[test]
fn test_replace_keeps_position() {
    let mut headers = Headers::new();
    headers.insert("A", "1");
    headers.insert("B", "2");
    headers.insert("A", "3");

    let pairs: Vec<(&str, &str)> = headers.iter().collect();
    assert_eq!(pairs, vec![("A", "3"), ("B", "2")]);
}

#[test]
fn test_content_length_parsing() {
    let mut headers = Headers::new();
    assert_eq!(headers.content_length(), 0);

    headers.insert(names::CONTENT_LENGTH, "42");
    assert_eq!(headers.content_length(), 42);

    headers.insert(names::CONTENT_LENGTH, "-1");
    assert_eq!(headers.content_length(), 0);

    headers.insert(names::CONTENT_LENGTH, "lots");
    assert_eq!(headers.content_length(), 0);
}

#[test]
fn test_typed_accessors() {
    let mut headers = Headers::new();
    assert!(headers.is_empty());
    assert!(headers.cseq().is_none());

    headers.insert(names::CSEQ, "0012");
    headers.insert(names::SESSION, "ABC");
    headers.insert(names::CONTENT_TYPE, "image/jpeg");

    assert_eq!(headers.cseq(), Some("0012"));
    assert_eq!(headers.session(), Some("ABC"));
    assert_eq!(headers.content_type(), Some("image/jpeg"));
    assert_eq!(headers.len(), 3);
}
