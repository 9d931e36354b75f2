use crate::receiver::artwork_handler::Artwork;
use bytes::Bytes;

#[test]
fn test_jpeg_detected_from_magic() {
    let art = Artwork::new("image/png", Bytes::from_static(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00]));
    assert!(art.is_jpeg());
    assert_eq!(art.len(), 5);
}

#[test]
fn test_png_detected_from_magic() {
    let art = Artwork::new(
        "image/jpeg",
        Bytes::from_static(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A]),
    );
    assert!(art.is_png());
}

#[test]
fn test_unknown_data_keeps_declared_type() {
    let art = Artwork::new("IMAGE/JPEG", Bytes::from_static(b"not really an image"));
    assert_eq!(art.mime_type, "image/jpeg");
    assert!(!art.is_empty());
}
