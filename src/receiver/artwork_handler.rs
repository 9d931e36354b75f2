//! Cover art handling

use bytes::Bytes;

/// Cover art image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artwork {
    /// Image data
    pub data: Bytes,
    /// MIME type
    pub mime_type: String,
}

impl Artwork {
    /// Build artwork from a `SET_PARAMETER` body.
    ///
    /// The MIME type is sniffed from the magic bytes; when the data matches
    /// neither JPEG nor PNG the declared content type is kept.
    #[must_use]
    pub fn new(declared_type: &str, data: Bytes) -> Self {
        let mime_type = detect_image_type(&data)
            .unwrap_or(declared_type)
            .to_ascii_lowercase();

        Self { data, mime_type }
    }

    /// Check if artwork is JPEG
    #[must_use]
    pub fn is_jpeg(&self) -> bool {
        self.mime_type == "image/jpeg"
    }

    /// Check if artwork is PNG
    #[must_use]
    pub fn is_png(&self) -> bool {
        self.mime_type == "image/png"
    }

    /// Size in bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True for an empty image
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

fn detect_image_type(data: &[u8]) -> Option<&'static str> {
    match data {
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        [0x89, 0x50, 0x4E, 0x47, ..] => Some("image/png"),
        _ => None,
    }
}
