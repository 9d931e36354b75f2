//! Track metadata handling
//!
//! `application/x-dmap-tagged` bodies are kept verbatim on the session. This
//! module additionally extracts the common track fields for events.

/// Track metadata
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackMetadata {
    /// Track title
    pub title: Option<String>,
    /// Artist name
    pub artist: Option<String>,
    /// Album name
    pub album: Option<String>,
    /// Genre
    pub genre: Option<String>,
    /// Track number
    pub track_number: Option<u32>,
    /// Duration in milliseconds
    pub duration_ms: Option<u32>,
}

impl TrackMetadata {
    /// True when no field was recognised
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

pub(crate) mod dmap_tags {
    pub const LISTING_ITEM: &[u8] = b"mlit";
    pub const ITEM_NAME: &[u8] = b"minm";
    pub const ITEM_ARTIST: &[u8] = b"asar";
    pub const ITEM_ALBUM: &[u8] = b"asal";
    pub const ITEM_GENRE: &[u8] = b"asgn";
    pub const TRACK_NUMBER: &[u8] = b"astn";
    pub const DURATION: &[u8] = b"astm";
}

/// Parse DMAP metadata
///
/// Items are `tag(4) | length(4, BE) | value`. An `mlit` container is
/// descended into; unknown tags are skipped.
///
/// # Errors
///
/// Returns `MetadataError::IncompleteData` if an item runs past the end of
/// the buffer and `MetadataError::InvalidFormat` on a length overflow.
pub fn parse_dmap_metadata(data: &[u8]) -> Result<TrackMetadata, MetadataError> {
    let mut metadata = TrackMetadata::default();
    parse_items(data, &mut metadata)?;
    Ok(metadata)
}

fn parse_items(data: &[u8], metadata: &mut TrackMetadata) -> Result<(), MetadataError> {
    let mut offset = 0;

    while offset + 8 <= data.len() {
        let tag = &data[offset..offset + 4];
        let length = u32::from_be_bytes([
            data[offset + 4],
            data[offset + 5],
            data[offset + 6],
            data[offset + 7],
        ]) as usize;
        offset += 8;

        let end = offset
            .checked_add(length)
            .ok_or(MetadataError::InvalidFormat)?;
        if end > data.len() {
            return Err(MetadataError::IncompleteData);
        }

        let value = &data[offset..end];
        offset = end;

        match tag {
            t if t == dmap_tags::LISTING_ITEM => parse_items(value, metadata)?,
            t if t == dmap_tags::ITEM_NAME => metadata.title = Some(text(value)),
            t if t == dmap_tags::ITEM_ARTIST => metadata.artist = Some(text(value)),
            t if t == dmap_tags::ITEM_ALBUM => metadata.album = Some(text(value)),
            t if t == dmap_tags::ITEM_GENRE => metadata.genre = Some(text(value)),
            t if t == dmap_tags::TRACK_NUMBER => metadata.track_number = integer(value),
            t if t == dmap_tags::DURATION => metadata.duration_ms = integer(value),
            _ => {}
        }
    }

    Ok(())
}

fn text(value: &[u8]) -> String {
    String::from_utf8_lossy(value).into_owned()
}

// DMAP integers are big-endian and 1, 2 or 4 bytes wide
fn integer(value: &[u8]) -> Option<u32> {
    if value.is_empty() || value.len() > 4 {
        return None;
    }
    Some(value.iter().fold(0u32, |acc, b| (acc << 8) | u32::from(*b)))
}

/// Errors parsing DMAP metadata
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MetadataError {
    /// Invalid DMAP structure
    #[error("Invalid DMAP format")]
    InvalidFormat,

    /// Data buffer ended unexpectedly
    #[error("Incomplete data")]
    IncompleteData,
}
