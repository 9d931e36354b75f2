//! `SET_PARAMETER` request routing

use super::artwork_handler::Artwork;
use super::metadata_handler::{TrackMetadata, parse_dmap_metadata};
use super::volume_handler::{VolumeUpdate, parse_volume_parameter};
use crate::protocol::rtsp::RtspRequest;
use bytes::Bytes;

pub(crate) mod content_types {
    pub const TEXT_PARAMETERS: &str = "text/parameters";
    pub const IMAGE_JPEG: &str = "image/jpeg";
    pub const IMAGE_PNG: &str = "image/png";
    pub const DMAP_TAGGED: &str = "application/x-dmap-tagged";
}

/// Result of processing `SET_PARAMETER`
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterUpdate {
    /// Volume update
    Volume(VolumeUpdate),
    /// Raw DMAP metadata plus whatever could be parsed out of it
    Metadata {
        /// Body as received
        raw: Bytes,
        /// Parsed track fields, if the body was well formed
        track: Option<TrackMetadata>,
    },
    /// Cover art
    Artwork(Artwork),
}

/// Process a `SET_PARAMETER` request
///
/// Returns `None` for an empty body, a missing content type, an unknown
/// content type or a parameter body without a usable value.
#[must_use]
pub fn process_set_parameter(request: &RtspRequest) -> Option<ParameterUpdate> {
    let content_type = request.headers.content_type()?;
    if request.headers.content_length() == 0 || request.body.is_empty() {
        return None;
    }

    // Parameters such as `; charset=utf-8` do not change routing
    let media_type = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim();

    if media_type.eq_ignore_ascii_case(content_types::TEXT_PARAMETERS) {
        let body = String::from_utf8_lossy(&request.body);
        parse_volume_parameter(&body).map(ParameterUpdate::Volume)
    } else if media_type.eq_ignore_ascii_case(content_types::IMAGE_JPEG)
        || media_type.eq_ignore_ascii_case(content_types::IMAGE_PNG)
    {
        let data = Bytes::copy_from_slice(&request.body);
        Some(ParameterUpdate::Artwork(Artwork::new(media_type, data)))
    } else if media_type.eq_ignore_ascii_case(content_types::DMAP_TAGGED) {
        let track = match parse_dmap_metadata(&request.body) {
            Ok(track) => Some(track),
            Err(e) => {
                tracing::debug!(error = %e, "Keeping unparsable DMAP metadata as raw bytes");
                None
            }
        };
        Some(ParameterUpdate::Metadata {
            raw: Bytes::copy_from_slice(&request.body),
            track,
        })
    } else {
        tracing::debug!(content_type = %content_type, "Ignoring unknown SET_PARAMETER type");
        None
    }
}
