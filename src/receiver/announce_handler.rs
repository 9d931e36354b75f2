//! ANNOUNCE request handler
//!
//! Extracts the stream format from the SDP body.

use crate::audio::AudioFormat;
use crate::protocol::rtsp::RtspRequest;
use crate::protocol::sdp::RtpMap;

/// Errors from ANNOUNCE handling
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AnnounceError {
    /// `Content-Length` missing or zero
    #[error("ANNOUNCE without body")]
    EmptyBody,
}

/// Process an ANNOUNCE request
///
/// Returns the format from the first `a=rtpmap` attribute, or `Ok(None)`
/// when the body has none.
///
/// # Errors
///
/// Returns `AnnounceError::EmptyBody` if the request carries no body.
pub fn process_announce(request: &RtspRequest) -> Result<Option<AudioFormat>, AnnounceError> {
    if request.headers.content_length() == 0 {
        return Err(AnnounceError::EmptyBody);
    }

    let sdp = String::from_utf8_lossy(&request.body);
    Ok(RtpMap::find(&sdp).map(|map| AudioFormat::new(map.codec, map.sample_rate)))
}
