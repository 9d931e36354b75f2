//! SDP (Session Description Protocol) for RAOP
//!
//! RAOP senders describe the audio stream in the ANNOUNCE body. The receiver
//! only needs the codec name and clock rate from the first
//! `a=rtpmap:<payload-type> <codec>/<rate>` attribute, so this is a scanner
//! rather than a full SDP parser.

#[cfg(test)]
mod tests;

/// Attribute prefix carrying the payload format mapping
const RTPMAP_PREFIX: &str = "a=rtpmap:";

/// Media format mapping from an `a=rtpmap` attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtpMap {
    /// RTP payload type number
    pub payload_type: u32,
    /// Encoding name (e.g. `AppleLossless`, `L16`, `mpeg4-generic`)
    pub codec: String,
    /// Clock rate in Hz
    pub sample_rate: u32,
}

impl RtpMap {
    /// Find the first `a=rtpmap:<n> <codec>/<rate>` occurrence in `body`
    ///
    /// The attribute may appear anywhere in the text. The codec token is
    /// restricted to ASCII alphanumerics, `_` and `-`. Anything after the
    /// rate digits (such as `/2` channel counts) is ignored. Occurrences that
    /// do not fit the shape are skipped and scanning continues.
    #[must_use]
    pub fn find(body: &str) -> Option<Self> {
        let mut rest = body;
        while let Some(pos) = rest.find(RTPMAP_PREFIX) {
            rest = &rest[pos + RTPMAP_PREFIX.len()..];
            if let Some(map) = Self::parse_value(rest) {
                return Some(map);
            }
        }
        None
    }

    /// Parse `<n> <codec>/<rate>` from the start of `value`
    fn parse_value(value: &str) -> Option<Self> {
        let (payload_type, rest) = take_digits(value)?;
        let rest = rest.strip_prefix(' ')?;

        let codec_len = rest
            .bytes()
            .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_' || *b == b'-')
            .count();
        if codec_len == 0 {
            return None;
        }
        let (codec, rest) = rest.split_at(codec_len);

        let rest = rest.strip_prefix('/')?;
        let (sample_rate, _) = take_digits(rest)?;

        Some(Self {
            payload_type: payload_type.parse().ok()?,
            codec: codec.to_string(),
            sample_rate: sample_rate.parse().ok()?,
        })
    }
}

/// Split a leading run of ASCII digits from `s`
fn take_digits(s: &str) -> Option<(&str, &str)> {
    let len = s.bytes().take_while(u8::is_ascii_digit).count();
    if len == 0 {
        return None;
    }
    Some(s.split_at(len))
}
