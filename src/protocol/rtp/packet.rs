use thiserror::Error;

/// RAOP data channel payload types
///
/// Senders mark the first packet after RECORD or FLUSH with the marker bit,
/// so decoding looks at the low seven bits only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PayloadType {
    /// Streamed audio, dynamic type 96 from the SDP `rtpmap`
    AudioRealtime = 0x60,
    /// Buffered audio (type 97)
    AudioBuffered = 0x61,
}

impl PayloadType {
    fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0x60 => Some(Self::AudioRealtime),
            0x61 => Some(Self::AudioBuffered),
            _ => None,
        }
    }
}

/// Fixed part of an RTP header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtpHeader {
    /// Set on the first packet of a burst
    pub marker: bool,
    /// Audio payload type
    pub payload_type: PayloadType,
    /// Sequence number, wraps at 2^16
    pub sequence: u16,
    /// Media timestamp in sample frames
    pub timestamp: u32,
    /// Stream source id
    pub ssrc: u32,
    csrc_count: u8,
    has_extension: bool,
    has_padding: bool,
}

impl RtpHeader {
    /// Length of the fixed header
    pub const SIZE: usize = 12;

    const VERSION: u8 = 2;

    /// Header for an unmarked realtime audio packet
    #[must_use]
    pub fn new_audio(sequence: u16, timestamp: u32, ssrc: u32) -> Self {
        Self {
            marker: false,
            payload_type: PayloadType::AudioRealtime,
            sequence,
            timestamp,
            ssrc,
            csrc_count: 0,
            has_extension: false,
            has_padding: false,
        }
    }

    /// Serialize the fixed header
    ///
    /// CSRC, extension and padding flags are never written: the sender side
    /// of this crate emits plain packets only.
    #[must_use]
    pub fn encode(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[0] = Self::VERSION << 6;
        out[1] = self.payload_type as u8 | if self.marker { 0x80 } else { 0 };
        out[2..4].copy_from_slice(&self.sequence.to_be_bytes());
        out[4..8].copy_from_slice(&self.timestamp.to_be_bytes());
        out[8..12].copy_from_slice(&self.ssrc.to_be_bytes());
        out
    }

    /// Parse the fixed header
    ///
    /// # Errors
    ///
    /// Returns `RtpDecodeError` if fewer than 12 bytes are given, the
    /// version is not 2 or the payload type is not audio.
    pub fn decode(buf: &[u8]) -> Result<Self, RtpDecodeError> {
        let fixed: &[u8; Self::SIZE] = buf
            .get(..Self::SIZE)
            .and_then(|b| b.try_into().ok())
            .ok_or(RtpDecodeError::BufferTooSmall {
                needed: Self::SIZE,
                have: buf.len(),
            })?;

        let version = fixed[0] >> 6;
        if version != Self::VERSION {
            return Err(RtpDecodeError::InvalidVersion(version));
        }

        let type_bits = fixed[1] & 0x7F;
        let payload_type =
            PayloadType::from_bits(type_bits).ok_or(RtpDecodeError::UnknownPayloadType(type_bits))?;

        Ok(Self {
            marker: fixed[1] & 0x80 != 0,
            payload_type,
            sequence: u16::from_be_bytes([fixed[2], fixed[3]]),
            timestamp: u32::from_be_bytes([fixed[4], fixed[5], fixed[6], fixed[7]]),
            ssrc: u32::from_be_bytes([fixed[8], fixed[9], fixed[10], fixed[11]]),
            csrc_count: fixed[0] & 0x0F,
            has_extension: fixed[0] & 0x10 != 0,
            has_padding: fixed[0] & 0x20 != 0,
        })
    }
}

/// RTP decode errors
#[derive(Debug, Error)]
pub enum RtpDecodeError {
    #[error("buffer too small: need {needed} bytes, have {have}")]
    BufferTooSmall { needed: usize, have: usize },

    #[error("invalid RTP version: {0}")]
    InvalidVersion(u8),

    #[error("unknown payload type: 0x{0:02x}")]
    UnknownPayloadType(u8),

    #[error("padding length {padding} exceeds {available} payload bytes")]
    InvalidPadding { padding: usize, available: usize },
}

/// One datagram from the audio data channel
#[derive(Debug, Clone)]
pub struct RtpPacket {
    /// Parsed header
    pub header: RtpHeader,
    /// Audio bytes as sent, in the announced codec
    pub payload: Vec<u8>,
}

impl RtpPacket {
    /// Realtime audio packet around `audio_data`
    #[must_use]
    pub fn audio(sequence: u16, timestamp: u32, ssrc: u32, audio_data: Vec<u8>) -> Self {
        Self {
            header: RtpHeader::new_audio(sequence, timestamp, ssrc),
            payload: audio_data,
        }
    }

    /// Serialize header and payload
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(RtpHeader::SIZE + self.payload.len());
        out.extend_from_slice(&self.header.encode());
        out.extend_from_slice(&self.payload);
        out
    }

    /// Parse a datagram, skipping CSRCs and any header extension and
    /// stripping trailing padding
    ///
    /// # Errors
    ///
    /// Returns `RtpDecodeError` if the header is invalid or the datagram is
    /// shorter than its header says.
    pub fn decode(buf: &[u8]) -> Result<Self, RtpDecodeError> {
        let header = RtpHeader::decode(buf)?;

        let mut offset = RtpHeader::SIZE + 4 * usize::from(header.csrc_count);
        if header.has_extension {
            let words = buf
                .get(offset + 2..offset + 4)
                .map(|b| usize::from(u16::from_be_bytes([b[0], b[1]])))
                .ok_or(RtpDecodeError::BufferTooSmall {
                    needed: offset + 4,
                    have: buf.len(),
                })?;
            offset += 4 + 4 * words;
        }
        if buf.len() < offset {
            return Err(RtpDecodeError::BufferTooSmall {
                needed: offset,
                have: buf.len(),
            });
        }

        let mut end = buf.len();
        if header.has_padding {
            let padding = usize::from(buf[end - 1]);
            let available = end - offset;
            if padding == 0 || padding > available {
                return Err(RtpDecodeError::InvalidPadding { padding, available });
            }
            end -= padding;
        }

        Ok(Self {
            header,
            payload: buf[offset..end].to_vec(),
        })
    }
}
