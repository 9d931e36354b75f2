//! Payload decoders producing native-endian 16-bit PCM
//!
//! The receiver ships no compressed codec. Compressed streams are recognised
//! and reported as unsupported so their packets can be dropped.

use super::format::{AudioCodec, AudioFormat};

/// Errors from payload decoding
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// No decoder is available for this codec
    #[error("Unsupported codec: {0}")]
    Unsupported(String),

    /// Payload is not a whole number of samples
    #[error("Truncated payload: {len} bytes is not a multiple of {frame}")]
    Truncated { len: usize, frame: usize },
}

/// Converts one encoded RTP payload into PCM
pub trait AudioDecoder: Send {
    /// Decode one payload
    ///
    /// # Errors
    ///
    /// Returns `DecodeError` if the payload cannot be decoded.
    fn decode(&mut self, payload: &[u8]) -> Result<Vec<u8>, DecodeError>;

    /// Short name for logging
    fn name(&self) -> &'static str;
}

/// Hands payloads through unchanged
///
/// Used when no format was announced.
#[derive(Debug, Default)]
pub struct PassthroughDecoder;

impl AudioDecoder for PassthroughDecoder {
    fn decode(&mut self, payload: &[u8]) -> Result<Vec<u8>, DecodeError> {
        Ok(payload.to_vec())
    }

    fn name(&self) -> &'static str {
        "passthrough"
    }
}

/// `L16` decoder: network byte order samples to native order
#[derive(Debug, Default)]
pub struct PcmDecoder;

impl AudioDecoder for PcmDecoder {
    fn decode(&mut self, payload: &[u8]) -> Result<Vec<u8>, DecodeError> {
        if payload.len() % 2 != 0 {
            return Err(DecodeError::Truncated {
                len: payload.len(),
                frame: 2,
            });
        }

        let mut out = Vec::with_capacity(payload.len());
        for pair in payload.chunks_exact(2) {
            let sample = i16::from_be_bytes([pair[0], pair[1]]);
            out.extend_from_slice(&sample.to_ne_bytes());
        }
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "pcm"
    }
}

/// Placeholder for codecs without an implementation
#[derive(Debug)]
pub struct UnsupportedDecoder {
    codec: String,
}

impl AudioDecoder for UnsupportedDecoder {
    fn decode(&mut self, _payload: &[u8]) -> Result<Vec<u8>, DecodeError> {
        Err(DecodeError::Unsupported(self.codec.clone()))
    }

    fn name(&self) -> &'static str {
        "unsupported"
    }
}

/// Pick a decoder for the announced stream format
#[must_use]
pub fn decoder_for(format: Option<&AudioFormat>) -> Box<dyn AudioDecoder> {
    match format {
        None => Box::new(PassthroughDecoder),
        Some(format) => match format.kind() {
            AudioCodec::Pcm => Box::new(PcmDecoder),
            AudioCodec::Alac | AudioCodec::Aac | AudioCodec::Unknown => {
                Box::new(UnsupportedDecoder {
                    codec: format.codec.clone(),
                })
            }
        },
    }
}
