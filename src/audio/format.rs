//! Audio format definitions

use std::time::Duration;

/// Stream format announced by the sender in SDP
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFormat {
    /// Encoding name exactly as announced (e.g. `AppleLossless`, `L16`)
    pub codec: String,
    /// Clock rate in Hz
    pub sample_rate: u32,
}

impl AudioFormat {
    /// Create a new format
    pub fn new(codec: impl Into<String>, sample_rate: u32) -> Self {
        Self {
            codec: codec.into(),
            sample_rate,
        }
    }

    /// Codec family of this format
    #[must_use]
    pub fn kind(&self) -> AudioCodec {
        AudioCodec::from_name(&self.codec)
    }
}

impl std::fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.codec, self.sample_rate)
    }
}

/// Codec families the receiver can recognise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioCodec {
    /// Uncompressed 16-bit big-endian PCM (`L16`)
    Pcm,
    /// Apple Lossless
    Alac,
    /// AAC (`mpeg4-generic`)
    Aac,
    /// Anything else
    Unknown,
}

impl AudioCodec {
    /// Classify an SDP encoding name (case-insensitive)
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "l16" => AudioCodec::Pcm,
            "applelossless" | "alac" => AudioCodec::Alac,
            "mpeg4-generic" | "aac" => AudioCodec::Aac,
            _ => AudioCodec::Unknown,
        }
    }
}

/// PCM layout the output device is opened with
///
/// Samples are signed 16-bit interleaved in native byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkFormat {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Interleaved channel count
    pub channels: u16,
}

impl SinkFormat {
    /// Default output rate
    pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

    /// Bytes per interleaved frame
    #[must_use]
    pub fn frame_bytes(&self) -> usize {
        usize::from(self.channels) * 2
    }

    /// Bytes needed for `duration` of audio, rounded down to whole frames
    #[must_use]
    pub fn bytes_for(&self, duration: Duration) -> usize {
        let frames = u128::from(self.sample_rate) * duration.as_millis() / 1000;
        usize::try_from(frames)
            .unwrap_or(usize::MAX / 4)
            .saturating_mul(self.frame_bytes())
    }

    /// Output layout for an announced stream
    ///
    /// The device always runs stereo 16-bit; the announced rate is used when
    /// one was given.
    #[must_use]
    pub fn for_stream(format: Option<&AudioFormat>) -> Self {
        let sample_rate = format
            .map(|f| f.sample_rate)
            .filter(|rate| *rate > 0)
            .unwrap_or(Self::DEFAULT_SAMPLE_RATE);
        Self {
            sample_rate,
            channels: 2,
        }
    }
}

impl Default for SinkFormat {
    fn default() -> Self {
        Self::for_stream(None)
    }
}
