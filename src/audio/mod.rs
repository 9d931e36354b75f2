//! Audio handling module

pub mod buffer;
pub mod decoder;
pub mod format;
pub mod output_cpal;
pub mod queue;
pub mod sink;

#[cfg(test)]
mod tests;

pub use buffer::PlaybackBuffer;
pub use decoder::{AudioDecoder, DecodeError, decoder_for};
pub use format::{AudioCodec, AudioFormat, SinkFormat};
pub use queue::IngestionQueue;
pub use sink::{AudioBackend, AudioSink, NullBackend, SinkError, create_default_backend};

#[cfg(feature = "audio-cpal")]
pub use output_cpal::{CpalBackend, CpalSink};
