//! Audio output abstraction
//!
//! A backend represents the platform output (device enumeration and the
//! system output volume). Each streaming session opens its own sink from
//! the backend and is the only writer to it.

use super::format::SinkFormat;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Errors from audio output
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// Device not found
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// Format not supported
    #[error("Format not supported: {0:?}")]
    FormatNotSupported(SinkFormat),

    /// Stream error
    #[error("Stream error: {0}")]
    StreamError(String),

    /// Generic device error
    #[error("Device error: {0}")]
    DeviceError(String),

    /// Sink was closed
    #[error("Output closed")]
    Closed,
}

/// An open output stream owned by one session
///
/// All methods take `&self`: the playback thread writes while control
/// requests flush or close from other threads.
pub trait AudioSink: Send + Sync {
    /// Queue PCM bytes for playback
    ///
    /// Blocks until the device has accepted every byte, or the sink is
    /// flushed or closed concurrently.
    ///
    /// # Errors
    ///
    /// Returns `SinkError::Closed` once `close` has been called.
    fn write(&self, chunk: &[u8]) -> Result<(), SinkError>;

    /// Flush generation, changed by every `flush`
    ///
    /// Sinks that cannot discard buffered audio keep the default.
    fn flush_epoch(&self) -> u64 {
        0
    }

    /// Write `chunk` unless the sink was flushed after `epoch` was read
    ///
    /// A stale chunk is dropped and reported as written.
    ///
    /// # Errors
    ///
    /// Returns `SinkError::Closed` once `close` has been called.
    fn write_at(&self, chunk: &[u8], epoch: u64) -> Result<(), SinkError> {
        let _ = epoch;
        self.write(chunk)
    }

    /// Discard buffered audio that has not been played yet
    ///
    /// The device stays open and a write in progress returns early.
    fn flush(&self);

    /// Stop and release the device
    ///
    /// Idempotent, and safe to call while another thread is in `write`.
    fn close(&self);

    /// Whether `close` has been called
    fn is_closed(&self) -> bool;
}

/// Platform audio output
pub trait AudioBackend: Send + Sync {
    /// Allocate a new sink holding `periods` buffer periods of audio
    ///
    /// # Errors
    ///
    /// Returns `SinkError` if the device cannot be opened.
    fn open_sink(&self, format: SinkFormat, periods: usize)
    -> Result<Arc<dyn AudioSink>, SinkError>;

    /// Current output gain (0.0 to 1.0)
    fn output_gain(&self) -> f32;

    /// Set output gain (0.0 to 1.0)
    ///
    /// # Errors
    ///
    /// Returns `SinkError` if the platform rejects the change.
    fn set_output_gain(&self, gain: f32) -> Result<(), SinkError>;
}

/// Backend that accepts and discards all audio
#[derive(Debug)]
pub struct NullBackend {
    gain: Mutex<f32>,
}

impl NullBackend {
    /// Create a new null backend at full gain
    #[must_use]
    pub fn new() -> Self {
        Self {
            gain: Mutex::new(1.0),
        }
    }
}

impl Default for NullBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioBackend for NullBackend {
    fn open_sink(
        &self,
        _format: SinkFormat,
        _periods: usize,
    ) -> Result<Arc<dyn AudioSink>, SinkError> {
        Ok(Arc::new(NullSink::default()))
    }

    fn output_gain(&self) -> f32 {
        *self.gain.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_output_gain(&self, gain: f32) -> Result<(), SinkError> {
        let mut current = self.gain.lock().unwrap_or_else(PoisonError::into_inner);
        *current = gain.clamp(0.0, 1.0);
        Ok(())
    }
}

#[derive(Debug, Default)]
struct NullSink {
    closed: AtomicBool,
}

impl AudioSink for NullSink {
    fn write(&self, _chunk: &[u8]) -> Result<(), SinkError> {
        if self.is_closed() {
            return Err(SinkError::Closed);
        }
        Ok(())
    }

    fn flush(&self) {}

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Create the default backend for the enabled features
///
/// With `audio-cpal` this is the system output device (optionally a named
/// one); otherwise audio is discarded.
///
/// # Errors
///
/// Returns `SinkError` if the cpal backend cannot be initialised.
pub fn create_default_backend(device: Option<&str>) -> Result<Arc<dyn AudioBackend>, SinkError> {
    #[cfg(feature = "audio-cpal")]
    {
        Ok(Arc::new(super::output_cpal::CpalBackend::new(device)?))
    }

    #[cfg(not(feature = "audio-cpal"))]
    {
        if let Some(name) = device {
            tracing::warn!(device = %name, "audio-cpal feature disabled, discarding audio");
        }
        Ok(Arc::new(NullBackend::new()))
    }
}
