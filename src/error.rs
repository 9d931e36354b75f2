use crate::audio::{DecodeError, SinkError};
use crate::discovery::AdvertiserError;
use crate::protocol::rtsp::ParseError;
use crate::receiver::{ConfigError, ReceiverError, SessionError};
use thiserror::Error;

/// Errors that can occur anywhere in the receiver
#[derive(Debug, Error)]
pub enum AirHomeError {
    /// Engine lifecycle error
    #[error("receiver error: {0}")]
    Receiver(#[from] ReceiverError),

    /// Session operation on a closed or invalid session
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// Control request could not be framed
    #[error("protocol error: {0}")]
    Protocol(#[from] ParseError),

    /// Audio output error
    #[error("audio output error: {0}")]
    Sink(#[from] SinkError),

    /// Audio payload decoding error
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Presence advertisement error
    #[error("advertisement error: {0}")]
    Advertiser(#[from] AdvertiserError),

    /// Configuration file error
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AirHomeError {
    /// Check if the failure is local to one connection or session
    ///
    /// Recoverable errors leave the engine running; the rest mean it could
    /// not start or its configuration is unusable.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Receiver(e) => matches!(e, ReceiverError::Protocol(_) | ReceiverError::Io(_)),
            Self::Session(_)
            | Self::Protocol(_)
            | Self::Sink(_)
            | Self::Decode(_)
            | Self::Advertiser(_)
            | Self::Io(_) => true,
            Self::Config(_) => false,
        }
    }
}

/// Result type alias for receiver operations
pub type Result<T> = std::result::Result<T, AirHomeError>;
