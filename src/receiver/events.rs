//! Receiver events for UI and application integration

use super::artwork_handler::Artwork;
use super::metadata_handler::TrackMetadata;
use crate::audio::AudioFormat;
use std::net::SocketAddr;

/// Events emitted by the receiver
#[derive(Debug, Clone)]
pub enum ReceiverEvent {
    /// Receiver started
    Started {
        /// Receiver name
        name: String,
        /// Bound control port
        port: u16,
    },

    /// Receiver stopped
    Stopped,

    /// Client connected
    ClientConnected {
        /// Client address
        address: SocketAddr,
    },

    /// Client disconnected
    ClientDisconnected {
        /// Client address
        address: SocketAddr,
        /// Disconnect reason
        reason: String,
    },

    /// SETUP created a session
    SessionCreated {
        /// Session id
        session_id: String,
        /// UDP port audio is received on
        audio_port: u16,
    },

    /// RECORD moved a session to streaming
    PlaybackStarted {
        /// Session id
        session_id: String,
    },

    /// FLUSH discarded queued audio
    PlaybackFlushed {
        /// Session id
        session_id: String,
        /// Queued chunks dropped
        discarded: usize,
    },

    /// Session closed by TEARDOWN or disconnect
    PlaybackStopped {
        /// Session id
        session_id: String,
    },

    /// Volume changed
    VolumeChanged {
        /// Session id
        session_id: String,
        /// Volume in dB (-30 to 0)
        db: f32,
        /// Linear gain applied to the output (0.0 to 1.0)
        gain: f32,
    },

    /// ANNOUNCE described the stream
    FormatAnnounced {
        /// Session id, if SETUP already happened
        session_id: Option<String>,
        /// Announced format
        format: AudioFormat,
    },

    /// Track metadata updated
    MetadataUpdated {
        /// Session id
        session_id: String,
        /// Parsed fields
        metadata: TrackMetadata,
    },

    /// Cover art updated
    ArtworkUpdated {
        /// Session id
        session_id: String,
        /// Image
        artwork: Artwork,
    },
}
