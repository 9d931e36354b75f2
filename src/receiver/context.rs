//! Engine state shared by every connection

use super::config::ReceiverConfig;
use super::events::ReceiverEvent;
use super::rtp_receiver::RtpAudioReceiver;
use super::session::{Session, SessionError};
use super::session_registry::SessionRegistry;
use super::volume_handler::db_to_gain;
use crate::audio::AudioBackend;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

/// Everything a request handler may touch beyond its own connection
pub struct ReceiverContext {
    /// Engine configuration
    pub config: ReceiverConfig,
    /// Live sessions
    pub registry: Arc<SessionRegistry>,
    /// Platform audio output
    pub backend: Arc<dyn AudioBackend>,
    /// Event fan-out
    pub event_tx: broadcast::Sender<ReceiverEvent>,
    /// Cancelled when the engine stops
    pub shutdown: CancellationToken,
}

impl ReceiverContext {
    /// Build a context with its own registry
    #[must_use]
    pub fn new(
        config: ReceiverConfig,
        backend: Arc<dyn AudioBackend>,
        event_tx: broadcast::Sender<ReceiverEvent>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            registry: Arc::new(SessionRegistry::new(shutdown.clone())),
            config,
            backend,
            event_tx,
            shutdown,
        }
    }

    /// Send an event; having no subscribers is fine
    pub fn emit(&self, event: ReceiverEvent) {
        let _ = self.event_tx.send(event);
    }

    /// Bind the session's UDP audio socket and start its receiver task
    ///
    /// Idempotent per session: a second call returns the port already bound.
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the socket cannot be bound.
    pub fn open_audio_channel(&self, session: &Session) -> std::io::Result<u16> {
        if let Some(port) = session.audio_port() {
            return Ok(port);
        }

        let addr = SocketAddr::new(self.config.bind_addr, self.config.audio_port);
        let std_socket = std::net::UdpSocket::bind(addr)?;
        std_socket.set_nonblocking(true)?;
        let socket = UdpSocket::from_std(std_socket)?;
        let port = socket.local_addr()?.port();

        session
            .set_audio_port(port)
            .map_err(|e| std::io::Error::other(e.to_string()))?;

        let receiver = RtpAudioReceiver::new(
            socket,
            session.id(),
            self.registry.clone(),
            session.cancel_token(),
        );
        let id = session.id().to_string();
        tokio::spawn(async move {
            if let Err(e) = receiver.run().await {
                tracing::error!(session = %id, error = %e, "RTP receiver failed");
            }
        });

        tracing::debug!(session = %session.id(), port, "Audio channel bound");
        Ok(port)
    }

    /// Store a session volume and apply it to the platform output
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Closed` if the session is gone; a rejected
    /// platform volume change is logged, not returned.
    pub fn apply_volume(&self, session: &Session, db: f32) -> Result<f32, SessionError> {
        let db = session.set_volume(db)?;
        let gain = db_to_gain(db);

        if let Err(e) = self.backend.set_output_gain(gain) {
            tracing::warn!(session = %session.id(), error = %e, "Failed to set output volume");
        }

        tracing::debug!(session = %session.id(), db, gain, "Volume changed");
        self.emit(ReceiverEvent::VolumeChanged {
            session_id: session.id().to_string(),
            db,
            gain,
        });
        Ok(db)
    }

    /// Remove and close a session, announcing it
    pub fn teardown_session(&self, id: &str) -> bool {
        let removed = self.registry.teardown(id);
        if removed {
            self.emit(ReceiverEvent::PlaybackStopped {
                session_id: id.to_string(),
            });
        }
        removed
    }
}
