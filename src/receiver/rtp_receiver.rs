//! RTP packet receiver for audio data
//!
//! One task per session reads the SETUP socket, strips the RTP header,
//! decodes the payload for the announced format and feeds the result to
//! the registry.

use super::session_registry::SessionRegistry;
use crate::audio::{AudioDecoder, AudioFormat, DecodeError, decoder_for};
use crate::protocol::rtp::{RtpDecodeError, RtpPacket};
use bytes::Bytes;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;

/// Maximum UDP packet size
const MAX_PACKET_SIZE: usize = 2048;

/// Errors from RTP reception
#[derive(Debug, thiserror::Error)]
pub enum RtpReceiveError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid RTP packet
    #[error("Invalid RTP packet: {0}")]
    InvalidPacket(#[from] RtpDecodeError),

    /// Payload could not be decoded
    #[error("Decode failed: {0}")]
    Decode(#[from] DecodeError),
}

/// What happened to one datagram
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketOutcome {
    /// Queued for playback
    Queued,
    /// Valid, but the session is not streaming
    Dropped,
    /// Session no longer registered
    SessionGone,
}

/// Audio receiver for one session
pub struct RtpAudioReceiver {
    socket: UdpSocket,
    session_id: String,
    registry: Arc<SessionRegistry>,
    cancel: CancellationToken,
    format: Option<AudioFormat>,
    decoder: Box<dyn AudioDecoder>,
    warned: bool,
}

impl RtpAudioReceiver {
    /// Create a receiver bound to an already-open socket
    #[must_use]
    pub fn new(
        socket: UdpSocket,
        session_id: impl Into<String>,
        registry: Arc<SessionRegistry>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            socket,
            session_id: session_id.into(),
            registry,
            cancel,
            format: None,
            decoder: decoder_for(None),
            warned: false,
        }
    }

    /// Receive until the session closes or the token is cancelled
    ///
    /// # Errors
    ///
    /// Returns `RtpReceiveError::Io` if the socket fails.
    pub async fn run(mut self) -> Result<(), RtpReceiveError> {
        let mut buf = vec![0u8; MAX_PACKET_SIZE];

        loop {
            let len = tokio::select! {
                () = self.cancel.cancelled() => break,
                result = self.socket.recv_from(&mut buf) => result?.0,
            };

            match self.process_packet(&buf[..len]) {
                Ok(PacketOutcome::SessionGone) => break,
                Ok(_) => {}
                Err(e) => self.report(&e),
            }
        }

        tracing::debug!(session = %self.session_id, "RTP receiver stopped");
        Ok(())
    }

    /// Decode one datagram and hand it to the session
    ///
    /// # Errors
    ///
    /// Returns `RtpReceiveError` if the packet or its payload is invalid.
    pub fn process_packet(&mut self, data: &[u8]) -> Result<PacketOutcome, RtpReceiveError> {
        let Some(session) = self.registry.get(&self.session_id) else {
            return Ok(PacketOutcome::SessionGone);
        };

        let packet = RtpPacket::decode(data)?;

        let format = session.format();
        if format != self.format {
            self.decoder = decoder_for(format.as_ref());
            tracing::debug!(
                session = %self.session_id,
                decoder = self.decoder.name(),
                "Selected payload decoder"
            );
            self.format = format;
            self.warned = false;
        }

        let pcm = self.decoder.decode(&packet.payload)?;
        if session.ingest(Bytes::from(pcm)) {
            Ok(PacketOutcome::Queued)
        } else {
            Ok(PacketOutcome::Dropped)
        }
    }

    // Once per session and format, the stream is usually uniformly bad
    fn report(&mut self, error: &RtpReceiveError) {
        if self.warned {
            tracing::trace!(session = %self.session_id, error = %error, "Dropped packet");
            return;
        }
        self.warned = true;
        tracing::warn!(
            session = %self.session_id,
            error = %error,
            "Dropping undecodable audio packets"
        );
    }
}
