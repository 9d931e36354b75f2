//! Receiver session
//!
//! A session is created by SETUP and lives until TEARDOWN, disconnect or
//! engine shutdown. It owns the ingestion queue, the sink once streaming
//! starts, the playback thread, and the per-session side channels (volume,
//! metadata, artwork).
//!
//! All state sits behind one mutex. `ingest`, `flush`, `set_volume` and
//! `close` take it, so a closed session can never reach its released sink.

use super::artwork_handler::Artwork;
use super::metadata_handler::TrackMetadata;
use super::playback::{PlaybackStats, spawn_playback};
use super::volume_handler::{VOLUME_MAX_DB, clamp_db};
use crate::audio::{AudioBackend, AudioFormat, AudioSink, IngestionQueue, SinkError, SinkFormat};
use bytes::Bytes;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Session lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Created, not yet armed by SETUP
    Negotiating,
    /// SETUP complete, waiting for RECORD
    Armed,
    /// RECORD received, sink open and playback thread running
    Streaming,
    /// Torn down; terminal
    Closed,
}

impl SessionState {
    /// Check if transition to new state is valid
    #[must_use]
    pub fn can_transition_to(&self, new_state: SessionState) -> bool {
        use SessionState::{Armed, Closed, Negotiating, Streaming};

        matches!(
            (self, new_state),
            (Negotiating, Armed)
                | (Armed, Streaming)
                | (Negotiating | Armed | Streaming, Closed)
        )
    }

    /// Is the session still valid (not closed)?
    #[must_use]
    pub fn is_valid(&self) -> bool {
        *self != SessionState::Closed
    }
}

/// Session errors
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Session was already torn down
    #[error("Session closed")]
    Closed,

    /// State machine rejected the transition
    #[error("Invalid state transition from {from:?} to {to:?}")]
    InvalidTransition {
        /// Current state
        from: SessionState,
        /// Requested state
        to: SessionState,
    },

    /// Output device could not be opened
    #[error("Audio sink unavailable: {0}")]
    Sink(#[from] SinkError),

    /// Playback thread could not be started
    #[error("Failed to start playback thread: {0}")]
    Spawn(#[source] std::io::Error),
}

struct SessionInner {
    state: SessionState,
    format: Option<AudioFormat>,
    volume_db: f32,
    audio_port: Option<u16>,
    sink: Option<Arc<dyn AudioSink>>,
    playback: Option<JoinHandle<PlaybackStats>>,
    metadata: Option<Bytes>,
    track: Option<TrackMetadata>,
    artwork: Option<Artwork>,
}

/// A RAOP streaming session
pub struct Session {
    id: String,
    inner: Mutex<SessionInner>,
    queue: Arc<IngestionQueue>,
    cancel: CancellationToken,
}

impl Session {
    /// Create a session in `Negotiating`
    ///
    /// `cancel` is cancelled when the session closes; tasks serving the
    /// session (the RTP receiver) watch it.
    #[must_use]
    pub fn new(id: impl Into<String>, cancel: CancellationToken) -> Self {
        Self {
            id: id.into(),
            inner: Mutex::new(SessionInner {
                state: SessionState::Negotiating,
                format: None,
                volume_db: VOLUME_MAX_DB,
                audio_port: None,
                sink: None,
                playback: None,
                metadata: None,
                track: None,
                artwork: None,
            }),
            queue: Arc::new(IngestionQueue::new()),
            cancel,
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn open(&self) -> Result<MutexGuard<'_, SessionInner>, SessionError> {
        let inner = self.lock();
        if inner.state == SessionState::Closed {
            return Err(SessionError::Closed);
        }
        Ok(inner)
    }

    /// Session id
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.lock().state
    }

    /// True while the sink is open
    #[must_use]
    pub fn is_streaming(&self) -> bool {
        self.state() == SessionState::Streaming
    }

    /// Token cancelled when the session closes
    #[must_use]
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Announced stream format
    #[must_use]
    pub fn format(&self) -> Option<AudioFormat> {
        self.lock().format.clone()
    }

    /// Current volume in dB
    #[must_use]
    pub fn volume_db(&self) -> f32 {
        self.lock().volume_db
    }

    /// UDP port audio is received on
    #[must_use]
    pub fn audio_port(&self) -> Option<u16> {
        self.lock().audio_port
    }

    /// Last DMAP metadata body, verbatim
    #[must_use]
    pub fn metadata(&self) -> Option<Bytes> {
        self.lock().metadata.clone()
    }

    /// Last parsed track metadata
    #[must_use]
    pub fn track(&self) -> Option<TrackMetadata> {
        self.lock().track.clone()
    }

    /// Last cover art
    #[must_use]
    pub fn artwork(&self) -> Option<Artwork> {
        self.lock().artwork.clone()
    }

    /// Chunks waiting for the playback thread
    #[must_use]
    pub fn queued_chunks(&self) -> usize {
        self.queue.len()
    }

    /// Move from `Negotiating` to `Armed`
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the session is closed or already armed.
    pub fn arm(&self) -> Result<(), SessionError> {
        let mut inner = self.open()?;
        transition(&mut inner, SessionState::Armed)
    }

    /// Set the announced stream format
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Closed` after teardown.
    pub fn set_format(&self, format: AudioFormat) -> Result<(), SessionError> {
        let mut inner = self.open()?;
        if inner.state == SessionState::Streaming {
            tracing::debug!(session = %self.id, format = %format, "Format changed while streaming");
        }
        inner.format = Some(format);
        Ok(())
    }

    /// Record the bound audio port
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Closed` after teardown.
    pub fn set_audio_port(&self, port: u16) -> Result<(), SessionError> {
        self.open()?.audio_port = Some(port);
        Ok(())
    }

    /// Open the sink and start the playback thread
    ///
    /// Returns `Ok(false)` if the session was already streaming. On failure
    /// the session stays `Armed`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the session is closed or not armed, the
    /// backend cannot open a sink, or the thread cannot be spawned.
    pub fn start_streaming(
        &self,
        backend: &dyn AudioBackend,
        periods: usize,
    ) -> Result<bool, SessionError> {
        let mut inner = self.open()?;
        if inner.state == SessionState::Streaming {
            return Ok(false);
        }
        if !inner.state.can_transition_to(SessionState::Streaming) {
            return Err(SessionError::InvalidTransition {
                from: inner.state,
                to: SessionState::Streaming,
            });
        }

        let format = SinkFormat::for_stream(inner.format.as_ref());
        let sink = backend.open_sink(format, periods)?;
        let playback = match spawn_playback(&self.id, self.queue.clone(), sink.clone()) {
            Ok(handle) => handle,
            Err(e) => {
                sink.close();
                return Err(SessionError::Spawn(e));
            }
        };

        inner.sink = Some(sink);
        inner.playback = Some(playback);
        inner.state = SessionState::Streaming;

        tracing::info!(
            session = %self.id,
            sample_rate = format.sample_rate,
            channels = format.channels,
            "Streaming started"
        );
        Ok(true)
    }

    /// Queue decoded audio for playback
    ///
    /// Dropped silently (returns `false`) unless the session is streaming.
    pub fn ingest(&self, chunk: Bytes) -> bool {
        let inner = self.lock();
        if inner.state != SessionState::Streaming {
            return false;
        }
        self.queue.push(chunk)
    }

    /// Drop queued audio and whatever the sink has buffered
    ///
    /// Returns the number of queued chunks discarded.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Closed` after teardown.
    pub fn flush(&self) -> Result<usize, SessionError> {
        let inner = self.open()?;
        // The sink epoch moves while the queue is locked; see `run_playback`
        let discarded = match &inner.sink {
            Some(sink) => self.queue.clear_with(|| sink.flush()),
            None => self.queue.clear(),
        };
        tracing::debug!(session = %self.id, discarded, "Flushed");
        Ok(discarded)
    }

    /// Store a new volume; returns the clamped value
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Closed` after teardown.
    pub fn set_volume(&self, db: f32) -> Result<f32, SessionError> {
        let mut inner = self.open()?;
        inner.volume_db = clamp_db(db);
        Ok(inner.volume_db)
    }

    /// Store metadata from `SET_PARAMETER`
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Closed` after teardown.
    pub fn set_metadata(&self, raw: Bytes, track: Option<TrackMetadata>) -> Result<(), SessionError> {
        let mut inner = self.open()?;
        inner.metadata = Some(raw);
        if track.is_some() {
            inner.track = track;
        }
        Ok(())
    }

    /// Store cover art from `SET_PARAMETER`
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Closed` after teardown.
    pub fn set_artwork(&self, artwork: Artwork) -> Result<(), SessionError> {
        self.open()?.artwork = Some(artwork);
        Ok(())
    }

    /// Tear the session down
    ///
    /// Closes the queue and the sink, stops the RTP task and joins the
    /// playback thread. Returns `false` if the session was already closed.
    pub fn close(&self) -> bool {
        let (sink, playback) = {
            let mut inner = self.lock();
            if inner.state == SessionState::Closed {
                return false;
            }
            inner.state = SessionState::Closed;
            self.queue.close();
            (inner.sink.take(), inner.playback.take())
        };

        self.cancel.cancel();
        if let Some(sink) = sink {
            sink.close();
        }
        if let Some(handle) = playback {
            match handle.join() {
                Ok(stats) => tracing::debug!(
                    session = %self.id,
                    chunks = stats.chunks_played,
                    "Playback thread joined"
                ),
                Err(_) => tracing::error!(session = %self.id, "Playback thread panicked"),
            }
        }

        tracing::info!(session = %self.id, "Session closed");
        true
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("state", &inner.state)
            .field("format", &inner.format)
            .field("volume_db", &inner.volume_db)
            .field("audio_port", &inner.audio_port)
            .finish_non_exhaustive()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}

fn transition(inner: &mut SessionInner, to: SessionState) -> Result<(), SessionError> {
    if !inner.state.can_transition_to(to) {
        return Err(SessionError::InvalidTransition {
            from: inner.state,
            to,
        });
    }
    inner.state = to;
    Ok(())
}
