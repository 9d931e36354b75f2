//! RAOP receiver engine
//!
//! Owns the control listener. Each accepted connection gets its own task
//! that decodes requests, dispatches them and writes responses one at a
//! time.

use super::config::ReceiverConfig;
use super::context::ReceiverContext;
use super::events::ReceiverEvent;
use super::rtsp_handler::{ConnectionContext, handle_request};
use super::session_registry::SessionRegistry;
use crate::audio::AudioBackend;
use crate::protocol::rtsp::{ParseError, RtspServerCodec, encode_response};
use bytes::Bytes;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{RwLock, broadcast};
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;

/// Size of the per-connection read buffer
const READ_BUFFER_SIZE: usize = 4096;

/// RAOP audio receiver
pub struct RaopReceiver {
    config: ReceiverConfig,
    backend: Arc<dyn AudioBackend>,
    state: Arc<RwLock<ReceiverState>>,
    event_tx: broadcast::Sender<ReceiverEvent>,
    running: Option<RunningServer>,
}

struct RunningServer {
    context: Arc<ReceiverContext>,
    accept_task: JoinHandle<()>,
    local_addr: SocketAddr,
    original_gain: f32,
}

/// Receiver state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiverState {
    /// Receiver is stopped
    Stopped,
    /// Receiver is starting
    Starting,
    /// Receiver is running and accepting connections
    Running,
    /// Receiver is stopping
    Stopping,
}

impl RaopReceiver {
    /// Create a receiver playing through `backend`
    #[must_use]
    pub fn new(config: ReceiverConfig, backend: Arc<dyn AudioBackend>) -> Self {
        let (event_tx, _) = broadcast::channel(64);

        Self {
            config,
            backend,
            state: Arc::new(RwLock::new(ReceiverState::Stopped)),
            event_tx,
            running: None,
        }
    }

    /// Subscribe to events
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ReceiverEvent> {
        self.event_tx.subscribe()
    }

    /// Get current state
    pub async fn state(&self) -> ReceiverState {
        *self.state.read().await
    }

    /// Engine configuration
    #[must_use]
    pub fn config(&self) -> &ReceiverConfig {
        &self.config
    }

    /// Bound control address while running
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.running.as_ref().map(|r| r.local_addr)
    }

    /// Live session registry while running
    #[must_use]
    pub fn registry(&self) -> Option<Arc<SessionRegistry>> {
        self.running.as_ref().map(|r| r.context.registry.clone())
    }

    /// Feed decoded audio to a session
    ///
    /// Returns `false` if the receiver is stopped or the session is unknown
    /// or not streaming.
    pub fn ingest(&self, session_id: &str, chunk: Bytes) -> bool {
        self.running
            .as_ref()
            .is_some_and(|r| r.context.registry.ingest(session_id, chunk))
    }

    /// Start the receiver
    ///
    /// Returns the bound control address.
    ///
    /// # Errors
    ///
    /// Returns `ReceiverError::Bind` if the control port cannot be bound and
    /// `ReceiverError::AlreadyRunning` if called twice.
    pub async fn start(&mut self) -> Result<SocketAddr, ReceiverError> {
        {
            let mut state = self.state.write().await;
            if *state != ReceiverState::Stopped {
                return Err(ReceiverError::AlreadyRunning);
            }
            *state = ReceiverState::Starting;
        }

        let addr = SocketAddr::new(self.config.bind_addr, self.config.port);
        let (listener, local_addr) = match bind_listener(addr).await {
            Ok(bound) => bound,
            Err(e) => {
                *self.state.write().await = ReceiverState::Stopped;
                return Err(e);
            }
        };

        let original_gain = self.backend.output_gain();
        let context = Arc::new(ReceiverContext::new(
            self.config.clone(),
            self.backend.clone(),
            self.event_tx.clone(),
            CancellationToken::new(),
        ));

        let accept_task = tokio::spawn(accept_loop(listener, context.clone()));

        self.running = Some(RunningServer {
            context,
            accept_task,
            local_addr,
            original_gain,
        });
        *self.state.write().await = ReceiverState::Running;

        tracing::info!(name = %self.config.name, addr = %local_addr, "RAOP receiver started");
        let _ = self.event_tx.send(ReceiverEvent::Started {
            name: self.config.name.clone(),
            port: local_addr.port(),
        });

        Ok(local_addr)
    }

    /// Stop the receiver
    ///
    /// Stops accepting, closes every connection, tears down every session
    /// and restores the output volume captured at start. Idempotent.
    ///
    /// # Errors
    ///
    /// Currently always succeeds; the `Result` mirrors `start`.
    pub async fn stop(&mut self) -> Result<(), ReceiverError> {
        let Some(running) = self.running.take() else {
            return Ok(());
        };
        *self.state.write().await = ReceiverState::Stopping;

        running.context.shutdown.cancel();
        if let Err(e) = running.accept_task.await {
            tracing::error!(error = %e, "Accept loop ended abnormally");
        }

        let closed = running.context.registry.shutdown();
        if let Err(e) = self.backend.set_output_gain(running.original_gain) {
            tracing::warn!(error = %e, "Failed to restore output volume");
        }

        *self.state.write().await = ReceiverState::Stopped;
        tracing::info!(sessions_closed = closed, "RAOP receiver stopped");
        let _ = self.event_tx.send(ReceiverEvent::Stopped);
        Ok(())
    }
}

impl Drop for RaopReceiver {
    fn drop(&mut self) {
        if let Some(running) = self.running.take() {
            running.context.shutdown.cancel();
            running.context.registry.shutdown();
            let _ = self.backend.set_output_gain(running.original_gain);
        }
    }
}

async fn bind_listener(addr: SocketAddr) -> Result<(TcpListener, SocketAddr), ReceiverError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ReceiverError::Bind { addr, source })?;
    let local_addr = listener.local_addr()?;
    Ok((listener, local_addr))
}

async fn accept_loop(listener: TcpListener, ctx: Arc<ReceiverContext>) {
    let mut connections = JoinSet::new();

    loop {
        tokio::select! {
            () = ctx.shutdown.cancelled() => break,
            result = listener.accept() => match result {
                Ok((stream, addr)) => {
                    let ctx = ctx.clone();
                    connections.spawn(async move {
                        if let Err(e) = handle_connection(stream, addr, &ctx).await {
                            tracing::warn!(peer = %addr, error = %e, "Connection error");
                        }
                    });
                }
                Err(e) => tracing::warn!(error = %e, "Accept error"),
            },
            Some(result) = connections.join_next(), if !connections.is_empty() => {
                if let Err(e) = result {
                    tracing::error!(error = %e, "Connection task ended abnormally");
                }
            }
        }
    }

    drop(listener);
    while let Some(result) = connections.join_next().await {
        if let Err(e) = result {
            tracing::error!(error = %e, "Connection task ended abnormally");
        }
    }
}

/// Handle a single client connection
async fn handle_connection(
    mut stream: TcpStream,
    addr: SocketAddr,
    ctx: &ReceiverContext,
) -> Result<(), ReceiverError> {
    tracing::debug!(peer = %addr, "Client connected");
    ctx.emit(ReceiverEvent::ClientConnected { address: addr });

    let mut conn = ConnectionContext::new(addr);
    let mut codec = RtspServerCodec::new();
    let mut buf = vec![0u8; READ_BUFFER_SIZE];

    let result = loop {
        let n = tokio::select! {
            () = ctx.shutdown.cancelled() => break Ok("Receiver stopped"),
            result = stream.read(&mut buf) => match result {
                Ok(0) => break Ok("Connection closed"),
                Ok(n) => n,
                Err(e) => break Err(ReceiverError::Io(e)),
            },
        };

        codec.feed(&buf[..n]);
        if let Err(e) = serve_buffered(&mut stream, &mut codec, &mut conn, ctx).await {
            break Err(e);
        }
    };

    if let Some(id) = conn.session_id.take() {
        tracing::debug!(peer = %addr, session = %id, "Closing session of departed client");
        ctx.teardown_session(&id);
    }
    let _ = stream.shutdown().await;

    let reason = match &result {
        Ok(reason) => (*reason).to_string(),
        Err(e) => e.to_string(),
    };
    tracing::debug!(peer = %addr, reason = %reason, "Client disconnected");
    ctx.emit(ReceiverEvent::ClientDisconnected {
        address: addr,
        reason,
    });

    result.map(|_| ())
}

/// Answer every complete request in the codec buffer, in order
async fn serve_buffered(
    stream: &mut TcpStream,
    codec: &mut RtspServerCodec,
    conn: &mut ConnectionContext,
    ctx: &ReceiverContext,
) -> Result<(), ReceiverError> {
    while let Some(request) = codec.decode()? {
        let result = handle_request(&request, conn, ctx);
        stream.write_all(&encode_response(&result.response)).await?;

        if let Some(state) = result.new_state {
            tracing::debug!(peer = %conn.peer, state = ?state, "Session state changed");
        }
    }
    Ok(())
}

/// Receiver errors
#[derive(Debug, thiserror::Error)]
pub enum ReceiverError {
    /// Receiver already running
    #[error("Receiver already running")]
    AlreadyRunning,

    /// Control port could not be bound
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        /// Requested address
        addr: SocketAddr,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Client sent a request the codec cannot frame
    #[error("Protocol error: {0}")]
    Protocol(#[from] ParseError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
