//! RTSP request handlers for the receiver
//!
//! One function per method. Each takes the decoded request, the state of
//! the connection it arrived on and the shared engine context, and returns
//! the response to write. Session ownership is per connection: the id a
//! connection got from SETUP is the only session its requests touch.

use super::announce_handler::process_announce;
use super::context::ReceiverContext;
use super::events::ReceiverEvent;
use super::session::{Session, SessionState};
use super::set_parameter_handler::{ParameterUpdate, process_set_parameter};
use crate::audio::AudioFormat;
use crate::protocol::rtsp::headers::{names, raop};
use crate::protocol::rtsp::{Method, ResponseBuilder, RtspRequest, RtspResponse, StatusCode};
use std::net::SocketAddr;
use std::sync::Arc;

/// Value of the jack status headers
const JACK_STATUS: &str = "connected; type=analog";

/// Per-connection protocol state
#[derive(Debug, Clone)]
pub struct ConnectionContext {
    /// Remote address
    pub peer: SocketAddr,
    /// Session created by SETUP on this connection
    pub session_id: Option<String>,
    /// Format from an ANNOUNCE that arrived before SETUP
    pub pending_format: Option<AudioFormat>,
}

impl ConnectionContext {
    /// Fresh state for a new connection
    #[must_use]
    pub fn new(peer: SocketAddr) -> Self {
        Self {
            peer,
            session_id: None,
            pending_format: None,
        }
    }
}

/// Result of handling an RTSP request
#[derive(Debug)]
pub struct HandleResult {
    /// Response to send back
    pub response: RtspResponse,
    /// Session state after the request, if it changed
    pub new_state: Option<SessionState>,
}

impl HandleResult {
    fn respond(response: RtspResponse) -> Self {
        Self {
            response,
            new_state: None,
        }
    }

    fn transition(response: RtspResponse, state: SessionState) -> Self {
        Self {
            response,
            new_state: Some(state),
        }
    }
}

/// Handle an incoming RTSP request
///
/// Must run inside a Tokio runtime: SETUP spawns the session's RTP task.
pub fn handle_request(
    request: &RtspRequest,
    conn: &mut ConnectionContext,
    ctx: &ReceiverContext,
) -> HandleResult {
    tracing::debug!(
        peer = %conn.peer,
        method = %request.method,
        uri = %request.uri,
        cseq = request.headers.cseq().unwrap_or("-"),
        "RTSP request"
    );

    match &request.method {
        Method::Options => handle_options(request, ctx),
        Method::Announce => handle_announce(request, conn, ctx),
        Method::Setup => handle_setup(request, conn, ctx),
        Method::Record => handle_record(request, conn, ctx),
        Method::SetParameter => handle_set_parameter(request, conn, ctx),
        Method::Flush => handle_flush(request, conn, ctx),
        Method::Teardown => handle_teardown(request, conn, ctx),
        Method::GetParameter => HandleResult::respond(ok(request, ctx).build()),
        Method::Other(name) => {
            tracing::debug!(peer = %conn.peer, method = %name, "Unsupported method");
            error_result(request, ctx, StatusCode::NOT_IMPLEMENTED)
        }
    }
}

fn ok(request: &RtspRequest, ctx: &ReceiverContext) -> ResponseBuilder {
    ResponseBuilder::ok()
        .cseq(request.headers.cseq())
        .server(&ctx.config.server_name)
}

fn error_result(request: &RtspRequest, ctx: &ReceiverContext, status: StatusCode) -> HandleResult {
    HandleResult::respond(
        ResponseBuilder::error(status)
            .cseq(request.headers.cseq())
            .server(&ctx.config.server_name)
            .build(),
    )
}

/// The connection's session, clearing a stale id
fn connection_session(conn: &mut ConnectionContext, ctx: &ReceiverContext) -> Option<Arc<Session>> {
    let id = conn.session_id.as_deref()?;
    let session = ctx.registry.get(id);
    if session.is_none() {
        tracing::debug!(peer = %conn.peer, session = %id, "Dropping stale session id");
        conn.session_id = None;
    }
    session
}

fn handle_options(request: &RtspRequest, ctx: &ReceiverContext) -> HandleResult {
    let response = ok(request, ctx)
        .header(names::PUBLIC, &Method::PUBLIC.join(", "))
        .header(raop::APPLE_JACK_STATUS, JACK_STATUS)
        .build();
    HandleResult::respond(response)
}

fn handle_announce(
    request: &RtspRequest,
    conn: &mut ConnectionContext,
    ctx: &ReceiverContext,
) -> HandleResult {
    let format = match process_announce(request) {
        Ok(format) => format,
        Err(e) => {
            tracing::debug!(peer = %conn.peer, error = %e, "Rejecting ANNOUNCE");
            return error_result(request, ctx, StatusCode::BAD_REQUEST);
        }
    };

    let Some(format) = format else {
        tracing::debug!(peer = %conn.peer, "ANNOUNCE without rtpmap");
        return HandleResult::respond(ok(request, ctx).build());
    };

    tracing::info!(peer = %conn.peer, format = %format, "Stream announced");

    let session_id = match connection_session(conn, ctx) {
        Some(session) => match session.set_format(format.clone()) {
            Ok(()) => Some(session.id().to_string()),
            Err(e) => {
                tracing::debug!(session = %session.id(), error = %e, "Format not applied");
                None
            }
        },
        None => None,
    };
    conn.pending_format = Some(format.clone());

    ctx.emit(ReceiverEvent::FormatAnnounced { session_id, format });
    HandleResult::respond(ok(request, ctx).build())
}

fn handle_setup(
    request: &RtspRequest,
    conn: &mut ConnectionContext,
    ctx: &ReceiverContext,
) -> HandleResult {
    let Some(transport) = request.headers.get(names::TRANSPORT) else {
        return error_result(request, ctx, StatusCode::BAD_REQUEST);
    };

    let (session, created) = match connection_session(conn, ctx) {
        Some(session) => (session, false),
        None => {
            let session = ctx.registry.create();
            if let Some(format) = conn.pending_format.clone() {
                // Fresh session, cannot be closed yet
                let _ = session.set_format(format);
            }
            if let Err(e) = session.arm() {
                tracing::error!(session = %session.id(), error = %e, "Failed to arm session");
            }
            conn.session_id = Some(session.id().to_string());
            (session, true)
        }
    };

    let port = match ctx.open_audio_channel(&session) {
        Ok(port) => port,
        Err(e) => {
            tracing::error!(session = %session.id(), error = %e, "Failed to bind audio port");
            if created {
                ctx.registry.teardown(session.id());
                conn.session_id = None;
            }
            return error_result(request, ctx, StatusCode::INTERNAL_ERROR);
        }
    };

    if created {
        tracing::info!(peer = %conn.peer, session = %session.id(), port, "Session created");
        ctx.emit(ReceiverEvent::SessionCreated {
            session_id: session.id().to_string(),
            audio_port: port,
        });
    }

    let response = ok(request, ctx)
        .header(names::TRANSPORT, &format!("{transport};server_port={port}"))
        .session(session.id())
        .header(raop::AUDIO_JACK_STATUS, JACK_STATUS)
        .build();

    if created {
        HandleResult::transition(response, SessionState::Armed)
    } else {
        HandleResult::respond(response)
    }
}

fn handle_record(
    request: &RtspRequest,
    conn: &mut ConnectionContext,
    ctx: &ReceiverContext,
) -> HandleResult {
    let Some(session) = connection_session(conn, ctx) else {
        return error_result(request, ctx, StatusCode::BAD_REQUEST);
    };

    match session.start_streaming(ctx.backend.as_ref(), ctx.config.sink_periods) {
        Ok(started) => {
            let response = ok(request, ctx)
                .audio_latency(ctx.config.audio_latency)
                .build();
            if started {
                ctx.emit(ReceiverEvent::PlaybackStarted {
                    session_id: session.id().to_string(),
                });
                HandleResult::transition(response, SessionState::Streaming)
            } else {
                HandleResult::respond(response)
            }
        }
        Err(e) => {
            tracing::error!(session = %session.id(), error = %e, "RECORD failed");
            error_result(request, ctx, StatusCode::INTERNAL_ERROR)
        }
    }
}

fn handle_set_parameter(
    request: &RtspRequest,
    conn: &mut ConnectionContext,
    ctx: &ReceiverContext,
) -> HandleResult {
    let response = HandleResult::respond(ok(request, ctx).build());

    let Some(update) = process_set_parameter(request) else {
        return response;
    };
    let Some(session) = connection_session(conn, ctx) else {
        tracing::debug!(peer = %conn.peer, "SET_PARAMETER without session ignored");
        return response;
    };

    let applied = match update {
        ParameterUpdate::Volume(volume) => ctx.apply_volume(&session, volume.db).map(|_| ()),
        ParameterUpdate::Artwork(artwork) => session.set_artwork(artwork.clone()).map(|()| {
            ctx.emit(ReceiverEvent::ArtworkUpdated {
                session_id: session.id().to_string(),
                artwork,
            });
        }),
        ParameterUpdate::Metadata { raw, track } => {
            session.set_metadata(raw, track.clone()).map(|()| {
                if let Some(metadata) = track {
                    ctx.emit(ReceiverEvent::MetadataUpdated {
                        session_id: session.id().to_string(),
                        metadata,
                    });
                }
            })
        }
    };

    if let Err(e) = applied {
        tracing::debug!(session = %session.id(), error = %e, "Parameter not applied");
    }
    response
}

fn handle_flush(
    request: &RtspRequest,
    conn: &mut ConnectionContext,
    ctx: &ReceiverContext,
) -> HandleResult {
    let Some(session) = connection_session(conn, ctx) else {
        return error_result(request, ctx, StatusCode::BAD_REQUEST);
    };

    match session.flush() {
        Ok(discarded) => {
            ctx.emit(ReceiverEvent::PlaybackFlushed {
                session_id: session.id().to_string(),
                discarded,
            });
            HandleResult::respond(ok(request, ctx).build())
        }
        Err(e) => {
            tracing::debug!(session = %session.id(), error = %e, "FLUSH on closed session");
            error_result(request, ctx, StatusCode::BAD_REQUEST)
        }
    }
}

fn handle_teardown(
    request: &RtspRequest,
    conn: &mut ConnectionContext,
    ctx: &ReceiverContext,
) -> HandleResult {
    let Some(id) = conn.session_id.take() else {
        return error_result(request, ctx, StatusCode::BAD_REQUEST);
    };

    if !ctx.teardown_session(&id) {
        return error_result(request, ctx, StatusCode::BAD_REQUEST);
    }

    tracing::info!(peer = %conn.peer, session = %id, "Session torn down");
    HandleResult::transition(ok(request, ctx).build(), SessionState::Closed)
}
