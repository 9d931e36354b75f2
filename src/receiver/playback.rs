//! Per-session playback loop
//!
//! One OS thread per streaming session moves chunks from the ingestion
//! queue into the sink in FIFO order. Blocking on both ends keeps the
//! thread idle when no audio arrives.

use crate::audio::{AudioSink, IngestionQueue, SinkError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Counters reported when the loop exits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaybackStats {
    /// Chunks handed to the sink successfully
    pub chunks_played: u64,
    /// Bytes handed to the sink successfully
    pub bytes_played: u64,
    /// Writes that failed with something other than `Closed`
    pub write_errors: u64,
}

/// Drain `queue` into `sink` until the queue or the sink is closed
///
/// Each chunk is written against the sink's flush epoch read when it left
/// the queue, so a flush landing between pop and write still drops it.
pub fn run_playback(queue: &IngestionQueue, sink: &dyn AudioSink) -> PlaybackStats {
    let mut stats = PlaybackStats::default();

    while let Some((chunk, epoch)) = queue.pop_with(|| sink.flush_epoch()) {
        match sink.write_at(&chunk, epoch) {
            Ok(()) => {
                stats.chunks_played += 1;
                stats.bytes_played += chunk.len() as u64;
            }
            Err(SinkError::Closed) => break,
            Err(e) => {
                stats.write_errors += 1;
                tracing::warn!(error = %e, "Audio write failed, dropping chunk");
            }
        }
    }

    stats
}

/// Start the playback thread for a session
pub(crate) fn spawn_playback(
    session_id: &str,
    queue: Arc<IngestionQueue>,
    sink: Arc<dyn AudioSink>,
) -> std::io::Result<JoinHandle<PlaybackStats>> {
    let id = session_id.to_string();
    thread::Builder::new()
        .name(format!("playback-{session_id}"))
        .spawn(move || {
            tracing::debug!(session = %id, "Playback loop started");
            let stats = run_playback(&queue, sink.as_ref());
            tracing::debug!(
                session = %id,
                chunks = stats.chunks_played,
                bytes = stats.bytes_played,
                errors = stats.write_errors,
                "Playback loop finished"
            );
            stats
        })
}
