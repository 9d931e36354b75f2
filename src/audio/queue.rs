//! Per-session ingestion queue
//!
//! Unbounded FIFO of PCM chunks. The playback thread blocks in `pop` until a
//! chunk arrives or the queue is closed.

use bytes::Bytes;
use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

#[derive(Default)]
struct QueueState {
    chunks: VecDeque<Bytes>,
    closed: bool,
}

/// Blocking FIFO of audio chunks
#[derive(Default)]
pub struct IngestionQueue {
    state: Mutex<QueueState>,
    ready: Condvar,
}

impl IngestionQueue {
    /// Create an empty queue
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a chunk; returns `false` if the queue is closed
    pub fn push(&self, chunk: Bytes) -> bool {
        let mut state = self.lock();
        if state.closed {
            return false;
        }
        state.chunks.push_back(chunk);
        drop(state);
        self.ready.notify_one();
        true
    }

    /// Remove the oldest chunk, blocking until one is available
    ///
    /// Returns `None` once the queue is closed.
    pub fn pop(&self) -> Option<Bytes> {
        self.pop_with(|| ()).map(|(chunk, ())| chunk)
    }

    /// Like [`pop`](Self::pop), and also runs `ticket` while the queue is
    /// still locked
    ///
    /// Paired with [`clear_with`](Self::clear_with), nothing can clear the
    /// queue between taking the chunk and computing its ticket.
    pub fn pop_with<T>(&self, ticket: impl FnOnce() -> T) -> Option<(Bytes, T)> {
        let mut state = self.lock();
        loop {
            if state.closed {
                return None;
            }
            if let Some(chunk) = state.chunks.pop_front() {
                return Some((chunk, ticket()));
            }
            state = self
                .ready
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Remove the oldest chunk without blocking
    pub fn try_pop(&self) -> Option<Bytes> {
        self.lock().chunks.pop_front()
    }

    /// Drop every queued chunk, returning how many were removed
    pub fn clear(&self) -> usize {
        self.clear_with(|| ())
    }

    /// Drop every queued chunk and run `then` before releasing the queue
    pub fn clear_with(&self, then: impl FnOnce()) -> usize {
        let mut state = self.lock();
        let removed = state.chunks.len();
        state.chunks.clear();
        then();
        removed
    }

    /// Close the queue, discarding its contents and waking the consumer
    pub fn close(&self) {
        let mut state = self.lock();
        state.closed = true;
        state.chunks.clear();
        drop(state);
        self.ready.notify_all();
    }

    /// Whether the queue has been closed
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Number of queued chunks
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().chunks.len()
    }

    /// Whether no chunks are queued
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
