//! Bounded PCM byte buffer between a session's playback thread and the
//! device callback

use super::sink::SinkError;
use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

struct BufferState {
    data: VecDeque<u8>,
    closed: bool,
    /// Bumped by every flush so a blocked writer can abandon its chunk
    flush_epoch: u64,
}

/// Bounded byte FIFO with a blocking producer side
///
/// The producer (`write`) blocks while the buffer is full. The consumer
/// (`read_into`) never blocks, so it can run inside a device callback.
pub struct PlaybackBuffer {
    state: Mutex<BufferState>,
    space: Condvar,
    capacity: usize,
}

impl PlaybackBuffer {
    /// Create a buffer holding at most `capacity` bytes
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(BufferState {
                data: VecDeque::with_capacity(capacity),
                closed: false,
                flush_epoch: 0,
            }),
            space: Condvar::new(),
            capacity: capacity.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BufferState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Buffer capacity in bytes
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes waiting to be played
    #[must_use]
    pub fn available(&self) -> usize {
        self.lock().data.len()
    }

    /// Append `bytes`, blocking while the buffer is full
    ///
    /// Returns early without error if the buffer is flushed while waiting;
    /// the rest of the chunk is dropped along with the flushed audio.
    ///
    /// # Errors
    ///
    /// Returns `SinkError::Closed` if the buffer is or becomes closed.
    pub fn write(&self, bytes: &[u8]) -> Result<(), SinkError> {
        let epoch = self.epoch();
        self.write_at(bytes, epoch)
    }

    /// Current flush epoch
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.lock().flush_epoch
    }

    /// Append `bytes` unless the buffer was flushed after `epoch` was read
    ///
    /// # Errors
    ///
    /// Returns `SinkError::Closed` if the buffer is or becomes closed.
    pub fn write_at(&self, mut bytes: &[u8], epoch: u64) -> Result<(), SinkError> {
        let mut state = self.lock();

        while !bytes.is_empty() {
            if state.closed {
                return Err(SinkError::Closed);
            }
            if state.flush_epoch != epoch {
                return Ok(());
            }

            let free = self.capacity - state.data.len();
            if free == 0 {
                state = self
                    .space
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner);
                continue;
            }

            let take = free.min(bytes.len());
            state.data.extend(&bytes[..take]);
            bytes = &bytes[take..];
        }

        if state.closed {
            return Err(SinkError::Closed);
        }
        Ok(())
    }

    /// Move up to `out.len()` bytes into `out`, returning how many were copied
    pub fn read_into(&self, out: &mut [u8]) -> usize {
        let mut state = self.lock();
        let count = out.len().min(state.data.len());
        for (dst, src) in out.iter_mut().zip(state.data.drain(..count)) {
            *dst = src;
        }
        drop(state);
        if count > 0 {
            self.space.notify_all();
        }
        count
    }

    /// Drop everything buffered and release any blocked writer
    pub fn flush(&self) {
        let mut state = self.lock();
        state.data.clear();
        state.flush_epoch = state.flush_epoch.wrapping_add(1);
        drop(state);
        self.space.notify_all();
    }

    /// Close the buffer; pending and future writes fail
    pub fn close(&self) {
        let mut state = self.lock();
        state.closed = true;
        state.data.clear();
        drop(state);
        self.space.notify_all();
    }

    /// Whether `close` has been called
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }
}
