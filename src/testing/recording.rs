//! In-memory audio backend that records everything written to it
//!
//! Sinks can be gated so writes block like a full device buffer, which lets
//! tests stage flush and teardown races deterministically.

use crate::audio::{AudioBackend, AudioSink, SinkError, SinkFormat};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Backend handing out [`RecordingSink`]s
#[derive(Default)]
pub struct RecordingBackend {
    gain: Mutex<Option<f32>>,
    gain_history: Mutex<Vec<f32>>,
    sinks: Mutex<Vec<Arc<RecordingSink>>>,
    fail_open: AtomicBool,
    hold_writes: AtomicBool,
}

impl RecordingBackend {
    /// Backend at full gain with ungated sinks
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Backend whose sinks block every write until [`release_writes`](Self::release_writes)
    #[must_use]
    pub fn gated() -> Arc<Self> {
        let backend = Self::default();
        backend.hold_writes.store(true, Ordering::SeqCst);
        Arc::new(backend)
    }

    /// Make `open_sink` fail until cleared
    pub fn set_fail_open(&self, fail: bool) {
        self.fail_open.store(fail, Ordering::SeqCst);
    }

    /// Open the gate on every sink, now and for sinks opened later
    pub fn release_writes(&self) {
        self.hold_writes.store(false, Ordering::SeqCst);
        for sink in lock(&self.sinks).iter() {
            sink.open_gate();
        }
    }

    /// Every sink opened so far
    #[must_use]
    pub fn sinks(&self) -> Vec<Arc<RecordingSink>> {
        lock(&self.sinks).clone()
    }

    /// Most recently opened sink
    #[must_use]
    pub fn last_sink(&self) -> Option<Arc<RecordingSink>> {
        lock(&self.sinks).last().cloned()
    }

    /// Wait until at least `count` sinks were opened
    #[must_use]
    pub fn wait_for_sinks(&self, count: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while lock(&self.sinks).len() < count {
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        true
    }

    /// Set the starting output gain
    pub fn preset_gain(&self, gain: f32) {
        *lock(&self.gain) = Some(gain);
    }

    /// Every gain passed to `set_output_gain`, in order
    #[must_use]
    pub fn gain_history(&self) -> Vec<f32> {
        lock(&self.gain_history).clone()
    }
}

impl AudioBackend for RecordingBackend {
    fn open_sink(&self, format: SinkFormat, periods: usize) -> Result<Arc<dyn AudioSink>, SinkError> {
        if self.fail_open.load(Ordering::SeqCst) {
            return Err(SinkError::DeviceError("injected open failure".into()));
        }

        let sink = Arc::new(RecordingSink::new(
            format,
            periods,
            !self.hold_writes.load(Ordering::SeqCst),
        ));
        lock(&self.sinks).push(sink.clone());
        Ok(sink)
    }

    fn output_gain(&self) -> f32 {
        lock(&self.gain).unwrap_or(1.0)
    }

    fn set_output_gain(&self, gain: f32) -> Result<(), SinkError> {
        *lock(&self.gain) = Some(gain);
        lock(&self.gain_history).push(gain);
        Ok(())
    }
}

#[derive(Default)]
struct SinkState {
    chunks: Vec<Vec<u8>>,
    closed: bool,
    gate_open: bool,
    pending: usize,
    flush_epoch: u64,
    flushes: usize,
    discarded_writes: usize,
    rejected_writes: usize,
    accepted_at_close: Option<usize>,
}

/// Sink that keeps every accepted chunk
pub struct RecordingSink {
    format: SinkFormat,
    periods: usize,
    state: Mutex<SinkState>,
    changed: Condvar,
}

impl RecordingSink {
    fn new(format: SinkFormat, periods: usize, gate_open: bool) -> Self {
        Self {
            format,
            periods,
            state: Mutex::new(SinkState {
                gate_open,
                ..SinkState::default()
            }),
            changed: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SinkState> {
        lock(&self.state)
    }

    /// Format the sink was opened with
    #[must_use]
    pub fn format(&self) -> SinkFormat {
        self.format
    }

    /// Buffer periods requested at open
    #[must_use]
    pub fn periods(&self) -> usize {
        self.periods
    }

    /// Accepted chunks, in order
    #[must_use]
    pub fn chunks(&self) -> Vec<Vec<u8>> {
        self.lock().chunks.clone()
    }

    /// Number of `flush` calls
    #[must_use]
    pub fn flush_count(&self) -> usize {
        self.lock().flushes
    }

    /// Writes dropped because a flush overtook them
    #[must_use]
    pub fn discarded_writes(&self) -> usize {
        self.lock().discarded_writes
    }

    /// Writes refused because the sink was closed
    #[must_use]
    pub fn rejected_writes(&self) -> usize {
        self.lock().rejected_writes
    }

    /// Accepted chunk count when `close` was first called
    #[must_use]
    pub fn accepted_at_close(&self) -> Option<usize> {
        self.lock().accepted_at_close
    }

    /// Let blocked and future writes through
    pub fn open_gate(&self) {
        self.lock().gate_open = true;
        self.changed.notify_all();
    }

    /// Wait until a write is blocked on the gate
    #[must_use]
    pub fn wait_for_pending_write(&self, timeout: Duration) -> bool {
        self.wait_until(timeout, |s| s.pending > 0)
    }

    /// Wait until at least `count` chunks were accepted
    #[must_use]
    pub fn wait_for_chunks(&self, count: usize, timeout: Duration) -> bool {
        self.wait_until(timeout, |s| s.chunks.len() >= count)
    }

    fn wait_until(&self, timeout: Duration, done: impl Fn(&SinkState) -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.lock();
        while !done(&state) {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            state = self
                .changed
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        true
    }
}

impl AudioSink for RecordingSink {
    fn write(&self, chunk: &[u8]) -> Result<(), SinkError> {
        let epoch = self.lock().flush_epoch;
        self.write_at(chunk, epoch)
    }

    fn flush_epoch(&self) -> u64 {
        self.lock().flush_epoch
    }

    fn write_at(&self, chunk: &[u8], epoch: u64) -> Result<(), SinkError> {
        let mut state = self.lock();
        if state.closed {
            state.rejected_writes += 1;
            return Err(SinkError::Closed);
        }
        if state.flush_epoch != epoch {
            state.discarded_writes += 1;
            return Ok(());
        }

        state.pending += 1;
        self.changed.notify_all();
        while !state.gate_open && !state.closed && state.flush_epoch == epoch {
            state = self
                .changed
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        state.pending -= 1;

        if state.closed {
            state.rejected_writes += 1;
            return Err(SinkError::Closed);
        }
        if state.flush_epoch != epoch {
            state.discarded_writes += 1;
            return Ok(());
        }

        state.chunks.push(chunk.to_vec());
        self.changed.notify_all();
        Ok(())
    }

    fn flush(&self) {
        let mut state = self.lock();
        state.flush_epoch += 1;
        state.flushes += 1;
        drop(state);
        self.changed.notify_all();
    }

    fn close(&self) {
        let mut state = self.lock();
        if !state.closed {
            state.closed = true;
            state.accepted_at_close = Some(state.chunks.len());
        }
        drop(state);
        self.changed.notify_all();
    }

    fn is_closed(&self) -> bool {
        self.lock().closed
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
