use crate::audio::{AudioBackend, AudioSink, IngestionQueue, SinkError, SinkFormat};
use crate::receiver::playback::run_playback;
use crate::testing::RecordingBackend;
use bytes::Bytes;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(5);

#[test]
fn test_flush_between_ingests_plays_only_later_chunk() {
    let backend = RecordingBackend::new();
    let sink = backend.open_sink(SinkFormat::default(), 4).unwrap();
    let queue = Arc::new(IngestionQueue::new());

    for chunk in [b"A", b"B", b"C"] {
        queue.push(Bytes::from_static(chunk));
    }
    assert_eq!(queue.clear(), 3);
    queue.push(Bytes::from_static(b"D"));

    let player = {
        let queue = queue.clone();
        let sink = sink.clone();
        thread::spawn(move || run_playback(&queue, sink.as_ref()))
    };

    let recorded = backend.last_sink().unwrap();
    assert!(recorded.wait_for_chunks(1, WAIT));
    queue.close();

    let stats = player.join().unwrap();
    assert_eq!(stats.chunks_played, 1);
    assert_eq!(stats.bytes_played, 1);
    assert_eq!(recorded.chunks(), vec![b"D".to_vec()]);
}

#[test]
fn test_loop_exits_when_sink_closed() {
    let backend = RecordingBackend::new();
    let sink = backend.open_sink(SinkFormat::default(), 4).unwrap();
    let queue = IngestionQueue::new();
    queue.push(Bytes::from_static(b"never"));
    queue.push(Bytes::from_static(b"again"));
    sink.close();

    let stats = run_playback(&queue, sink.as_ref());
    assert_eq!(stats.chunks_played, 0);
    assert_eq!(queue.len(), 1);
    assert_eq!(backend.last_sink().unwrap().rejected_writes(), 1);
}

#[test]
fn test_loop_exits_when_queue_closed() {
    let backend = RecordingBackend::new();
    let sink = backend.open_sink(SinkFormat::default(), 4).unwrap();
    let queue = IngestionQueue::new();
    queue.close();

    assert_eq!(run_playback(&queue, sink.as_ref()).chunks_played, 0);
}

struct FlakySink {
    calls: Mutex<u32>,
}

impl AudioSink for FlakySink {
    fn write(&self, _chunk: &[u8]) -> Result<(), SinkError> {
        let mut calls = self.calls.lock().unwrap();
        *calls += 1;
        match *calls {
            1 => Err(SinkError::StreamError("underrun".into())),
            2 => Ok(()),
            _ => Err(SinkError::Closed),
        }
    }
    fn flush(&self) {}
    fn close(&self) {}
    fn is_closed(&self) -> bool {
        false
    }
}

#[test]
fn test_write_errors_do_not_stop_the_loop() {
    let sink = FlakySink {
        calls: Mutex::new(0),
    };
    let queue = IngestionQueue::new();
    queue.push(Bytes::from_static(b"12"));
    queue.push(Bytes::from_static(b"34"));
    queue.push(Bytes::from_static(b"56"));

    let stats = run_playback(&queue, &sink);
    assert_eq!(stats.write_errors, 1);
    assert_eq!(stats.chunks_played, 1);
    assert_eq!(stats.bytes_played, 2);
}

/// Parks every write at entry until the test resumes it
struct EntryStallSink {
    epoch: AtomicU64,
    entered: mpsc::Sender<()>,
    resume: Mutex<mpsc::Receiver<()>>,
    played: Mutex<Vec<Vec<u8>>>,
}

impl AudioSink for EntryStallSink {
    fn write(&self, chunk: &[u8]) -> Result<(), SinkError> {
        self.write_at(chunk, self.flush_epoch())
    }
    fn flush_epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }
    fn write_at(&self, chunk: &[u8], epoch: u64) -> Result<(), SinkError> {
        let _ = self.entered.send(());
        let _ = self.resume.lock().unwrap().recv();
        if epoch == self.flush_epoch() {
            self.played.lock().unwrap().push(chunk.to_vec());
        }
        Ok(())
    }
    fn flush(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
    }
    fn close(&self) {}
    fn is_closed(&self) -> bool {
        false
    }
}

#[test]
fn test_flush_between_pop_and_write_drops_the_chunk() {
    let (entered_tx, entered) = mpsc::channel();
    let (resume, resume_rx) = mpsc::channel();
    let sink = Arc::new(EntryStallSink {
        epoch: AtomicU64::new(0),
        entered: entered_tx,
        resume: Mutex::new(resume_rx),
        played: Mutex::new(Vec::new()),
    });
    let queue = Arc::new(IngestionQueue::new());
    queue.push(Bytes::from_static(b"A"));

    let player = {
        let queue = queue.clone();
        let sink = sink.clone();
        thread::spawn(move || run_playback(&queue, sink.as_ref()))
    };

    // A has left the queue but its write has not started
    entered.recv_timeout(WAIT).unwrap();
    assert_eq!(queue.clear_with(|| sink.flush()), 0);
    queue.push(Bytes::from_static(b"B"));
    resume.send(()).unwrap();

    entered.recv_timeout(WAIT).unwrap();
    resume.send(()).unwrap();
    queue.close();
    player.join().unwrap();

    assert_eq!(*sink.played.lock().unwrap(), vec![b"B".to_vec()]);
}
