use crate::audio::buffer::PlaybackBuffer;
use crate::audio::sink::SinkError;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[test]
fn test_write_then_read() {
    let buffer = PlaybackBuffer::new(16);
    buffer.write(&[1, 2, 3, 4]).unwrap();
    assert_eq!(buffer.available(), 4);

    let mut out = [0u8; 8];
    let n = buffer.read_into(&mut out);
    assert_eq!(n, 4);
    assert_eq!(&out[..4], &[1, 2, 3, 4]);
    assert_eq!(buffer.available(), 0);
}

#[test]
fn test_write_blocks_until_space() {
    let buffer = Arc::new(PlaybackBuffer::new(4));
    let writer = {
        let buffer = buffer.clone();
        thread::spawn(move || buffer.write(&[1, 2, 3, 4, 5, 6]))
    };

    // Drain until the writer has pushed everything
    let mut collected = Vec::new();
    while collected.len() < 6 {
        let mut out = [0u8; 2];
        let n = buffer.read_into(&mut out);
        collected.extend_from_slice(&out[..n]);
        thread::sleep(Duration::from_millis(1));
    }

    writer.join().unwrap().unwrap();
    assert_eq!(collected, vec![1, 2, 3, 4, 5, 6]);
}

#[test]
fn test_close_unblocks_writer() {
    let buffer = Arc::new(PlaybackBuffer::new(2));
    let writer = {
        let buffer = buffer.clone();
        thread::spawn(move || buffer.write(&[0; 64]))
    };

    thread::sleep(Duration::from_millis(20));
    buffer.close();

    assert!(matches!(writer.join().unwrap(), Err(SinkError::Closed)));
    assert!(buffer.is_closed());
    assert!(matches!(buffer.write(&[1]), Err(SinkError::Closed)));
}

#[test]
fn test_flush_releases_blocked_writer() {
    let buffer = Arc::new(PlaybackBuffer::new(2));
    let writer = {
        let buffer = buffer.clone();
        thread::spawn(move || buffer.write(&[9; 64]))
    };

    thread::sleep(Duration::from_millis(20));
    buffer.flush();

    writer.join().unwrap().unwrap();
    assert_eq!(buffer.available(), 0);
    assert!(!buffer.is_closed());

    buffer.write(&[7]).unwrap();
    assert_eq!(buffer.available(), 1);
}

#[test]
fn test_zero_capacity_is_raised_to_one() {
    let buffer = PlaybackBuffer::new(0);
    assert_eq!(buffer.capacity(), 1);
}

#[test]
fn test_write_at_stale_epoch_is_dropped() {
    let buffer = PlaybackBuffer::new(16);
    let epoch = buffer.epoch();
    buffer.flush();

    buffer.write_at(&[1, 2], epoch).unwrap();
    assert_eq!(buffer.available(), 0);

    buffer.write_at(&[3], buffer.epoch()).unwrap();
    assert_eq!(buffer.available(), 1);
}
