//! Blocking-contract tests over the software loopback
//!
//! These drive the public [`SerialLine`] operations through a
//! [`LoopbackLine`] pair, so the busy-polling loops are exercised exactly
//! as they run over a real device, without hardware.

use setu_serial::loopback::LoopbackLine;
use setu_serial::SerialLine;
use std::thread;
use std::time::{Duration, Instant};

#[test]
fn test_poll_byte_on_idle_line_is_bounded() {
    let (mut a, _b) = LoopbackLine::pair();
    let start = Instant::now();
    for _ in 0..1000 {
        assert_eq!(a.poll_byte(), None);
    }
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[test]
fn test_read_byte_waits_for_delayed_producer() {
    let (mut a, mut b) = LoopbackLine::pair();
    let producer = thread::spawn(move || {
        thread::sleep(Duration::from_millis(80));
        b.write_byte(0xC3);
    });

    let start = Instant::now();
    let byte = a.read_byte();
    assert_eq!(byte, 0xC3);
    assert!(start.elapsed() >= Duration::from_millis(60));
    producer.join().unwrap();
}

#[test]
fn test_read_exact_spans_fragmented_sends() {
    let (mut a, mut b) = LoopbackLine::pair();
    let producer = thread::spawn(move || {
        b.write_buffer(&[0x10, 0x20, 0x30]);
        thread::sleep(Duration::from_millis(20));
        b.write_buffer(&[0x40, 0x50]);
        thread::sleep(Duration::from_millis(20));
        b.write_byte(0x60);
    });

    let mut buf = [0u8; 6];
    a.read_exact(&mut buf);
    assert_eq!(buf, [0x10, 0x20, 0x30, 0x40, 0x50, 0x60]);
    producer.join().unwrap();
}

#[test]
fn test_round_trip_is_byte_exact_and_ordered() {
    let (mut a, mut b) = LoopbackLine::pair();

    b.write_buffer(&[0x41, 0x42, 0x43]);
    let mut buf = [0u8; 3];
    a.read_exact(&mut buf);
    assert_eq!(buf, [0x41, 0x42, 0x43]);

    // Reverse direction, one byte at a time
    for byte in [1u8, 2, 3, 4] {
        a.write_byte(byte);
    }
    let mut buf = [0u8; 4];
    b.read_exact(&mut buf);
    assert_eq!(buf, [1, 2, 3, 4]);
}

#[test]
fn test_pending_tracks_unread_bytes() {
    let (mut a, mut b) = LoopbackLine::pair();
    assert_eq!(a.pending(), 0);
    b.write_buffer(&[1, 2, 3]);
    assert_eq!(a.pending(), 3);

    assert_eq!(a.poll_byte(), Some(1));
    assert_eq!(a.pending(), 2);
}
