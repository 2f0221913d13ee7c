//! Software loopback for hardware-free testing
//!
//! A [`LoopbackLine::pair`] behaves like two serial ports wired together:
//! whatever one end writes, the other end reads, in order. Both ends
//! implement [`SerialLine`], so the blocking and polling operations run
//! through exactly the same loops as on a real device.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};

use crate::port::SerialLine;

/// One end of an in-memory serial line.
#[derive(Clone)]
pub struct LoopbackLine {
    rx: Arc<Mutex<VecDeque<u8>>>,
    tx: Arc<Mutex<VecDeque<u8>>>,
}

impl LoopbackLine {
    /// Create two cross-wired ends.
    pub fn pair() -> (LoopbackLine, LoopbackLine) {
        let a_to_b = Arc::new(Mutex::new(VecDeque::new()));
        let b_to_a = Arc::new(Mutex::new(VecDeque::new()));
        let a = LoopbackLine {
            rx: Arc::clone(&b_to_a),
            tx: Arc::clone(&a_to_b),
        };
        let b = LoopbackLine {
            rx: a_to_b,
            tx: b_to_a,
        };
        (a, b)
    }

    /// Bytes queued toward this end but not yet read.
    pub fn pending(&self) -> usize {
        self.rx.lock().unwrap().len()
    }
}

impl SerialLine for LoopbackLine {
    fn try_read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut rx = self.rx.lock().unwrap();
        let available = rx.len().min(buf.len());
        for item in buf.iter_mut().take(available) {
            *item = rx.pop_front().unwrap();
        }
        Ok(available)
    }

    fn try_write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.tx.lock().unwrap().extend(data);
        Ok(data.len())
    }
}
