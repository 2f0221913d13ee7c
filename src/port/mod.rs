//! Serial port contract and platform backends
//!
//! [`SerialLine`] is the single contract: a backend supplies one
//! non-blocking read and one write submission, and every blocking or
//! polling operation is a provided method built on that seam. The
//! byte-at-a-time-until-ready loop is therefore shared verbatim by both
//! platforms, which is what keeps the two native non-blocking models
//! (`O_NONBLOCK` descriptors vs. zero-timeout handle reads) behaviorally
//! identical to callers.

use std::io;

use crate::baud::BaudRate;
use crate::error::Result;

#[cfg(unix)]
mod posix;
#[cfg(unix)]
use posix::TtyLine as NativeLine;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
use windows::ComLine as NativeLine;

/// Byte-level contract of an open serial line.
///
/// Blocking reads are busy-polling loops by design: no native blocking
/// primitive is assumed portable across the two backends, so the loop
/// repeatedly issues non-blocking reads and occupies the calling thread
/// (and its CPU core) until data arrives. Callers needing timeouts must
/// layer their own deadline logic; no blocking call here returns early.
pub trait SerialLine {
    /// One non-blocking read attempt.
    ///
    /// Returns `Ok(0)` when no byte was ready at the instant of the call.
    fn try_read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Submit bytes to the OS write path once, returning how many were
    /// accepted.
    ///
    /// This is the checked counterpart of
    /// [`write_buffer`](SerialLine::write_buffer): no retry is performed
    /// on short writes, but the accepted count is observable.
    fn try_write(&mut self, data: &[u8]) -> io::Result<usize>;

    /// Read exactly one byte, blocking until it arrives.
    ///
    /// Busy-polls the non-blocking read. A read error counts as "nothing
    /// ready" and the loop continues; this call has no error channel and
    /// never returns without a byte.
    fn read_byte(&mut self) -> u8 {
        let mut byte = [0u8; 1];
        loop {
            if matches!(self.try_read(&mut byte), Ok(1)) {
                return byte[0];
            }
            std::hint::spin_loop();
        }
    }

    /// Fill `buf` completely, blocking until enough bytes have arrived.
    ///
    /// Short reads are accumulated in arrival order. There is no timeout:
    /// if the sender never supplies enough bytes this call polls forever.
    fn read_exact(&mut self, buf: &mut [u8]) {
        let mut filled = 0;
        while filled < buf.len() {
            if let Ok(n) = self.try_read(&mut buf[filled..]) {
                filled += n;
            }
            std::hint::spin_loop();
        }
    }

    /// One receive probe, never blocking.
    ///
    /// `Some(byte)` if a byte was pending, `None` if zero bytes were ready
    /// at the instant of the call. Continuous monitoring means calling
    /// this in a loop, with the same busy-polling trade-off as
    /// [`read_byte`](SerialLine::read_byte).
    fn poll_byte(&mut self) -> Option<u8> {
        let mut byte = [0u8; 1];
        match self.try_read(&mut byte) {
            Ok(1) => Some(byte[0]),
            _ => None,
        }
    }

    /// Send one byte, fire-and-forget.
    fn write_byte(&mut self, byte: u8) {
        self.write_buffer(&[byte]);
    }

    /// Send a buffer, fire-and-forget.
    ///
    /// The bytes are submitted to the OS write path exactly once; a short
    /// or failed write is not surfaced (it is logged at debug level).
    /// Use [`try_write`](SerialLine::try_write) when delivery must be
    /// observed.
    fn write_buffer(&mut self, data: &[u8]) {
        match self.try_write(data) {
            Ok(n) if n < data.len() => {
                log::debug!("short write ignored: {} of {} bytes accepted", n, data.len());
            }
            Err(e) => log::debug!("write error ignored: {}", e),
            Ok(_) => {}
        }
    }
}

/// An open serial port on the compiled-in platform backend.
///
/// Owning the value is owning the OS channel: exactly one `SerialPort`
/// exists per successful [`open`](SerialPort::open), and dropping it (or
/// calling [`close`](SerialPort::close)) releases the descriptor or
/// handle. The device keeps whatever configuration open applied; previous
/// parameters are not restored.
#[derive(Debug)]
pub struct SerialPort {
    line: NativeLine,
    device: String,
}

impl SerialPort {
    /// Open and configure `device` for raw 8N1 transfer at `baud_rate`.
    ///
    /// The rate must belong to the fixed [`BaudRate`] set and is rejected
    /// before any OS resource is acquired. The device is then opened
    /// exclusive and non-blocking and the fixed line policy applied:
    /// 8 data bits, no parity, 1 stop bit, raw mode, modem control lines
    /// and break conditions ignored. If configuration fails after the
    /// channel was acquired, the channel is released before returning.
    ///
    /// # Arguments
    /// * `device` - Platform device name (e.g. `/dev/ttyUSB0` or `COM3`)
    /// * `baud_rate` - One of the supported standard rates
    pub fn open(device: &str, baud_rate: u32) -> Result<Self> {
        let baud = BaudRate::from_u32(baud_rate)?;
        let line = NativeLine::open(device, baud)?;
        log::info!("Opened serial port {} at {} baud (8N1 raw)", device, baud);
        Ok(SerialPort {
            line,
            device: device.to_string(),
        })
    }

    /// Device name the port was opened with.
    pub fn device(&self) -> &str {
        &self.device
    }

    /// Release the port.
    ///
    /// Consuming the value makes double-close and use-after-close
    /// unrepresentable; dropping the port releases the OS channel the
    /// same way. The line configuration applied by open stays in effect
    /// on the device.
    pub fn close(self) {
        log::debug!("Closing serial port {}", self.device);
    }
}

impl SerialLine for SerialPort {
    fn try_read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.line.try_read(buf)
    }

    fn try_write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.line.try_write(data)
    }
}
