//! SetuSerial - Minimal cross-platform serial port (UART) abstraction
//!
//! This library provides a uniform open/read/write/close contract over a
//! physical or virtual serial line, hiding the differences between the
//! POSIX termios configuration model and the Windows COM-port model.
//! Exactly one backend is compiled per target; callers never see the
//! distinction.
//!
//! Every port is opened for raw transfer at a fixed line setting: 8 data
//! bits, no parity, 1 stop bit, no flow control, modem control lines
//! ignored. Blocking reads are explicit busy-polling loops over the
//! platform's non-blocking read primitive, so they behave identically on
//! both backends (and occupy the calling thread while waiting).
//!
//! ## Example
//!
//! ```no_run
//! use setu_serial::{SerialLine, SerialPort};
//!
//! # fn main() -> setu_serial::Result<()> {
//! let mut port = SerialPort::open("/dev/ttyUSB0", 115200)?;
//! port.write_buffer(b"AT\r\n");
//! let byte = port.read_byte(); // busy-polls until a byte arrives
//! port.close();
//! # Ok(())
//! # }
//! ```

pub mod baud;
pub mod error;
pub mod loopback;
pub mod port;

// Re-export commonly used types
pub use baud::BaudRate;
pub use error::{Error, Result};
pub use port::{SerialLine, SerialPort};
