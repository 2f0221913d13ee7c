//! Supported baud rates
//!
//! The line accepts only the standard rate set enumerated here. Validation
//! runs before any OS resource is acquired; each backend then maps an
//! accepted rate to its own platform speed code.

use std::fmt;

use crate::error::{Error, Result};

/// A standard serial baud rate.
///
/// The set is fixed; [`BaudRate::from_u32`] rejects every other value
/// with [`Error::UnsupportedBaudRate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaudRate {
    /// Hang-up rate (drops modem control lines on real hardware)
    B0,
    B50,
    B75,
    B110,
    B134,
    B150,
    B200,
    B300,
    B600,
    B1200,
    B1800,
    B2400,
    B4800,
    B9600,
    B19200,
    B38400,
    B57600,
    B115200,
    B230400,
}

impl BaudRate {
    /// Every supported rate, ascending.
    pub const ALL: [BaudRate; 19] = [
        BaudRate::B0,
        BaudRate::B50,
        BaudRate::B75,
        BaudRate::B110,
        BaudRate::B134,
        BaudRate::B150,
        BaudRate::B200,
        BaudRate::B300,
        BaudRate::B600,
        BaudRate::B1200,
        BaudRate::B1800,
        BaudRate::B2400,
        BaudRate::B4800,
        BaudRate::B9600,
        BaudRate::B19200,
        BaudRate::B38400,
        BaudRate::B57600,
        BaudRate::B115200,
        BaudRate::B230400,
    ];

    /// Validate a numeric rate against the supported set.
    pub fn from_u32(rate: u32) -> Result<Self> {
        match rate {
            0 => Ok(BaudRate::B0),
            50 => Ok(BaudRate::B50),
            75 => Ok(BaudRate::B75),
            110 => Ok(BaudRate::B110),
            134 => Ok(BaudRate::B134),
            150 => Ok(BaudRate::B150),
            200 => Ok(BaudRate::B200),
            300 => Ok(BaudRate::B300),
            600 => Ok(BaudRate::B600),
            1200 => Ok(BaudRate::B1200),
            1800 => Ok(BaudRate::B1800),
            2400 => Ok(BaudRate::B2400),
            4800 => Ok(BaudRate::B4800),
            9600 => Ok(BaudRate::B9600),
            19200 => Ok(BaudRate::B19200),
            38400 => Ok(BaudRate::B38400),
            57600 => Ok(BaudRate::B57600),
            115200 => Ok(BaudRate::B115200),
            230400 => Ok(BaudRate::B230400),
            other => Err(Error::UnsupportedBaudRate(other)),
        }
    }

    /// The rate in symbols per second.
    pub fn as_u32(self) -> u32 {
        match self {
            BaudRate::B0 => 0,
            BaudRate::B50 => 50,
            BaudRate::B75 => 75,
            BaudRate::B110 => 110,
            BaudRate::B134 => 134,
            BaudRate::B150 => 150,
            BaudRate::B200 => 200,
            BaudRate::B300 => 300,
            BaudRate::B600 => 600,
            BaudRate::B1200 => 1200,
            BaudRate::B1800 => 1800,
            BaudRate::B2400 => 2400,
            BaudRate::B4800 => 4800,
            BaudRate::B9600 => 9600,
            BaudRate::B19200 => 19200,
            BaudRate::B38400 => 38400,
            BaudRate::B57600 => 57600,
            BaudRate::B115200 => 115200,
            BaudRate::B230400 => 230400,
        }
    }
}

impl fmt::Display for BaudRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u32())
    }
}
