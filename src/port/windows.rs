//! Windows backend: COM device handle with timeout-emulated non-blocking reads
//!
//! The named COM device is opened exclusive through the raw `\\.\`
//! namespace and configured via a device control block. Reads are made
//! non-blocking by `ReadIntervalTimeout = MAXDWORD`, which tells the
//! driver to complete every `ReadFile` immediately with whatever is
//! buffered — the handle-based equivalent of an `O_NONBLOCK` descriptor.

use std::io;

use windows_sys::Win32::Devices::Communication::{
    SetCommState, SetCommTimeouts, COMMTIMEOUTS, DCB, NOPARITY, ONESTOPBIT,
};
use windows_sys::Win32::Foundation::{
    CloseHandle, GENERIC_READ, GENERIC_WRITE, HANDLE, INVALID_HANDLE_VALUE,
};
use windows_sys::Win32::Storage::FileSystem::{
    CreateFileW, ReadFile, WriteFile, FILE_ATTRIBUTE_NORMAL, OPEN_EXISTING,
};

use crate::baud::BaudRate;
use crate::error::{Error, Result};

use super::SerialLine;

/// Map a validated rate to the DCB baud value (numeric pass-through; the
/// COM driver takes the rate itself rather than an index constant).
fn speed_code(baud: BaudRate) -> u32 {
    baud.as_u32()
}

/// An open COM device handle.
///
/// Owns the handle; `Drop` closes it.
#[derive(Debug)]
pub(super) struct ComLine {
    handle: HANDLE,
}

// The handle is exclusively owned by this value and COM handles carry no
// thread affinity
unsafe impl Send for ComLine {}

impl ComLine {
    /// Open `device` exclusive and apply the raw 8N1 policy at `baud`.
    pub(super) fn open(device: &str, baud: BaudRate) -> Result<Self> {
        // Raw device namespace; also required for COM10 and above
        let full_name: Vec<u16> = format!(r"\\.\{}", device)
            .encode_utf16()
            .chain(std::iter::once(0))
            .collect();

        let handle = unsafe {
            CreateFileW(
                full_name.as_ptr(),
                GENERIC_READ | GENERIC_WRITE,
                0, // no sharing
                std::ptr::null(),
                OPEN_EXISTING,
                FILE_ATTRIBUTE_NORMAL,
                std::ptr::null_mut(),
            )
        };
        if handle == INVALID_HANDLE_VALUE {
            return Err(Error::Open {
                device: device.to_string(),
                source: io::Error::last_os_error(),
            });
        }

        // From here the handle is owned; any failure below closes it on
        // drop before the error propagates
        let line = ComLine { handle };
        line.configure_raw(speed_code(baud))
            .map_err(|source| Error::Configure {
                device: device.to_string(),
                source,
            })?;

        log::debug!("COM device {} configured", device);
        Ok(line)
    }

    /// Overwrite the device control block and timeouts with the fixed
    /// raw 8N1 policy.
    fn configure_raw(&self, baud: u32) -> io::Result<()> {
        let mut dcb: DCB = unsafe { std::mem::zeroed() };
        dcb.DCBlength = std::mem::size_of::<DCB>() as u32;
        // Zeroed flag bits already disable parity checking, CTS/DSR and
        // XON/XOFF flow control, and hold DTR/RTS disabled; only fBinary
        // (bit 0) must be set
        dcb._bitfield = 0x0000_0001;
        dcb.BaudRate = baud;
        dcb.ByteSize = 8;
        dcb.Parity = NOPARITY;
        dcb.StopBits = ONESTOPBIT;
        if unsafe { SetCommState(self.handle, &dcb) } == 0 {
            return Err(io::Error::last_os_error());
        }

        // MAXDWORD interval, zero totals: ReadFile returns immediately
        let timeouts = COMMTIMEOUTS {
            ReadIntervalTimeout: u32::MAX,
            ReadTotalTimeoutMultiplier: 0,
            ReadTotalTimeoutConstant: 0,
            WriteTotalTimeoutMultiplier: 0,
            WriteTotalTimeoutConstant: 0,
        };
        if unsafe { SetCommTimeouts(self.handle, &timeouts) } == 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }
}

impl SerialLine for ComLine {
    fn try_read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let mut read: u32 = 0;
        let ok = unsafe {
            ReadFile(
                self.handle,
                buf.as_mut_ptr().cast(),
                buf.len().min(u32::MAX as usize) as u32,
                &mut read,
                std::ptr::null_mut(),
            )
        };
        if ok == 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(read as usize)
    }

    fn try_write(&mut self, data: &[u8]) -> io::Result<usize> {
        let mut written: u32 = 0;
        let ok = unsafe {
            WriteFile(
                self.handle,
                data.as_ptr().cast(),
                data.len().min(u32::MAX as usize) as u32,
                &mut written,
                std::ptr::null_mut(),
            )
        };
        if ok == 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(written as usize)
    }
}

impl Drop for ComLine {
    fn drop(&mut self) {
        // Releases the handle; device parameters stay as configured
        unsafe { CloseHandle(self.handle) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speed_code_is_numeric_rate() {
        assert_eq!(speed_code(BaudRate::B50), 50);
        assert_eq!(speed_code(BaudRate::B9600), 9600);
        assert_eq!(speed_code(BaudRate::B115200), 115200);
    }

    #[test]
    fn test_invalid_baud_rejected_before_device_access() {
        let err = crate::SerialPort::open("COM1", 12345).unwrap_err();
        match err {
            Error::UnsupportedBaudRate(rate) => assert_eq!(rate, 12345),
            other => panic!("expected UnsupportedBaudRate, got {:?}", other),
        }
    }
}
