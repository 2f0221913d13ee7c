//! Error types for SetuSerial

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// SetuSerial error types
///
/// Open is the only checked failure point of the contract: blocking reads
/// retry transparently and fire-and-forget writes do not report. The
/// platform error code behind an `Open`/`Configure` failure is available
/// through [`std::io::Error::raw_os_error`] on the source.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Baud rate outside the supported set, rejected before any OS
    /// resource is acquired
    #[error("Unsupported baud rate: {0}")]
    UnsupportedBaudRate(u32),

    /// Device could not be opened (missing, busy, or no permission)
    #[error("Failed to open {device}: {source}")]
    Open {
        /// Device name as passed to open
        device: String,
        /// Underlying OS error
        source: std::io::Error,
    },

    /// Device opened but applying the line configuration failed; the
    /// partially acquired descriptor or handle has been released
    #[error("Failed to configure {device}: {source}")]
    Configure {
        /// Device name as passed to open
        device: String,
        /// Underlying OS error
        source: std::io::Error,
    },
}
