//! Error types for the raster codec.

use std::io;

/// Everything that can go wrong while reading or writing a raster stream.
#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    /// The stream's opening 4 bytes did not match any of the six recognized
    /// sync words.
    #[error("stream does not begin with a recognized raster sync word")]
    BadSync,
    /// The underlying channel ended before the expected number of bytes
    /// arrived.
    #[error("short read: expected {expected} bytes, got {got}")]
    ShortRead {
        /// Bytes the caller asked for.
        expected: usize,
        /// Bytes actually delivered before end of stream.
        got: usize,
    },
    /// The underlying channel reported a non-retryable I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// `read_pixels`/`write_pixels` called with no rows left on the current
    /// page.
    #[error("no rows remaining on the current page")]
    Exhausted,
    /// Scratch or staging buffer growth failed to allocate.
    #[error("failed to allocate decode buffer")]
    OutOfMemory,
}
