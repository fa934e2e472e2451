//! Compressed-input staging buffer.
//!
//! Represented as an owned `Vec<u8>` with `usize` read/write cursors
//! rather than raw pointers: growth preserves the logical offsets of the
//! in-flight region instead of relying on pointer arithmetic surviving a
//! reallocation (which it does automatically here, since the cursors are
//! indices, not addresses).

use std::io::Read;

use crate::error::RasterError;
use crate::io::read_exact;

/// Below this request size, refilling the staging buffer in bulk is
/// cheaper than issuing many tiny direct reads.
const REFILL_THRESHOLD: usize = 16;

/// Below this copy size, an unrolled byte-by-byte copy outperforms the
/// bulk `copy_from_slice`.
const UNROLLED_COPY_THRESHOLD: usize = 128;

/// A growable double-line staging buffer that sits between the raw
/// channel and the packbits decoder.
pub struct StagingBuffer {
    buffer: Vec<u8>,
    /// Offset of the first unconsumed byte.
    bufptr: usize,
    /// Offset one past the last valid byte.
    bufend: usize,
}

impl StagingBuffer {
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            bufptr: 0,
            bufend: 0,
        }
    }

    /// Number of unconsumed bytes currently staged.
    pub fn available(&self) -> usize {
        self.bufend - self.bufptr
    }

    /// Ensure the backing storage is at least `min_capacity` bytes,
    /// preserving `bufptr`/`bufend` (they are indices, so they remain
    /// valid across the `Vec` reallocation without adjustment).
    fn ensure_capacity(&mut self, min_capacity: usize) -> Result<(), RasterError> {
        if self.buffer.len() < min_capacity {
            let additional = min_capacity - self.buffer.len();
            self.buffer
                .try_reserve(additional)
                .map_err(|_| RasterError::OutOfMemory)?;
            self.buffer.resize(min_capacity, 0);
        }
        Ok(())
    }

    /// Refill the staging buffer from `reader`, compacting any
    /// unconsumed bytes to the front first.
    fn refill(&mut self, reader: &mut impl Read) -> Result<(), RasterError> {
        let remaining = self.available();
        if remaining > 0 && self.bufptr > 0 {
            self.buffer.copy_within(self.bufptr..self.bufend, 0);
        }
        self.bufptr = 0;
        self.bufend = remaining;
        let capacity = self.buffer.len();
        let n = read_exact(reader, &mut self.buffer[self.bufend..capacity])?;
        self.bufend += n;
        Ok(())
    }

    fn copy_out(&mut self, dest: &mut [u8]) {
        let n = dest.len();
        let src = &self.buffer[self.bufptr..self.bufptr + n];
        if n < UNROLLED_COPY_THRESHOLD {
            for i in 0..n {
                dest[i] = src[i];
            }
        } else {
            dest.copy_from_slice(src);
        }
        self.bufptr += n;
    }

    /// Deliver exactly `dest.len()` bytes from the compressed channel,
    /// staging through this buffer.
    ///
    /// `bytes_per_line` sizes the minimum staging capacity (2 lines).
    pub fn read_into(
        &mut self,
        reader: &mut impl Read,
        dest: &mut [u8],
        bytes_per_line: usize,
    ) -> Result<usize, RasterError> {
        self.ensure_capacity(2 * bytes_per_line.max(1))?;

        let mut delivered = 0;
        while delivered < dest.len() {
            let remaining_request = dest.len() - delivered;
            if self.available() == 0 && remaining_request < REFILL_THRESHOLD {
                self.refill(reader)?;
                if self.available() == 0 {
                    return Err(RasterError::ShortRead {
                        expected: dest.len(),
                        got: delivered,
                    });
                }
            }

            if self.available() == 0 {
                // Large request with an empty buffer: read straight into
                // the caller's destination, bypassing staging entirely.
                let n = read_exact(reader, &mut dest[delivered..])?;
                delivered += n;
                if n < remaining_request {
                    return Err(RasterError::ShortRead {
                        expected: dest.len(),
                        got: delivered,
                    });
                }
                continue;
            }

            let take = remaining_request.min(self.available());
            self.copy_out(&mut dest[delivered..delivered + take]);
            delivered += take;
        }
        Ok(delivered)
    }

    /// Read a single byte, staging through the buffer the same way as
    /// [`Self::read_into`] (used by the packbits decoder for row/inner
    /// tokens, which are always exactly one byte).
    pub fn read_byte(
        &mut self,
        reader: &mut impl Read,
        bytes_per_line: usize,
    ) -> Result<u8, RasterError> {
        let mut byte = [0u8; 1];
        self.read_into(reader, &mut byte, bytes_per_line)?;
        Ok(byte[0])
    }
}

impl Default for StagingBuffer {
    fn default() -> Self {
        Self::new()
    }
}
