//! The modified packbits row decoder.
//!
//! This is the hard part of the codec: an outer row-repeat token wraps an
//! inner literal/repeat token stream, and the decoder must resume exactly
//! at `(pcurrent, count)` across arbitrarily-sized caller reads — a half
//! row, then two rows, then a one-byte trailing read must all produce the
//! same bytes as one large read would.

use std::io::Read;

use crate::endian::swap_pairs;
use crate::error::RasterError;
use crate::stage::StagingBuffer;

/// Decoder state for one compressed page: the staged row plus the
/// row-repeat resumption point. `pcurrent`/`pend` and `count` together
/// are the only state that needs to survive between calls.
pub struct RowDecoder {
    bytes_per_line: usize,
    bpp: usize,
    row: Vec<u8>,
    /// Cursor into `row`: next byte to emit to a caller.
    pcurrent: usize,
    /// One past the last valid byte of the currently staged row —
    /// `row.len()` once a row has been decoded, `0` before the first one.
    pend: usize,
    /// Remaining row-repeat count for the currently staged row.
    count: u32,
}

impl RowDecoder {
    /// Set up (or reset, across pages) the scratch row for a page with
    /// the given geometry.
    pub fn reset(&mut self, bytes_per_line: usize, bpp: usize) {
        self.bytes_per_line = bytes_per_line;
        self.bpp = bpp.max(1);
        self.row.clear();
        self.row.resize(bytes_per_line, 0);
        self.pcurrent = 0;
        self.pend = 0;
        self.count = 0;
    }

    pub fn new(bytes_per_line: usize, bpp: usize) -> Self {
        let mut d = Self {
            bytes_per_line: 0,
            bpp: 1,
            row: Vec::new(),
            pcurrent: 0,
            pend: 0,
            count: 0,
        };
        d.reset(bytes_per_line, bpp);
        d
    }

    /// Decode one row body into `dest`, which must be exactly
    /// `bytes_per_line` bytes.
    fn decode_row_body(
        &self,
        reader: &mut impl Read,
        staging: &mut StagingBuffer,
        dest: &mut [u8],
    ) -> Result<(), RasterError> {
        let mut pos = 0;
        while pos < dest.len() {
            let token = staging.read_byte(reader, self.bytes_per_line)?;
            if token & 0x80 != 0 {
                // Literal run: (257 - token) elements, verbatim.
                let elements = 257usize - token as usize;
                let want = (elements * self.bpp).min(dest.len() - pos);
                staging.read_into(reader, &mut dest[pos..pos + want], self.bytes_per_line)?;
                pos += want;
            } else {
                // Repeat run: (token + 1) elements, all equal to one
                // element read from the stream.
                let elements = token as usize + 1;
                let want = (elements * self.bpp).min(dest.len() - pos);
                if want < self.bpp {
                    // Producer bug: not even room for one element. Stop
                    // decoding this row rather than reading a partial,
                    // meaningless element.
                    break;
                }
                let mut element = vec![0u8; self.bpp];
                staging.read_into(reader, &mut element, self.bytes_per_line)?;
                let mut written = 0;
                while written < want {
                    let chunk = self.bpp.min(want - written);
                    dest[pos + written..pos + written + chunk].copy_from_slice(&element[..chunk]);
                    written += chunk;
                }
                pos += want;
            }
        }
        Ok(())
    }

    /// Deliver exactly `requested = dest.len()` decoded pixel bytes,
    /// decrementing `*remaining` as rows are fully consumed.
    ///
    /// `wide_elements` selects whether a byte-swapped stream's rows get
    /// pairwise-swapped after decode.
    ///
    /// Returns `requested` even when `*remaining` reaches zero mid-call
    /// and fewer bytes were actually written. Callers that size their
    /// buffer to the returned count rather than checking `remaining()`
    /// first may see trailing stale bytes in that case.
    pub fn read_pixels(
        &mut self,
        reader: &mut impl Read,
        staging: &mut StagingBuffer,
        dest: &mut [u8],
        remaining: &mut u64,
        wide_elements: bool,
    ) -> Result<usize, RasterError> {
        let requested = dest.len();
        let mut delivered = 0;

        while delivered < dest.len() && *remaining > 0 {
            if self.pcurrent < self.pend {
                let take = (dest.len() - delivered).min(self.pend - self.pcurrent);
                dest[delivered..delivered + take]
                    .copy_from_slice(&self.row[self.pcurrent..self.pcurrent + take]);
                self.pcurrent += take;
                delivered += take;
                if self.pcurrent == self.pend {
                    self.count -= 1;
                    *remaining -= 1;
                }
                continue;
            }

            if self.count > 0 {
                // Re-emit the row already staged; no new row token.
                self.pcurrent = 0;
                continue;
            }

            // count == 0: read the next row-repeat token.
            let r = staging.read_byte(reader, self.bytes_per_line)?;
            self.count = r as u32 + 1;

            let remaining_request = dest.len() - delivered;
            if delivered == 0 && remaining_request == self.bytes_per_line && self.count == 1 {
                // Fast path: a lone row (R=0) requested in
                // one bytes_per_line-sized call can be decoded straight
                // into the caller's buffer.
                self.decode_row_body(reader, staging, &mut dest[delivered..delivered + self.bytes_per_line])?;
                if wide_elements {
                    swap_pairs(&mut dest[delivered..delivered + self.bytes_per_line]);
                }
                delivered += self.bytes_per_line;
                self.count -= 1;
                *remaining -= 1;
                self.pcurrent = 0;
                self.pend = 0;
                continue;
            }

            let bytes_per_line = self.bytes_per_line;
            let mut row = std::mem::take(&mut self.row);
            self.decode_row_body(reader, staging, &mut row[..bytes_per_line])?;
            if wide_elements {
                // Swap the full row, not just whatever the inner loop's
                // cursor happened to leave.
                swap_pairs(&mut row[..bytes_per_line]);
            }
            self.row = row;
            self.pcurrent = 0;
            self.pend = bytes_per_line;
        }

        Ok(requested)
    }
}
