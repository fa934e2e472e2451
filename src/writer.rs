//! The writing half of a raster stream.
//!
//! The encoder in this codec never compresses and never byte-swaps its own
//! output — it always emits the native V1 sync word and writes pixel
//! bytes verbatim.

use std::io::Write;

use crate::error::RasterError;
use crate::header::{self, PageHeaderV1, PageHeaderV2};
use crate::io::write_exact;
use crate::sync::SyncWord;

/// A raster stream open for writing. Writes the sync word on
/// construction, then accepts a sequence of page headers and pixel
/// bodies.
pub struct RasterWriter<W> {
    inner: W,
    header: PageHeaderV2,
    bpp: u32,
    remaining: u64,
}

impl<W: Write> RasterWriter<W> {
    /// Open a writer: emit the native, uncompressed sync word.
    pub fn new(mut inner: W) -> Result<Self, RasterError> {
        let sync = SyncWord::writer_default();
        write_exact(&mut inner, &sync.to_bytes())?;
        Ok(Self {
            inner,
            header: PageHeaderV2::default(),
            bpp: 0,
            remaining: 0,
        })
    }

    /// Rows not yet written on the current page.
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Give the underlying channel back to the caller.
    pub fn into_inner(self) -> W {
        self.inner
    }

    fn derive_and_store(&mut self, h: PageHeaderV2, is_v1: bool) -> PageHeaderV2 {
        let mut h = h;
        h.num_colors = header::derive_num_colors(
            h.v1.color_space,
            h.v1.bits_per_pixel,
            is_v1,
            h.num_colors,
        );
        self.bpp = header::derive_bpp(h.v1.color_order, h.v1.bits_per_pixel, h.v1.bits_per_color);
        self.remaining = header::derive_remaining(h.v1.color_order, h.v1.height, h.num_colors);
        self.header = h.clone();
        h
    }

    /// Write a V1 header: copied into the V2 slot, zeroing the V2
    /// extension first so it reads back as zero.
    pub fn write_header_v1(&mut self, v1: PageHeaderV1) -> Result<(), RasterError> {
        let h = self.derive_and_store(
            PageHeaderV2 {
                v1,
                ..PageHeaderV2::default()
            },
            true,
        );
        let bytes = header::encode(&h);
        let n = write_exact(&mut self.inner, &bytes)?;
        if n < bytes.len() {
            return Err(RasterError::Io(std::io::Error::from(
                std::io::ErrorKind::WriteZero,
            )));
        }
        Ok(())
    }

    /// Write a V2 header verbatim.
    pub fn write_header_v2(&mut self, h: PageHeaderV2) -> Result<(), RasterError> {
        let h = self.derive_and_store(h, false);
        let bytes = header::encode(&h);
        let n = write_exact(&mut self.inner, &bytes)?;
        if n < bytes.len() {
            return Err(RasterError::Io(std::io::Error::from(
                std::io::ErrorKind::WriteZero,
            )));
        }
        Ok(())
    }

    /// Write `buf.len()` pixel bytes verbatim. The encoder never
    /// compresses. Like the reader's `read_pixels`, progress is tracked by
    /// integer-dividing the request length by `cupsBytesPerLine`, so a
    /// sub-row write silently under-counts consumed rows.
    pub fn write_pixels(&mut self, buf: &[u8]) -> Result<usize, RasterError> {
        if self.remaining == 0 {
            return Err(RasterError::Exhausted);
        }
        let bytes_per_line = self.header.v1.bytes_per_line as u64;
        if bytes_per_line > 0 {
            self.remaining = self
                .remaining
                .saturating_sub(buf.len() as u64 / bytes_per_line);
        }
        let n = write_exact(&mut self.inner, buf)?;
        if n < buf.len() {
            return Err(RasterError::Io(std::io::Error::from(
                std::io::ErrorKind::WriteZero,
            )));
        }
        Ok(n)
    }
}
