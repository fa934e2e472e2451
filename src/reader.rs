//! The reading half of a raster stream.

use std::io::Read;

use crate::endian::swap_pairs;
use crate::error::RasterError;
use crate::header::{self, PageHeaderV1, PageHeaderV2};
use crate::io::read_exact;
use crate::packbits::RowDecoder;
use crate::stage::StagingBuffer;
use crate::sync::{SyncWord, Version};

/// Whether a pixel element needs a pairwise byte swap on a byte-swapped
/// stream: true for 12- and 16-bit elements only.
fn is_wide_element(bits_per_color: u32, bits_per_pixel: u32) -> bool {
    bits_per_color == 16 || bits_per_pixel == 12 || bits_per_pixel == 16
}

enum Body {
    Uncompressed,
    Compressed {
        staging: StagingBuffer,
        rows: RowDecoder,
    },
}

/// A raster stream open for reading. Performs the sync handshake on
/// construction, then reads a sequence of page headers and pixel bodies.
pub struct RasterReader<R> {
    inner: R,
    sync: SyncWord,
    header: PageHeaderV2,
    bpp: u32,
    remaining: u64,
    body: Body,
}

impl<R: Read> RasterReader<R> {
    /// Open a reader: read the 4-byte sync word and validate it against
    /// the six legal values. Fails with [`RasterError::BadSync`]
    /// if the stream is desynchronized or [`RasterError::ShortRead`] if it
    /// ends before the sync word arrives.
    pub fn new(mut inner: R) -> Result<Self, RasterError> {
        let mut buf = [0u8; 4];
        let n = read_exact(&mut inner, &mut buf)?;
        if n < 4 {
            return Err(RasterError::ShortRead {
                expected: 4,
                got: n,
            });
        }
        let sync = SyncWord::decode(buf)?;
        let body = if sync.compressed() {
            Body::Compressed {
                staging: StagingBuffer::new(),
                rows: RowDecoder::new(1, 1),
            }
        } else {
            Body::Uncompressed
        };
        Ok(Self {
            inner,
            sync,
            header: PageHeaderV2::default(),
            bpp: 0,
            remaining: 0,
            body,
        })
    }

    /// Whether pixel data on this stream is packbits compressed.
    pub fn compressed(&self) -> bool {
        self.sync.compressed()
    }

    /// Whether header fields and wide pixel elements need a byte swap.
    pub fn swapped(&self) -> bool {
        self.sync.swapped()
    }

    /// Rows not yet produced on the current page.
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// The full header as last derived: `num_colors` is
    /// populated even after a `read_header_v1` call, since the V2-shaped
    /// slot backs both revisions.
    pub fn header(&self) -> &PageHeaderV2 {
        &self.header
    }

    /// Bytes per pixel element or color plane, as derived from the
    /// current page header.
    pub fn bpp(&self) -> u32 {
        self.bpp
    }

    /// Give the underlying channel back to the caller.
    pub fn into_inner(self) -> R {
        self.inner
    }

    fn read_header_bytes(&mut self, size: usize) -> Result<Vec<u8>, RasterError> {
        let mut full = vec![0u8; header::V2_SIZE];
        let n = match &mut self.body {
            Body::Uncompressed => read_exact(&mut self.inner, &mut full[..size])?,
            Body::Compressed { staging, .. } => {
                staging.read_into(&mut self.inner, &mut full[..size], 1)?;
                size
            }
        };
        if n < size {
            return Err(RasterError::ShortRead {
                expected: size,
                got: n,
            });
        }
        if self.sync.swapped() {
            header::swap_scalar_region(&mut full[..size]);
        }
        Ok(full)
    }

    fn finish_header(&mut self, h: PageHeaderV2, is_v1: bool) -> PageHeaderV2 {
        let mut h = h;
        h.num_colors = header::derive_num_colors(
            h.v1.color_space,
            h.v1.bits_per_pixel,
            is_v1,
            h.num_colors,
        );
        self.bpp = header::derive_bpp(h.v1.color_order, h.v1.bits_per_pixel, h.v1.bits_per_color);
        self.remaining = header::derive_remaining(h.v1.color_order, h.v1.height, h.num_colors);
        if let Body::Compressed { rows, .. } = &mut self.body {
            rows.reset(h.v1.bytes_per_line as usize, self.bpp as usize);
        }
        self.header = h.clone();
        h
    }

    /// Read a V1-sized page header.
    pub fn read_header_v1(&mut self) -> Result<PageHeaderV1, RasterError> {
        let buf = self.read_header_bytes(header::V1_SIZE)?;
        let decoded = header::decode(&buf[..header::V1_SIZE]);
        Ok(self.finish_header(decoded, true).v1)
    }

    /// Read a V2-sized page header.
    pub fn read_header_v2(&mut self) -> Result<PageHeaderV2, RasterError> {
        let buf = self.read_header_bytes(header::V2_SIZE)?;
        let decoded = header::decode(&buf);
        Ok(self.finish_header(decoded, false))
    }

    /// Read the header matching this stream's sync word (V1-sized for the
    /// original and V1 revisions, V2-sized otherwise).
    pub fn read_header(&mut self) -> Result<PageHeaderV2, RasterError> {
        match self.sync.version() {
            Version::V1 => {
                let v1 = self.read_header_v1()?;
                Ok(PageHeaderV2 {
                    v1,
                    ..self.header.clone()
                })
            }
            Version::V2 => self.read_header_v2(),
        }
    }

    /// Read up to `buf.len()` pixel bytes. Fails with [`RasterError::Exhausted`] if no rows
    /// remain. `buf.len()` should be a multiple of `cupsBytesPerLine` for
    /// uncompressed streams: a request that doesn't land on a row boundary
    /// under-counts consumed rows (see the comment in the uncompressed
    /// branch below).
    pub fn read_pixels(&mut self, buf: &mut [u8]) -> Result<usize, RasterError> {
        if self.remaining == 0 {
            return Err(RasterError::Exhausted);
        }
        let wide = is_wide_element(self.header.v1.bits_per_color, self.header.v1.bits_per_pixel);
        let bytes_per_line = self.header.v1.bytes_per_line as u64;

        match &mut self.body {
            Body::Uncompressed => {
                // Progress is tracked by integer-dividing the request
                // length by the row length, so a sub-row read silently
                // fails to decrement `remaining`. Callers are expected to
                // read in row-aligned chunks.
                if bytes_per_line > 0 {
                    self.remaining = self
                        .remaining
                        .saturating_sub(buf.len() as u64 / bytes_per_line);
                }
                let n = read_exact(&mut self.inner, buf)?;
                if n < buf.len() {
                    return Err(RasterError::ShortRead {
                        expected: buf.len(),
                        got: n,
                    });
                }
                if self.sync.swapped() && wide {
                    swap_pairs(buf);
                }
                Ok(n)
            }
            Body::Compressed { staging, rows } => {
                rows.read_pixels(&mut self.inner, staging, buf, &mut self.remaining, wide && self.sync.swapped())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn uncompressed_stream(header_bytes: &[u8], pixels: &[u8]) -> Vec<u8> {
        let mut data = b"RaSt".to_vec();
        data.extend_from_slice(header_bytes);
        data.extend_from_slice(pixels);
        data
    }

    #[test]
    fn native_v0_sync_opens_uncompressed_unswapped() {
        let mut h = vec![0u8; header::V1_SIZE];
        h[372..376].copy_from_slice(&8u32.to_ne_bytes()); // width
        let data = uncompressed_stream(&h, &[]);
        let reader = RasterReader::new(Cursor::new(data)).unwrap();
        assert!(!reader.compressed());
        assert!(!reader.swapped());
    }

    #[test]
    fn v2_reversed_sync_is_compressed_and_swapped() {
        let mut data = b"2SaR".to_vec();
        let mut h = vec![0u8; header::V2_SIZE];
        // cupsWidth raw bytes 00 00 00 08, reversed stream.
        h[372..376].copy_from_slice(&[0x00, 0x00, 0x00, 0x08]);
        data.extend_from_slice(&h);
        let mut reader = RasterReader::new(Cursor::new(data)).unwrap();
        assert!(reader.compressed());
        assert!(reader.swapped());
        let header = reader.read_header_v2().unwrap();
        assert_eq!(header.v1.width, 8);
    }

    #[test]
    fn uncompressed_round_trip_header_and_pixels() {
        let mut h = vec![0u8; header::V1_SIZE];
        h[372..376].copy_from_slice(&4u32.to_ne_bytes()); // width
        h[376..380].copy_from_slice(&1u32.to_ne_bytes()); // height
        h[384..388].copy_from_slice(&8u32.to_ne_bytes()); // bits_per_color
        h[388..392].copy_from_slice(&8u32.to_ne_bytes()); // bits_per_pixel
        h[392..396].copy_from_slice(&4u32.to_ne_bytes()); // bytes_per_line
        let pixels = [1u8, 2, 3, 4];
        let data = uncompressed_stream(&h, &pixels);
        let mut reader = RasterReader::new(Cursor::new(data)).unwrap();
        reader.read_header_v1().unwrap();
        let mut out = [0u8; 4];
        assert_eq!(reader.read_pixels(&mut out).unwrap(), 4);
        assert_eq!(out, pixels);
    }

    #[test]
    fn exhausted_after_all_rows_consumed() {
        let mut h = vec![0u8; header::V1_SIZE];
        h[376..380].copy_from_slice(&1u32.to_ne_bytes()); // height=1
        h[392..396].copy_from_slice(&2u32.to_ne_bytes()); // bytes_per_line=2
        let pixels = [9u8, 9];
        let data = uncompressed_stream(&h, &pixels);
        let mut reader = RasterReader::new(Cursor::new(data)).unwrap();
        reader.read_header_v1().unwrap();
        let mut out = [0u8; 2];
        reader.read_pixels(&mut out).unwrap();
        assert!(matches!(
            reader.read_pixels(&mut out),
            Err(RasterError::Exhausted)
        ));
    }
}
