//! A streaming codec for the CUPS/PWG raster page-interchange format.
//!
//! A producer (a rasterizer or filter) writes a sequence of pages through
//! [`RasterWriter`]; a consumer (a printer driver or further filter) reads
//! them back through [`RasterReader`]. Each page is a fixed-layout header
//! followed by pixel data, stored either uncompressed or in a modified
//! packbits run-length encoding (V2 streams only). See the module docs for
//! the framing, header layout, and decoder details.
//!
//! This crate does not open file descriptors, sockets, or pipes itself —
//! callers supply an already-open [`std::io::Read`] or [`std::io::Write`].
//! It does not render pixels or interpret color semantics beyond what is
//! needed to derive `cupsNumColors`/`bpp`/`remaining` from the header.

mod endian;
mod error;
mod header;
mod io;
mod packbits;
mod reader;
mod stage;
mod sync;
mod writer;

pub use error::RasterError;
pub use header::{color_order, BoundingBox, PageHeaderV1, PageHeaderV2, Size2D};
pub use reader::RasterReader;
pub use sync::{SyncWord, Version};
pub use writer::RasterWriter;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// End-to-end round trip: write a header and raw pixels with the
    /// writer, decode with the reader, and check that both the derived
    /// header fields and pixel bytes match.
    #[test]
    fn uncompressed_round_trip_header_and_pixels() {
        let v1 = PageHeaderV1 {
            width: 4,
            height: 2,
            bits_per_color: 8,
            bits_per_pixel: 24,
            bytes_per_line: 12,
            color_order: color_order::CHUNKED,
            color_space: 19, // RGB
            ..PageHeaderV1::default()
        };
        let pixels: Vec<u8> = (0u8..24).collect();

        let mut writer = RasterWriter::new(Vec::new()).unwrap();
        writer.write_header_v1(v1.clone()).unwrap();
        writer.write_pixels(&pixels).unwrap();
        let stream = writer.into_inner();

        let mut reader = RasterReader::new(Cursor::new(stream)).unwrap();
        assert!(!reader.compressed());
        assert!(!reader.swapped());
        let header = reader.read_header_v1().unwrap();
        assert_eq!(header.width, v1.width);
        assert_eq!(header.height, v1.height);
        assert_eq!(reader.header().num_colors, 3);
        assert_eq!(reader.bpp(), 3);

        let mut out = vec![0u8; pixels.len()];
        assert_eq!(reader.read_pixels(&mut out).unwrap(), pixels.len());
        assert_eq!(out, pixels);
    }

    /// A compressed page decoded in one large call, in row-sized calls,
    /// and in one-byte calls all produce the same bytes.
    #[test]
    fn compressed_decode_is_slice_invariant() {
        // bytes_per_line=4, bpp=1: row 1 repeated twice via R=1, then a
        // second row via a literal run.
        let row_tokens = [0x01u8, 0x03, 0xAA, 0x00, 0xFC, 1, 2, 3, 4];
        let mut stream = b"RaS2".to_vec();
        let mut h = vec![0u8; header::V2_SIZE];
        h[372..376].copy_from_slice(&4u32.to_ne_bytes()); // width
        h[376..380].copy_from_slice(&3u32.to_ne_bytes()); // height (3 rows total)
        h[384..388].copy_from_slice(&8u32.to_ne_bytes()); // bits_per_color
        h[388..392].copy_from_slice(&8u32.to_ne_bytes()); // bits_per_pixel
        h[392..396].copy_from_slice(&4u32.to_ne_bytes()); // bytes_per_line
        stream.extend_from_slice(&h);
        stream.extend_from_slice(&row_tokens);

        let decode_with_chunk = |chunk: usize| -> Vec<u8> {
            let mut reader = RasterReader::new(Cursor::new(stream.clone())).unwrap();
            reader.read_header_v2().unwrap();
            let mut out = Vec::new();
            let mut buf = vec![0u8; chunk.max(1)];
            const TOTAL: usize = 12;
            while out.len() < TOTAL {
                let want = chunk.min(TOTAL - out.len());
                let n = reader.read_pixels(&mut buf[..want]).unwrap();
                out.extend_from_slice(&buf[..n.min(want)]);
            }
            out
        };

        let bulk = decode_with_chunk(4096);
        let by_row = decode_with_chunk(4);
        let by_byte = decode_with_chunk(1);
        assert_eq!(bulk, by_row);
        assert_eq!(bulk, by_byte);
        assert_eq!(
            bulk,
            vec![0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 1, 2, 3, 4]
        );
    }
}
