//! EINTR-resilient, short-read/short-write-aware byte transfer.
//!
//! `std::io::Read::read_exact`/`Write::write_all` already retry on
//! `ErrorKind::Interrupted` internally, so that half of EINTR handling
//! comes for free from any `R: Read` / `W: Write` implementation. What
//! they do not give us is the short-read contract this codec needs: a
//! read that hits end-of-stream partway through should hand back the
//! partial count, not an `UnexpectedEof` error. These two helpers provide
//! that.

use std::io::{Read, Write};

/// Read up to `buf.len()` bytes, looping until the buffer is full or the
/// channel is exhausted. Returns the number of bytes actually read, which
/// is `buf.len()` on a full read and strictly less on end-of-stream.
pub fn read_exact(reader: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        match reader.read(&mut buf[total..]) {
            Ok(0) => break,
            Ok(n) => total += n,
            Err(ref e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(total)
}

/// Write all of `buf`, looping until every byte is accepted. Returns the
/// number of bytes actually written, which is `buf.len()` on success.
pub fn write_exact(writer: &mut impl Write, buf: &[u8]) -> std::io::Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        match writer.write(&buf[total..]) {
            Ok(0) => break,
            Ok(n) => total += n,
            Err(ref e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(total)
}
